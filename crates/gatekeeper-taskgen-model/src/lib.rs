// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Task generator model SSOT: suite definitions, resources, task bundles and
//! repair outcomes.

mod repair;
mod resource;
mod suite;
mod task;

pub use repair::{RepairResult, RepairStatus};
pub use resource::{is_cluster_scoped_kind, Resource, CLUSTER_SCOPED_KINDS};
pub use suite::{
    Classification, SuiteAssertion, SuiteCase, SuiteDefinition, SuiteMetadata, SuiteTest,
    SUITE_API_VERSION, SUITE_FILE_NAME, SUITE_KIND,
};
pub use task::{
    ManifestRole, PromptContext, TaskArtifacts, TaskCase, TaskManifest, TaskMetadata,
};

pub const CRATE_NAME: &str = "gatekeeper-taskgen-model";
