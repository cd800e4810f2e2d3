// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod ports;
pub mod text;

pub use ports::{GenerationError, GenerationRequest, TextGenerator};

pub const CRATE_NAME: &str = "gatekeeper-taskgen-core";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

impl ExitCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::Validation => "validation",
            Self::DependencyFailure => "dependency_failure",
            Self::Internal => "internal",
        }
    }
}

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_TASKGEN_LOG_LEVEL: &str = "TASKGEN_LOG_LEVEL";

/// Label attached to every materialized resource, keyed to the owning task.
pub const TASK_LABEL: &str = "k8s-ai-bench/task";
/// Legacy classification label; never written, only scrubbed from constraints.
pub const EXPECTED_LABEL: &str = "k8s-ai-bench/expected";

/// Isolated namespace a task bundle deploys into.
#[must_use]
pub fn task_namespace(task_id: &str) -> String {
    format!("gk-{task_id}")
}
