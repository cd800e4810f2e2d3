// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::suite::Classification;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCase {
    pub name: String,
    pub classification: Classification,
    pub object_path: PathBuf,
    #[serde(default)]
    pub inventory: Vec<PathBuf>,
}

/// One resolved unit of work: a suite test with classified cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub task_id: String,
    pub suite_name: String,
    pub test_name: String,
    pub template_path: PathBuf,
    pub constraint_path: PathBuf,
    pub cases: Vec<TaskCase>,
}

impl TaskMetadata {
    #[must_use]
    pub fn count(&self, classification: Classification) -> usize {
        self.cases
            .iter()
            .filter(|c| c.classification == classification)
            .count()
    }

    /// A task is only worth materializing with both positive and negative cases.
    #[must_use]
    pub fn has_both_classifications(&self) -> bool {
        self.count(Classification::Compliant) > 0 && self.count(Classification::Violating) > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestRole {
    Compliant,
    Violating,
    Inventory,
}

impl ManifestRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "alpha",
            Self::Violating => "beta",
            Self::Inventory => "inventory",
        }
    }

    #[must_use]
    pub const fn classification(self) -> Option<Classification> {
        match self {
            Self::Compliant => Some(Classification::Compliant),
            Self::Violating => Some(Classification::Violating),
            Self::Inventory => None,
        }
    }
}

impl From<Classification> for ManifestRole {
    fn from(value: Classification) -> Self {
        match value {
            Classification::Compliant => Self::Compliant,
            Classification::Violating => Self::Violating,
        }
    }
}

/// A manifest file materialized into a task bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskManifest {
    pub path: PathBuf,
    pub rel_path: String,
    pub case_name: String,
    pub role: ManifestRole,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskArtifacts {
    pub manifests: Vec<TaskManifest>,
    /// Case name to the object files materialized for it.
    pub case_files: BTreeMap<String, Vec<String>>,
    /// Case name to the inventory files deployed alongside it.
    pub inventory_files: BTreeMap<String, Vec<String>>,
    /// Every namespace touched by the bundle, sorted.
    pub namespaces: Vec<String>,
}

impl TaskArtifacts {
    #[must_use]
    pub fn count(&self, role: ManifestRole) -> usize {
        self.manifests.iter().filter(|m| m.role == role).count()
    }

    #[must_use]
    pub fn has_kind(&self, kind: &str) -> bool {
        self.manifests.iter().any(|m| m.kind == kind)
    }

    /// Sorted, de-duplicated names of manifests with the given role.
    #[must_use]
    pub fn names_with_role(&self, role: ManifestRole) -> Vec<String> {
        self.manifests
            .iter()
            .filter(|m| m.role == role && !m.name.is_empty())
            .map(|m| m.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Everything the task prompt generator needs to know about one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub template_yaml: String,
    pub constraint_yaml: String,
    pub alpha_examples: Vec<String>,
    pub beta_examples: Vec<String>,
    pub namespace: String,
    pub namespaced_kinds: Vec<String>,
    pub cluster_kinds: Vec<String>,
}
