// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    Repaired,
    NoChanges,
    Error,
}

impl RepairStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repaired => "repaired",
            Self::NoChanges => "no_changes",
            Self::Error => "error",
        }
    }
}

/// Outcome of one manifest's repair attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairResult {
    pub task_id: String,
    pub status: RepairStatus,
    pub file_path: Option<PathBuf>,
    pub diff: Option<String>,
    pub error: Option<String>,
}

impl RepairResult {
    #[must_use]
    pub fn repaired(task_id: &str, file_path: PathBuf, diff: Option<String>) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: RepairStatus::Repaired,
            file_path: Some(file_path),
            diff,
            error: None,
        }
    }

    #[must_use]
    pub fn no_changes(task_id: &str, file_path: PathBuf) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: RepairStatus::NoChanges,
            file_path: Some(file_path),
            diff: None,
            error: None,
        }
    }

    #[must_use]
    pub fn error(task_id: &str, file_path: Option<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: RepairStatus::Error,
            file_path,
            diff: None,
            error: Some(cause.into()),
        }
    }
}
