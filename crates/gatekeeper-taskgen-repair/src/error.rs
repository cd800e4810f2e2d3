// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use gatekeeper_taskgen_core::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepairError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing alpha or beta artifacts in {0}")]
    MissingArtifacts(PathBuf),
    #[error("gemini API error: {0}")]
    Generation(#[from] GenerationError),
    #[error("repair output missing manifest YAML")]
    MissingManifest,
    #[error("repair output is not valid YAML: {0}")]
    InvalidCandidate(#[source] serde_yaml::Error),
}

impl RepairError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
