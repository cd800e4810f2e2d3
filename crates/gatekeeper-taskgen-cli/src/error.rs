// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use gatekeeper_taskgen_core::ExitCode;
use gatekeeper_taskgen_repair::RepairError;
use gatekeeper_taskgen_synth::SuiteError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    #[error("GEMINI_API_KEY not set - Gemini is required for prompt generation")]
    MissingApiKey,
    #[error(transparent)]
    Suites(#[from] SuiteError),
    #[error("{failed} tasks failed verification")]
    Verification { failed: usize },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initialize text generation client: {0}")]
    Client(String),
    #[error(transparent)]
    Repair(#[from] RepairError),
    #[error("repair runtime: {0}")]
    Runtime(String),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::MissingApiKey | Self::Suites(_) => ExitCode::Usage,
            Self::Verification { .. } => ExitCode::Validation,
            Self::Client(_) => ExitCode::DependencyFailure,
            Self::Io { .. } | Self::Repair(_) | Self::Runtime(_) => ExitCode::Internal,
        }
    }
}
