// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use gatekeeper_taskgen_core::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuiteError {
    #[error("no suite.yaml files found under {0}")]
    NoSuites(PathBuf),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("cannot allocate a name for {kind} in {namespace:?}: base name is empty")]
    EmptyBase { kind: String, namespace: String },
    #[error("name suffixes exhausted for {base} ({kind} in {namespace:?})")]
    Exhausted {
        kind: String,
        namespace: String,
        base: String,
    },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SynthError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("prompt generation failed: {0}")]
    Prompt(#[from] GenerationError),
    #[error("missing compliant or violating manifests (compliant={compliant} violating={violating})")]
    MissingManifests { compliant: usize, violating: usize },
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn encode(what: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Encode {
            what: what.into(),
            source,
        }
    }
}
