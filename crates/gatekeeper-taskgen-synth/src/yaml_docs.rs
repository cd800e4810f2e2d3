// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use gatekeeper_taskgen_model::Resource;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::SynthError;

/// Decodes every mapping document of a multi-document YAML stream. Empty and
/// scalar documents are skipped.
pub fn parse_documents(text: &str) -> Result<Vec<Resource>, serde_yaml::Error> {
    let mut out = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        if let Some(resource) = Resource::from_value(value) {
            out.push(resource);
        }
    }
    Ok(out)
}

pub fn read_documents(path: &Path) -> Result<Vec<Resource>, SynthError> {
    let text = fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
    parse_documents(&text).map_err(|e| SynthError::yaml(path, e))
}
