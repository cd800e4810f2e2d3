// SPDX-License-Identifier: Apache-2.0

use gatekeeper_taskgen_core::{EXPECTED_LABEL, TASK_LABEL};
use gatekeeper_taskgen_model::Resource;
use serde_yaml::{Mapping, Value};

use crate::normalize::NormalizationGate;

/// A constraint re-scoped to one task namespace.
#[derive(Debug, Clone)]
pub struct ScopedConstraint {
    pub document: Resource,
    pub namespaces_rewritten: bool,
    pub labels_scrubbed: bool,
    /// What happened to `spec.match.namespaces`.
    pub note: String,
}

impl ScopedConstraint {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.namespaces_rewritten || self.labels_scrubbed
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.document.kind()
    }

    #[must_use]
    pub fn gate(&self) -> NormalizationGate {
        NormalizationGate::for_constraint_kind(self.kind())
    }
}

/// Decodes a constraint and scopes it to `namespace`. An empty document
/// decodes to an empty mapping.
pub fn scope_constraint(raw: &str, namespace: &str) -> Result<ScopedConstraint, serde_yaml::Error> {
    let value: Value = serde_yaml::from_str(raw)?;
    let mut document = match value {
        Value::Null => Resource::default(),
        other => Resource::from_value(other).ok_or_else(|| {
            <serde_yaml::Error as serde::de::Error>::custom("constraint is not a mapping")
        })?,
    };

    let (namespaces_rewritten, note) = rewrite_match_namespaces(document.as_mapping_mut(), namespace);
    let mut labels_scrubbed = false;
    for label in [EXPECTED_LABEL, TASK_LABEL] {
        labels_scrubbed |= document.remove_label(label);
    }

    Ok(ScopedConstraint {
        document,
        namespaces_rewritten,
        labels_scrubbed,
        note,
    })
}

fn rewrite_match_namespaces(doc: &mut Mapping, namespace: &str) -> (bool, String) {
    let Some(Value::Mapping(spec)) = doc.get_mut("spec") else {
        return (false, "spec not found; leaving unchanged".to_string());
    };
    let Some(Value::Mapping(scope)) = spec.get_mut("match") else {
        return (false, "spec.match not found; leaving unchanged".to_string());
    };
    let Some(current) = scope.get("namespaces") else {
        return (
            false,
            "spec.match.namespaces not found; leaving unchanged".to_string(),
        );
    };
    let Some(previous) = string_list(current) else {
        return (
            false,
            "spec.match.namespaces is not a string list; leaving unchanged".to_string(),
        );
    };
    if previous.is_empty() {
        return (
            false,
            "spec.match.namespaces empty; leaving unchanged".to_string(),
        );
    }

    scope.insert(
        Value::String("namespaces".into()),
        Value::Sequence(vec![Value::String(namespace.to_string())]),
    );
    (
        true,
        format!("spec.match.namespaces {previous:?} -> [{namespace:?}]"),
    )
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_sequence()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Constraint text as shown in the task prompt: the scoped document when
/// scoping changed anything, otherwise `raw` verbatim.
#[must_use]
pub fn constraint_for_prompt(raw: &str, scoped: &ScopedConstraint) -> String {
    if !scoped.changed() {
        return raw.to_string();
    }
    scoped
        .document
        .to_yaml_string()
        .unwrap_or_else(|_| raw.to_string())
}
