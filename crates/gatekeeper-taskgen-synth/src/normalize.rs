// SPDX-License-Identifier: Apache-2.0

use gatekeeper_taskgen_model::Resource;
use serde_yaml::{Mapping, Value};

/// Constraint kinds defined over container resource values. Fixtures governed
/// by these keep their resource quantities untouched.
pub const RESOURCE_SENSITIVE_KINDS: &[&str] = &[
    "K8sContainerLimits",
    "K8sContainerRequests",
    "K8sContainerRatios",
    "K8sRequiredResources",
    "K8sContainerEphemeralStorageLimit",
];

pub const REPLICA_WORKLOAD_KINDS: &[&str] = &[
    "Deployment",
    "StatefulSet",
    "ReplicaSet",
    "ReplicationController",
];

pub const MIN_CPU: &str = "1m";
pub const MIN_MEMORY: &str = "1Mi";

/// Which normalizations apply to fixtures of one constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationGate {
    pub resources: bool,
    pub replicas: bool,
}

impl Default for NormalizationGate {
    fn default() -> Self {
        Self::ALL
    }
}

impl NormalizationGate {
    pub const ALL: Self = Self {
        resources: true,
        replicas: true,
    };

    /// Replica clamping is skipped for any kind mentioning "replica"; an
    /// unknown or missing kind normalizes everything.
    #[must_use]
    pub fn for_constraint_kind(kind: Option<&str>) -> Self {
        let kind = kind.unwrap_or_default();
        Self {
            resources: !RESOURCE_SENSITIVE_KINDS.contains(&kind),
            replicas: !kind.to_ascii_lowercase().contains("replica"),
        }
    }

    #[must_use]
    pub fn for_constraint_text(text: &str) -> Self {
        Self::for_constraint_kind(constraint_kind(text).as_deref())
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        self.resources || self.replicas
    }
}

/// Top-level `kind` of a constraint document, if it decodes.
#[must_use]
pub fn constraint_kind(text: &str) -> Option<String> {
    let value: Value = serde_yaml::from_str(text).ok()?;
    value.get("kind")?.as_str().map(str::to_string)
}

/// Drives existing cpu/memory limits and requests of every Pod container and
/// init container to the minimal quantities. Keys are never added.
pub fn enforce_minimal_resources(res: &mut Resource) -> bool {
    let Some(pod_spec) = res.pod_spec_mut() else {
        return false;
    };
    let mut changed = false;
    for field in ["containers", "initContainers"] {
        let Some(Value::Sequence(containers)) = pod_spec.get_mut(field) else {
            continue;
        };
        for container in containers.iter_mut() {
            let Some(resources) = container.get_mut("resources").and_then(Value::as_mapping_mut)
            else {
                continue;
            };
            for section in ["limits", "requests"] {
                if let Some(Value::Mapping(values)) = resources.get_mut(section) {
                    changed |= overwrite_existing(values, "cpu", MIN_CPU);
                    changed |= overwrite_existing(values, "memory", MIN_MEMORY);
                }
            }
        }
    }
    changed
}

fn overwrite_existing(values: &mut Mapping, key: &str, minimal: &str) -> bool {
    match values.get_mut(key) {
        Some(slot) if slot.as_str() != Some(minimal) => {
            *slot = Value::String(minimal.to_string());
            true
        }
        _ => false,
    }
}

/// Clamps an existing `spec.replicas` of a replicated workload to one.
pub fn enforce_minimal_replicas(res: &mut Resource) -> bool {
    if !res.kind().is_some_and(|k| REPLICA_WORKLOAD_KINDS.contains(&k)) {
        return false;
    }
    let Some(Value::Mapping(spec)) = res.as_mapping_mut().get_mut("spec") else {
        return false;
    };
    match spec.get_mut("replicas") {
        Some(slot) if slot.as_u64() != Some(1) => {
            *slot = Value::Number(1.into());
            true
        }
        _ => false,
    }
}

pub fn normalize_resource(res: &mut Resource, gate: NormalizationGate) -> bool {
    let mut changed = false;
    if gate.resources {
        changed |= enforce_minimal_resources(res);
    }
    if gate.replicas {
        changed |= enforce_minimal_replicas(res);
    }
    changed
}

/// Decodes, normalizes and re-encodes one manifest; the result is trimmed.
pub fn normalize_document(text: &str, gate: NormalizationGate) -> Result<String, serde_yaml::Error> {
    let mut res = Resource::from_yaml_str(text)?;
    normalize_resource(&mut res, gate);
    Ok(res.to_yaml_string()?.trim().to_string())
}
