// SPDX-License-Identifier: Apache-2.0

use serde_yaml::{Mapping, Value};

/// Kinds that exist outside any namespace. A materialized resource of one of
/// these kinds must never carry `metadata.namespace`.
pub const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "CSIDriver",
    "CSINode",
    "FlowSchema",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PodSecurityPolicy",
    "PriorityClass",
    "RuntimeClass",
    "StorageClass",
    "ValidatingWebhookConfiguration",
    "VolumeAttachment",
];

#[must_use]
pub fn is_cluster_scoped_kind(kind: &str) -> bool {
    CLUSTER_SCOPED_KINDS.contains(&kind)
}

/// Typed view over one Kubernetes-style document.
///
/// The underlying mapping keeps key insertion order, so a document that is
/// decoded, left untouched and re-encoded keeps its field layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    object: Mapping,
}

impl Resource {
    /// Wraps a decoded document; anything other than a mapping is rejected.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Mapping(object) => Some(Self { object }),
            _ => None,
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let object: Mapping = serde_yaml::from_str(text)?;
        Ok(Self { object })
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.object)
    }

    #[must_use]
    pub fn as_mapping(&self) -> &Mapping {
        &self.object
    }

    pub fn as_mapping_mut(&mut self) -> &mut Mapping {
        &mut self.object
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.get_str(&["kind"])
    }

    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind() == Some(kind)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str(&["metadata", "name"])
    }

    pub fn set_name(&mut self, name: &str) {
        if let Some(meta) = self.nested_mut(&["metadata"]) {
            meta.insert(key("name"), Value::String(name.to_string()));
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.get_str(&["metadata", "namespace"])
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        if let Some(meta) = self.nested_mut(&["metadata"]) {
            meta.insert(key("namespace"), Value::String(namespace.to_string()));
        }
    }

    pub fn clear_namespace(&mut self) {
        if let Some(Value::Mapping(meta)) = self.object.get_mut("metadata") {
            meta.remove("namespace");
        }
    }

    #[must_use]
    pub fn labels(&self) -> Option<&Mapping> {
        self.get(&["metadata", "labels"]).and_then(Value::as_mapping)
    }

    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels()
            .and_then(|labels| labels.get(name))
            .and_then(Value::as_str)
    }

    pub fn set_label(&mut self, name: &str, value: &str) {
        if let Some(labels) = self.nested_mut(&["metadata", "labels"]) {
            labels.insert(key(name), Value::String(value.to_string()));
        }
    }

    /// Removes a label without materializing an empty `labels` map.
    pub fn remove_label(&mut self, name: &str) -> bool {
        match self.object.get_mut("metadata") {
            Some(Value::Mapping(meta)) => match meta.get_mut("labels") {
                Some(Value::Mapping(labels)) => labels.remove(name).is_some(),
                _ => false,
            },
            _ => false,
        }
    }

    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.get(&["metadata", "annotations"])
            .and_then(Value::as_mapping)
            .and_then(|annotations| annotations.get(name))
            .and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_cluster_scoped(&self) -> bool {
        self.kind().is_some_and(is_cluster_scoped_kind)
    }

    #[must_use]
    pub fn spec(&self) -> Option<&Mapping> {
        self.get(&["spec"]).and_then(Value::as_mapping)
    }

    /// Returns an existing Pod spec for `Pod` documents only.
    pub fn pod_spec_mut(&mut self) -> Option<&mut Mapping> {
        if !self.is_kind("Pod") {
            return None;
        }
        match self.object.get_mut("spec") {
            Some(Value::Mapping(spec)) => Some(spec),
            _ => None,
        }
    }

    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut cur = &self.object;
        for segment in parents {
            cur = cur.get(*segment)?.as_mapping()?;
        }
        cur.get(*last)
    }

    #[must_use]
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Walks `path`, replacing any missing or non-mapping segment with an
    /// empty mapping.
    fn nested_mut(&mut self, path: &[&str]) -> Option<&mut Mapping> {
        path.iter()
            .try_fold(&mut self.object, |cur, segment| ensure_mapping(cur, segment))
    }
}

pub(crate) fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

/// Returns `parent[name]` as a mapping, replacing a missing or scalar value.
fn ensure_mapping<'a>(parent: &'a mut Mapping, name: &str) -> Option<&'a mut Mapping> {
    let slot = parent.entry(key(name)).or_insert(Value::Null);
    if !slot.is_mapping() {
        *slot = Value::Mapping(Mapping::new());
    }
    slot.as_mapping_mut()
}
