// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use gatekeeper_taskgen_core::TASK_LABEL;
use gatekeeper_taskgen_model::{ManifestRole, Resource};
use serde_yaml::{Mapping, Value};

use crate::normalize::{enforce_minimal_resources, NormalizationGate};

/// Identity a manifest is rewritten to.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub task_id: &'a str,
    pub role: ManifestRole,
}

/// An exact image reference swapped for a pullable equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSubstitution {
    pub from: &'static str,
    pub to: &'static str,
    /// Why the swap cannot change the outcome of the policy under test.
    pub rationale: &'static str,
}

pub const IMAGE_SUBSTITUTIONS: &[ImageSubstitution] = &[
    ImageSubstitution {
        from: "tomcat",
        to: "nginx",
        rationale: "required-probes inspects probes, not the image",
    },
    ImageSubstitution {
        from: "nginx:1.7.9",
        to: "nginx:1.25",
        rationale: "the 1.7.9 tag is no longer pullable",
    },
];

/// Init containers whose image contains `image_fragment` run `command`
/// instead of their long-running entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitContainerExit {
    pub image_fragment: &'static str,
    pub command: &'static [&'static str],
}

pub const INIT_CONTAINER_EXITS: &[InitContainerExit] = &[
    InitContainerExit {
        image_fragment: "nginx",
        command: &["sh", "-c", "exit 0"],
    },
    // the opa image ships without a shell
    InitContainerExit {
        image_fragment: "opa",
        command: &["opa", "eval", "true"],
    },
];

/// Applies identity, deployability fixes and gated resource normalization.
/// Re-applying with the same arguments is a no-op.
pub fn rewrite_manifest(res: &mut Resource, ctx: &RewriteContext<'_>, gate: NormalizationGate) {
    apply_identity(res, ctx);
    substitute_images(res);
    fix_init_containers(res);
    if gate.resources {
        enforce_minimal_resources(res);
    }
    tracing::trace!(
        task_id = ctx.task_id,
        role = ctx.role.as_str(),
        name = ctx.name,
        "manifest rewritten"
    );
}

pub fn apply_identity(res: &mut Resource, ctx: &RewriteContext<'_>) {
    res.set_name(ctx.name);
    if res.is_cluster_scoped() {
        res.clear_namespace();
    } else {
        res.set_namespace(ctx.namespace);
    }
    res.set_label(TASK_LABEL, ctx.task_id);
}

pub fn fix_init_containers(res: &mut Resource) {
    let Some(pod_spec) = res.pod_spec_mut() else {
        return;
    };
    let Some(Value::Sequence(init)) = pod_spec.get_mut("initContainers") else {
        return;
    };
    for container in init.iter_mut().filter_map(Value::as_mapping_mut) {
        let image = container
            .get("image")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(rule) = INIT_CONTAINER_EXITS
            .iter()
            .find(|rule| image.contains(rule.image_fragment))
        else {
            continue;
        };
        let command = rule
            .command
            .iter()
            .map(|part| Value::String((*part).to_string()))
            .collect();
        container.insert(Value::String("command".into()), Value::Sequence(command));
        container.remove("args");
    }
}

pub fn substitute_images(res: &mut Resource) {
    let Some(pod_spec) = res.pod_spec_mut() else {
        return;
    };
    for field in ["containers", "initContainers"] {
        let Some(Value::Sequence(containers)) = pod_spec.get_mut(field) else {
            continue;
        };
        for container in containers.iter_mut().filter_map(Value::as_mapping_mut) {
            substitute_container_image(container);
        }
    }
}

fn substitute_container_image(container: &mut Mapping) {
    let Some(slot) = container.get_mut("image") else {
        return;
    };
    let Some(image) = slot.as_str() else {
        return;
    };
    if let Some(sub) = IMAGE_SUBSTITUTIONS.iter().find(|sub| sub.from == image) {
        *slot = Value::String(sub.to.to_string());
    }
}

#[must_use]
pub fn is_admission_review(res: &Resource) -> bool {
    res.is_kind("AdmissionReview")
}

/// Pods with ephemeral containers, or with a container name repeated across
/// `containers` and `initContainers`, cannot be applied as fixtures.
#[must_use]
pub fn is_deployable(res: &Resource) -> bool {
    if !res.is_kind("Pod") {
        return true;
    }
    let Some(spec) = res.spec() else {
        return true;
    };
    if spec.contains_key("ephemeralContainers") {
        return false;
    }
    let mut seen = HashSet::new();
    for field in ["containers", "initContainers"] {
        let Some(containers) = spec.get(field).and_then(Value::as_sequence) else {
            continue;
        };
        for name in containers
            .iter()
            .filter_map(|c| c.get("name"))
            .filter_map(Value::as_str)
        {
            if !seen.insert(name) {
                return false;
            }
        }
    }
    true
}
