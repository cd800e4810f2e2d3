// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;

use gatekeeper_taskgen_core::text::truncate;
use gatekeeper_taskgen_model::ManifestRole;

pub const DEFAULT_REPAIR_MODEL: &str = "gemini-2.5-flash";
pub const REPAIR_SECTION_LIMIT: usize = 2000;
pub const NO_CHANGES_SENTINEL: &str = "NO_CHANGES";

const CONTEXT: &str = "# Context
You are a Kubernetes Expert optimizing a benchmarking suite.
We have a set of manifests used to test Gatekeeper constraints.
Your task is to repair a specific manifest to either satisfy or violate a constraint, as requested.
";

const INSTRUCTIONS: &str = "Keep metadata.name, metadata.namespace, and all labels unchanged.
Do not change kind, apiVersion, or container names.
Prefer the smallest possible resource values (cpu: 1m, memory: 1Mi, ephemeral-storage: 1Mi) while satisfying the constraint.
If resource values must exceed a max to violate, set them just above the limit (never exactly equal).
If the constraint enforces required resources, alpha must include all required keys; beta must omit at least one required key.
If the constraint enforces ratios, alpha should have limits == requests; beta should have limits > requests so the ratio exceeds the max.
Do not add or remove containers unless required to satisfy the policy.
Return ONLY the full updated YAML for the target manifest. Do not return a diff.
";

/// Role label shown to the model; inventory documents are never repaired.
#[must_use]
pub fn role_label(role: ManifestRole) -> &'static str {
    match role {
        ManifestRole::Compliant => "alpha (must be compliant)",
        ManifestRole::Violating => "beta (must violate)",
        ManifestRole::Inventory => "inventory (context only)",
    }
}

/// Inputs of one repair prompt.
#[derive(Debug, Clone, Copy)]
pub struct RepairPrompt<'a> {
    pub target_path: &'a str,
    pub role: ManifestRole,
    pub constraint: &'a str,
    pub template: &'a str,
    pub target: &'a str,
}

fn push_section(out: &mut String, title: &str, body: &str) {
    let body = body.trim();
    if body.is_empty() {
        return;
    }
    let _ = write!(
        out,
        "{title}:\n```yaml\n{}\n```\n\n",
        truncate(body, REPAIR_SECTION_LIMIT)
    );
}

#[must_use]
pub fn render_repair_prompt(prompt: &RepairPrompt<'_>) -> String {
    let mut out = String::from(CONTEXT);
    let _ = write!(
        out,
        "\n# Goal\nTarget Role: {}\n1. Ensure the manifest fulfills the Target Role.\n2. Maintain validity: Ensure the manifest remains a valid Kubernetes object.\n\n",
        role_label(prompt.role)
    );
    let _ = write!(
        out,
        "# Instructions\n1. Edit ONLY the target manifest. Do not modify any other files.\nTarget path (for reference): {}\n{INSTRUCTIONS}If the target already satisfies the role with minimal values, respond with {NO_CHANGES_SENTINEL}.\n\n",
        prompt.target_path
    );
    push_section(&mut out, "Constraint", prompt.constraint);
    push_section(&mut out, "Template", prompt.template);
    push_section(&mut out, "Target manifest", prompt.target);
    out.trim().to_string()
}
