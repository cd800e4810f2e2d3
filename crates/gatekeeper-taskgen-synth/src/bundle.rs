// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use gatekeeper_taskgen_core::task_namespace;
use gatekeeper_taskgen_core::text::{indent, yaml_single_quoted};
use gatekeeper_taskgen_model::{
    ManifestRole, SuiteAssertion, SuiteCase, SuiteDefinition, SuiteMetadata, SuiteTest,
    TaskArtifacts, TaskMetadata, SUITE_API_VERSION, SUITE_FILE_NAME, SUITE_KIND,
};

use crate::assemble::Assembly;
use crate::error::SynthError;

pub const TASK_FILE_NAME: &str = "task.yaml";
pub const TEMPLATE_FILE_NAME: &str = "template.yaml";
pub const CONSTRAINT_FILE_NAME: &str = "constraint.yaml";
pub const SETUP_SCRIPT: &str = "setup.sh";
pub const CLEANUP_SCRIPT: &str = "cleanup.sh";

/// Namespaces the setup script never recreates.
const SHARED_NAMESPACES: &[&str] = &["default", "kube-system"];

/// Report-line patterns: violating names must appear, compliant names must not.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expectations {
    pub contains: Vec<String>,
    pub not_contains: Vec<String>,
}

#[must_use]
pub fn expectations(artifacts: &TaskArtifacts) -> Expectations {
    Expectations {
        contains: artifacts.names_with_role(ManifestRole::Violating),
        not_contains: artifacts.names_with_role(ManifestRole::Compliant),
    }
}

fn expect_rule(rule: &str, name: &str) -> String {
    let pattern = format!("VIOLATING: {}", regex::escape(name));
    format!("- {rule}: {}", yaml_single_quoted(&pattern))
}

#[must_use]
pub fn render_task_yaml(prompt: &str, artifacts: &TaskArtifacts) -> String {
    let expected = expectations(artifacts);
    let rules: Vec<String> = expected
        .contains
        .iter()
        .map(|name| expect_rule("contains", name))
        .chain(
            expected
                .not_contains
                .iter()
                .map(|name| expect_rule("notContains", name)),
        )
        .collect();
    format!(
        "script:\n- prompt: |\n{}\nsetup: {SETUP_SCRIPT}\ncleanup: {CLEANUP_SCRIPT}\nexpect:\n{}\nisolation: cluster\ntimeout: 5m\n",
        indent(prompt, "    "),
        rules.join("\n")
    )
}

/// The bundle's own gator suite: one case entry per materialized object file.
#[must_use]
pub fn bundle_suite(task: &TaskMetadata, artifacts: &TaskArtifacts) -> SuiteDefinition {
    let mut cases = Vec::new();
    for case in &task.cases {
        let inventory = artifacts
            .inventory_files
            .get(&case.name)
            .cloned()
            .unwrap_or_default();
        for object in artifacts.case_files.get(&case.name).into_iter().flatten() {
            cases.push(SuiteCase {
                name: case.name.clone(),
                object: object.clone(),
                inventory: inventory.clone(),
                assertions: vec![SuiteAssertion::expecting(case.classification)],
            });
        }
    }
    SuiteDefinition {
        kind: Some(SUITE_KIND.to_string()),
        api_version: Some(SUITE_API_VERSION.to_string()),
        metadata: SuiteMetadata {
            name: task.task_id.clone(),
        },
        tests: vec![SuiteTest {
            name: task.test_name.clone(),
            template: TEMPLATE_FILE_NAME.to_string(),
            constraint: CONSTRAINT_FILE_NAME.to_string(),
            cases,
        }],
    }
}

fn recreated_namespaces(artifacts: &TaskArtifacts) -> impl Iterator<Item = &String> {
    artifacts
        .namespaces
        .iter()
        .filter(|ns| !SHARED_NAMESPACES.contains(&ns.as_str()))
}

#[must_use]
pub fn render_setup_script(task_id: &str, artifacts: &TaskArtifacts) -> String {
    let mut namespaces = String::new();
    for ns in recreated_namespaces(artifacts) {
        let _ = writeln!(namespaces, "kubectl delete namespace {ns:?} --ignore-not-found");
        let _ = writeln!(namespaces, "kubectl create namespace {ns:?}");
        let _ = writeln!(
            namespaces,
            "kubectl wait --for=jsonpath='{{.status.phase}}'=Active --timeout=120s namespace {ns:?}"
        );
    }
    let pod_summary = if artifacts.has_kind("Pod") {
        "kubectl get pods -n \"$TASK_NAMESPACE\" 2>/dev/null || true"
    } else {
        ""
    };
    let mut out = String::new();
    let _ = write!(
        out,
        "#!/usr/bin/env bash\nset -euo pipefail\nshopt -s nullglob\nTASK_NAMESPACE={:?}\n{}\nARTIFACTS_DIR=\"$(dirname \"$0\")/artifacts\"\n",
        task_namespace(task_id),
        namespaces.trim()
    );
    for (comment, prefix) in [
        ("# Apply inventory", "inventory"),
        ("# Apply alpha/beta resources", "alpha"),
        ("", "beta"),
    ] {
        if !comment.is_empty() {
            out.push_str(comment);
            out.push('\n');
        }
        let _ = write!(
            out,
            "for file in \"$ARTIFACTS_DIR\"/{prefix}-*.yaml; do\n  kubectl apply -f \"$file\"\ndone\n"
        );
    }
    out.push_str(pod_summary);
    out.push('\n');
    out
}

#[must_use]
pub fn render_cleanup_script(artifacts: &TaskArtifacts) -> String {
    let mut out = String::from("#!/usr/bin/env bash\nset -euo pipefail\n");
    for ns in recreated_namespaces(artifacts) {
        let _ = writeln!(out, "kubectl delete namespace {ns:?} --ignore-not-found");
    }
    out
}

fn write_file(path: &Path, contents: &str) -> Result<(), SynthError> {
    fs::write(path, contents).map_err(|e| SynthError::io(path, e))
}

fn write_script(path: &Path, contents: &str) -> Result<(), SynthError> {
    write_file(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| SynthError::io(path, e))?;
    }
    Ok(())
}

/// Writes the descriptors, scoped constraint, template copy and scripts.
pub fn write_bundle(
    out_dir: &Path,
    task: &TaskMetadata,
    assembly: &Assembly,
    prompt: &str,
) -> Result<(), SynthError> {
    write_file(
        &out_dir.join(TASK_FILE_NAME),
        &render_task_yaml(prompt, &assembly.artifacts),
    )?;

    let suite = serde_yaml::to_string(&bundle_suite(task, &assembly.artifacts))
        .map_err(|e| SynthError::encode(SUITE_FILE_NAME, e))?;
    write_file(&out_dir.join(SUITE_FILE_NAME), &suite)?;

    let constraint = assembly
        .constraint
        .document
        .to_yaml_string()
        .map_err(|e| SynthError::encode(CONSTRAINT_FILE_NAME, e))?;
    write_file(&out_dir.join(CONSTRAINT_FILE_NAME), &constraint)?;
    write_file(&out_dir.join(TEMPLATE_FILE_NAME), &assembly.template_text)?;

    write_script(
        &out_dir.join(SETUP_SCRIPT),
        &render_setup_script(&task.task_id, &assembly.artifacts),
    )?;
    write_script(
        &out_dir.join(CLEANUP_SCRIPT),
        &render_cleanup_script(&assembly.artifacts),
    )
}
