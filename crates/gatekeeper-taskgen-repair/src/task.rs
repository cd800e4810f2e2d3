// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gatekeeper_taskgen_core::{GenerationRequest, TextGenerator};
use gatekeeper_taskgen_model::{ManifestRole, RepairResult};
use gatekeeper_taskgen_synth::{
    NormalizationGate, ARTIFACTS_DIR, CONSTRAINT_FILE_NAME, TEMPLATE_FILE_NAME,
};

use crate::convergence::apply_candidate;
use crate::error::RepairError;
use crate::prompt::{render_repair_prompt, RepairPrompt};

/// Compliant and violating manifests of one bundle, each sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairTargets {
    pub alpha: Vec<PathBuf>,
    pub beta: Vec<PathBuf>,
}

impl RepairTargets {
    pub fn iter(&self) -> impl Iterator<Item = (ManifestRole, &Path)> {
        self.alpha
            .iter()
            .map(|p| (ManifestRole::Compliant, p.as_path()))
            .chain(self.beta.iter().map(|p| (ManifestRole::Violating, p.as_path())))
    }
}

fn matches_role(file_name: &str, role: ManifestRole) -> bool {
    file_name
        .strip_prefix(role.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|rest| rest.ends_with(".yaml"))
}

pub fn find_targets(task_dir: &Path) -> Result<RepairTargets, RepairError> {
    let artifacts = task_dir.join(ARTIFACTS_DIR);
    let entries = match fs::read_dir(&artifacts) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(RepairError::MissingArtifacts(artifacts));
        }
        Err(err) => return Err(RepairError::io(&artifacts, err)),
    };
    let mut targets = RepairTargets::default();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if matches_role(name, ManifestRole::Compliant) {
            targets.alpha.push(path);
        } else if matches_role(name, ManifestRole::Violating) {
            targets.beta.push(path);
        }
    }
    if targets.alpha.is_empty() || targets.beta.is_empty() {
        return Err(RepairError::MissingArtifacts(artifacts));
    }
    targets.alpha.sort();
    targets.beta.sort();
    Ok(targets)
}

struct TaskContext {
    constraint: String,
    template: String,
    gate: NormalizationGate,
}

fn load_context(task_dir: &Path) -> Result<TaskContext, RepairError> {
    let constraint_path = task_dir.join(CONSTRAINT_FILE_NAME);
    let constraint =
        fs::read_to_string(&constraint_path).map_err(|e| RepairError::io(&constraint_path, e))?;
    let template_path = task_dir.join(TEMPLATE_FILE_NAME);
    let template = match fs::read_to_string(&template_path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(RepairError::io(&template_path, err)),
    };
    Ok(TaskContext {
        gate: NormalizationGate::for_constraint_text(&constraint),
        constraint,
        template,
    })
}

/// Sends every alpha and beta manifest of one bundle through a single repair
/// attempt. Task-level failures yield one `error` result.
pub fn repair_task(
    task_id: &str,
    task_dir: &Path,
    generator: &dyn TextGenerator,
    model: &str,
) -> Vec<RepairResult> {
    let loaded = find_targets(task_dir).and_then(|targets| Ok((targets, load_context(task_dir)?)));
    let (targets, context) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::warn!(task_id, error = %err, "repair skipped");
            return vec![RepairResult::error(task_id, None, err.to_string())];
        }
    };
    targets
        .iter()
        .map(|(role, path)| repair_manifest(task_id, path, role, &context, generator, model))
        .collect()
}

fn repair_manifest(
    task_id: &str,
    path: &Path,
    role: ManifestRole,
    context: &TaskContext,
    generator: &dyn TextGenerator,
    model: &str,
) -> RepairResult {
    let original = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            return RepairResult::error(
                task_id,
                Some(path.to_path_buf()),
                RepairError::io(path, err).to_string(),
            )
        }
    };
    let target_path = path.display().to_string();
    let prompt = render_repair_prompt(&RepairPrompt {
        target_path: &target_path,
        role,
        constraint: &context.constraint,
        template: &context.template,
        target: &original,
    });
    let candidate = match generator.generate(GenerationRequest {
        model,
        prompt: &prompt,
    }) {
        Ok(text) => text,
        Err(err) => {
            return RepairResult::error(
                task_id,
                Some(path.to_path_buf()),
                RepairError::from(err).to_string(),
            )
        }
    };
    let result = apply_candidate(task_id, path, &original, &candidate, context.gate);
    tracing::debug!(
        task_id,
        file = %path.display(),
        status = result.status.as_str(),
        "manifest repair attempted"
    );
    result
}
