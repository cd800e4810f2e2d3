// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Fixture synthesis: suite classification, identity allocation, manifest
//! rewriting and normalization, and task bundle emission.

mod assemble;
mod bundle;
mod constraint;
mod error;
mod logging;
mod normalize;
mod prompt;
mod registry;
mod rewrite;
mod suite_parser;
mod yaml_docs;

use std::fs;
use std::path::{Path, PathBuf};

use gatekeeper_taskgen_core::TextGenerator;
use gatekeeper_taskgen_model::{TaskArtifacts, TaskMetadata};

pub const CRATE_NAME: &str = "gatekeeper-taskgen-synth";

pub use assemble::{assemble_task, Assembly, ARTIFACTS_DIR};
pub use bundle::{
    bundle_suite, expectations, render_cleanup_script, render_setup_script, render_task_yaml,
    write_bundle, Expectations, CLEANUP_SCRIPT, CONSTRAINT_FILE_NAME, SETUP_SCRIPT,
    TASK_FILE_NAME, TEMPLATE_FILE_NAME,
};
pub use constraint::{constraint_for_prompt, scope_constraint, ScopedConstraint};
pub use error::{RegistryError, SuiteError, SynthError};
pub use logging::{SynthEvent, SynthLog, SynthStage};
pub use normalize::{
    constraint_kind, enforce_minimal_replicas, enforce_minimal_resources, normalize_document,
    normalize_resource, NormalizationGate, MIN_CPU, MIN_MEMORY, REPLICA_WORKLOAD_KINDS,
    RESOURCE_SENSITIVE_KINDS,
};
pub use prompt::{
    generate_task_prompt, render_task_prompt, CONSTRAINT_PROMPT_LIMIT, DEFAULT_PROMPT_MODEL,
    EXAMPLE_PROMPT_LIMIT, MAX_PROMPT_EXAMPLES,
};
pub use registry::{IdentityKey, NameRegistry};
pub use rewrite::{
    apply_identity, fix_init_containers, is_admission_review, is_deployable, rewrite_manifest,
    substitute_images, ImageSubstitution, InitContainerExit, RewriteContext, IMAGE_SUBSTITUTIONS,
    INIT_CONTAINER_EXITS,
};
pub use suite_parser::{discover_suite_files, parse_suites, ParsedSuites, RejectedTest};
pub use yaml_docs::{parse_documents, read_documents};

/// A bundle written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedTask {
    pub task_id: String,
    pub out_dir: PathBuf,
    pub artifacts: TaskArtifacts,
    pub events: Vec<SynthEvent>,
}

/// Generates the bundle for `task` under `output_root/<task id>`.
///
/// Any previous bundle directory is replaced. On failure the directory is
/// removed so no partial bundle is left behind.
pub fn generate_task(
    task: &TaskMetadata,
    output_root: &Path,
    generator: &dyn TextGenerator,
    model: &str,
) -> Result<GeneratedTask, SynthError> {
    let out_dir = output_root.join(&task.task_id);
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir).map_err(|e| SynthError::io(&out_dir, e))?;
    }
    fs::create_dir_all(&out_dir).map_err(|e| SynthError::io(&out_dir, e))?;

    match build_bundle(task, &out_dir, generator, model) {
        Ok(generated) => Ok(generated),
        Err(err) => {
            if let Err(cleanup) = fs::remove_dir_all(&out_dir) {
                tracing::warn!(
                    dir = %out_dir.display(),
                    error = %cleanup,
                    "failed to remove partial bundle"
                );
            }
            Err(err)
        }
    }
}

fn build_bundle(
    task: &TaskMetadata,
    out_dir: &Path,
    generator: &dyn TextGenerator,
    model: &str,
) -> Result<GeneratedTask, SynthError> {
    let assembly = assemble_task(task, out_dir)?;
    let prompt = generate_task_prompt(generator, model, &assembly.prompt)?;
    write_bundle(out_dir, task, &assembly, &prompt)?;
    let mut log = SynthLog::default();
    log.note(
        SynthStage::Finalize,
        "bundle.written",
        &[("task_id", task.task_id.as_str())],
    );
    let mut events = assembly.events;
    events.extend(log.into_events());
    Ok(GeneratedTask {
        task_id: task.task_id.clone(),
        out_dir: out_dir.to_path_buf(),
        artifacts: assembly.artifacts,
        events,
    })
}
