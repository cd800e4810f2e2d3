// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use gatekeeper_taskgen_core::TextGenerator;
use gatekeeper_taskgen_model::{RepairResult, RepairStatus, TaskMetadata};
use gatekeeper_taskgen_repair::{
    repair_all, summarize, write_report, RepairJob, RepairSettings, RepairSummary,
};
use gatekeeper_taskgen_synth::{generate_task, parse_suites, ParsedSuites};
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::error::CliError;
use crate::verify::verify_tasks;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub generated: usize,
    pub skipped: usize,
    pub generated_ids: Vec<String>,
}

/// Parses the library and generates every non-skipped task in id order.
/// Test-level rejections and per-task failures count as skipped.
pub fn generate_all(
    config: &GeneratorConfig,
    parsed: &ParsedSuites,
    generator: &dyn TextGenerator,
) -> Result<GenerationSummary, CliError> {
    fs::create_dir_all(&config.output_dir).map_err(|e| CliError::io(&config.output_dir, e))?;

    let mut summary = GenerationSummary::default();
    for rejected in &parsed.rejected {
        println!("Skipped {}: {}", rejected.task_id, rejected.reason);
        summary.skipped += 1;
    }
    for (id, task) in &parsed.tasks {
        if let Some(pattern) = config.skip_reason(task) {
            println!("Skipped {id}: skip list");
            debug!(task_id = %id, pattern, "task skipped");
            summary.skipped += 1;
            continue;
        }
        match generate_task(task, &config.output_dir, generator, &config.prompt_model) {
            Ok(generated) => {
                if config.verbose {
                    println!("Generated task {id}");
                }
                info!(
                    task_id = %id,
                    manifests = generated.artifacts.manifests.len(),
                    events = generated.events.len(),
                    "task generated"
                );
                summary.generated += 1;
                summary.generated_ids.push(id.clone());
            }
            Err(err) => {
                println!("Skipped {id}: {err}");
                warn!(task_id = %id, error = %err, "task generation failed");
                summary.skipped += 1;
            }
        }
    }
    println!(
        "Generated tasks: {} (skipped {})",
        summary.generated, summary.skipped
    );
    Ok(summary)
}

/// Bundles under the output directory that belong to a parsed task.
#[must_use]
pub fn repair_jobs<'a>(
    config: &GeneratorConfig,
    tasks: impl IntoIterator<Item = &'a TaskMetadata>,
) -> Vec<RepairJob> {
    tasks
        .into_iter()
        .map(|task| RepairJob {
            task_id: task.task_id.clone(),
            task_dir: config.output_dir.join(&task.task_id),
        })
        .filter(|job| job.task_dir.is_dir())
        .collect()
}

pub fn run_repair(
    config: &GeneratorConfig,
    jobs: Vec<RepairJob>,
    generator: Arc<dyn TextGenerator>,
) -> Result<(Vec<RepairResult>, PathBuf), CliError> {
    println!("Starting repair on {}...", config.output_dir.display());
    let settings = RepairSettings {
        concurrency: config.repair_concurrency,
        model: config.repair_model.clone(),
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let results = runtime.block_on(repair_all(jobs, generator, &settings));

    for result in &results {
        let file = result
            .file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match result.status {
            RepairStatus::Repaired => println!("Repaired {}: {file}", result.task_id),
            RepairStatus::Error => println!(
                "Error repairing {}: {}",
                result.task_id,
                result.error.as_deref().unwrap_or_default()
            ),
            RepairStatus::NoChanges => {}
        }
    }
    let RepairSummary {
        repaired, errors, ..
    } = summarize(&results);
    println!("Repair complete. Repaired: {repaired}, Errors: {errors}");

    let report = write_report(&config.output_dir, &results)?;
    info!(report = %report.display(), "repair report written");
    Ok((results, report))
}

/// Full run: verify-only short circuit, or generate, verify and repair.
pub fn run_pipeline(
    config: &GeneratorConfig,
    generator: Option<Arc<dyn TextGenerator>>,
) -> Result<(), CliError> {
    if config.verify_only {
        verify_tasks(&config.output_dir, &config.gator)?.into_result()?;
        return Ok(());
    }
    let generator = generator.ok_or(CliError::MissingApiKey)?;

    let parsed = parse_suites(&config.library_root)?;
    info!(
        suites = parsed.suite_files,
        tasks = parsed.tasks.len(),
        rejected = parsed.rejected.len(),
        "library parsed"
    );
    generate_all(config, &parsed, &*generator)?;

    if config.verify {
        match verify_tasks(&config.output_dir, &config.gator).and_then(|s| s.into_result()) {
            Ok(_) => {}
            Err(err) => {
                eprintln!("Verification failed: {err}");
                warn!(error = %err, "verification failed");
            }
        }
    }

    if config.repair {
        let jobs = repair_jobs(config, parsed.tasks.values());
        run_repair(config, jobs, Arc::clone(&generator))?;
    }
    Ok(())
}
