// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;

use gatekeeper_taskgen_core::TextGenerator;
use gatekeeper_taskgen_model::{RepairResult, RepairStatus};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::prompt::DEFAULT_REPAIR_MODEL;

pub const DEFAULT_REPAIR_CONCURRENCY: usize = 10;

/// One bundle directory to repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairJob {
    pub task_id: String,
    pub task_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairSettings {
    pub concurrency: usize,
    pub model: String,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_REPAIR_CONCURRENCY,
            model: DEFAULT_REPAIR_MODEL.to_string(),
        }
    }
}

/// Repairs every job with at most `settings.concurrency` bundles in flight.
///
/// Results are sorted by task id; within a task, alpha manifests precede beta
/// manifests. A worker that fails to complete yields one `error` result.
pub async fn repair_all(
    jobs: Vec<RepairJob>,
    generator: Arc<dyn TextGenerator>,
    settings: &RepairSettings,
) -> Vec<RepairResult> {
    let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
    let results = Arc::new(Mutex::new(Vec::new()));
    let mut workers = JoinSet::new();

    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        let results = Arc::clone(&results);
        let generator = Arc::clone(&generator);
        let model = settings.model.clone();
        workers.spawn(async move {
            let task_id = job.task_id.clone();
            let batch = match semaphore.acquire_owned().await {
                Ok(_permit) => tokio::task::spawn_blocking(move || {
                    crate::task::repair_task(&job.task_id, &job.task_dir, &*generator, &model)
                })
                .await
                .unwrap_or_else(|e| {
                    vec![RepairResult::error(
                        &task_id,
                        None,
                        format!("repair worker failed: {e}"),
                    )]
                }),
                Err(e) => vec![RepairResult::error(&task_id, None, e.to_string())],
            };
            for result in &batch {
                log_result(result);
            }
            results.lock().await.extend(batch);
        });
    }
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "repair worker aborted");
        }
    }

    let mut all = std::mem::take(&mut *results.lock().await);
    all.sort_by(|a, b| a.task_id.cmp(&b.task_id));
    all
}

fn log_result(result: &RepairResult) {
    let file = result
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    match result.status {
        RepairStatus::Error => tracing::warn!(
            task_id = %result.task_id,
            file = %file,
            error = result.error.as_deref().unwrap_or_default(),
            "repair failed"
        ),
        status => tracing::info!(
            task_id = %result.task_id,
            file = %file,
            status = status.as_str(),
            "repair finished"
        ),
    }
}
