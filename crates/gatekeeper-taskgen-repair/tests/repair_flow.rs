// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use gatekeeper_taskgen_core::{GenerationError, GenerationRequest, TextGenerator};
use gatekeeper_taskgen_model::{RepairResult, RepairStatus};
use gatekeeper_taskgen_repair::{
    render_report, repair_all, repair_task, write_report, RepairJob, RepairSettings,
    REPORT_FILE_NAME,
};
use gatekeeper_taskgen_synth::{normalize_document, NormalizationGate};
use tempfile::tempdir;

const PROBES_CONSTRAINT: &str =
    "apiVersion: constraints.gatekeeper.sh/v1beta1\nkind: K8sRequiredProbes\nmetadata:\n  name: must-have-probes\n";
const LIMITS_CONSTRAINT: &str =
    "apiVersion: constraints.gatekeeper.sh/v1beta1\nkind: K8sContainerLimits\nmetadata:\n  name: container-limits\n";

fn pod(name: &str, cpu: &str) -> String {
    format!(
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: {name}\n  namespace: gk-t\nspec:\n  containers:\n  - name: app\n    image: nginx\n    resources:\n      limits:\n        cpu: {cpu}\n"
    )
}

/// On-disk form written by bundle assembly.
fn canonical(text: &str) -> String {
    format!(
        "{}\n",
        normalize_document(text, NormalizationGate::ALL).expect("normalize")
    )
}

fn write_bundle(dir: &Path, constraint: Option<&str>, alpha: &[String], beta: &[String]) {
    let artifacts = dir.join("artifacts");
    fs::create_dir_all(&artifacts).expect("artifacts");
    if let Some(constraint) = constraint {
        fs::write(dir.join("constraint.yaml"), constraint).expect("constraint");
    }
    for (i, text) in alpha.iter().enumerate() {
        fs::write(artifacts.join(format!("alpha-{:02}.yaml", i + 1)), text).expect("alpha");
    }
    for (i, text) in beta.iter().enumerate() {
        fs::write(artifacts.join(format!("beta-{:02}.yaml", i + 1)), text).expect("beta");
    }
}

/// Answers by target file name; prompts are recorded.
struct ScriptedGenerator {
    answers: Vec<(&'static str, Result<String, GenerationError>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(answers: Vec<(&'static str, Result<String, GenerationError>)>) -> Self {
        Self {
            answers,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("prompts")
            .push(request.prompt.to_string());
        self.answers
            .iter()
            .find(|(file, _)| request.prompt.contains(&format!("artifacts/{file}")))
            .map(|(_, answer)| answer.clone())
            .unwrap_or_else(|| Ok("NO_CHANGES".to_string()))
    }
}

#[test]
fn edited_candidate_is_persisted_with_diff() {
    let root = tempdir().expect("tmp");
    let alpha = canonical(&pod("resource-001", "1m"));
    let beta = canonical(&pod("resource-002", "1m"));
    write_bundle(root.path(), Some(LIMITS_CONSTRAINT), &[alpha.clone()], &[beta]);
    let edited = format!("```yaml\n{}```", pod("resource-002", "3"));
    let generator = ScriptedGenerator::new(vec![("beta-01.yaml", Ok(edited))]);

    let results = repair_task("t", root.path(), &generator, "gemini-2.5-flash");
    let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![RepairStatus::NoChanges, RepairStatus::Repaired]);

    let beta_path = root.path().join("artifacts/beta-01.yaml");
    assert_eq!(results[1].file_path.as_deref(), Some(beta_path.as_path()));
    let persisted = fs::read_to_string(&beta_path).expect("beta");
    assert!(persisted.contains("        cpu: 3\n"));
    assert!(persisted.ends_with('\n'));
    let diff = results[1].diff.as_deref().expect("diff");
    assert!(diff.contains("-        cpu: 1m"));

    let untouched = fs::read_to_string(root.path().join("artifacts/alpha-01.yaml")).expect("alpha");
    assert_eq!(untouched, alpha);

    let prompts = generator.prompts.lock().expect("prompts");
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Target Role: alpha (must be compliant)"));
    assert!(prompts[1].contains("Target Role: beta (must violate)"));
    assert!(prompts[1].contains("kind: K8sContainerLimits"));
    assert!(!prompts[1].contains("Template:"));
}

#[test]
fn sentinel_with_drift_writes_normalized_original() {
    let root = tempdir().expect("tmp");
    let drifted = pod("resource-001", "500m");
    write_bundle(
        root.path(),
        Some(PROBES_CONSTRAINT),
        &[drifted],
        &[canonical(&pod("resource-002", "1m"))],
    );
    let generator = ScriptedGenerator::new(Vec::new());

    let results = repair_task("t", root.path(), &generator, "m");
    assert_eq!(results[0].status, RepairStatus::Repaired);
    assert!(results[0].diff.as_deref().expect("diff").contains("+        cpu: 1m"));
    let healed = fs::read_to_string(root.path().join("artifacts/alpha-01.yaml")).expect("alpha");
    assert!(healed.contains("cpu: 1m"));
    assert!(!healed.contains("500m"));
    assert_eq!(results[1].status, RepairStatus::NoChanges);
}

#[test]
fn unchanged_candidate_after_normalization_is_no_change() {
    let root = tempdir().expect("tmp");
    let alpha = canonical(&pod("resource-001", "1m"));
    write_bundle(
        root.path(),
        Some(PROBES_CONSTRAINT),
        &[alpha.clone()],
        &[canonical(&pod("resource-002", "1m"))],
    );
    // Higher quantities normalize back to the stored minimum.
    let generator =
        ScriptedGenerator::new(vec![("alpha-01.yaml", Ok(pod("resource-001", "250m")))]);

    let results = repair_task("t", root.path(), &generator, "m");
    assert_eq!(results[0].status, RepairStatus::NoChanges);
    assert!(results[0].diff.is_none());
    let stored = fs::read_to_string(root.path().join("artifacts/alpha-01.yaml")).expect("alpha");
    assert_eq!(stored, alpha);
}

#[test]
fn per_manifest_failures_do_not_block_siblings() {
    let root = tempdir().expect("tmp");
    write_bundle(
        root.path(),
        Some(PROBES_CONSTRAINT),
        &[canonical(&pod("resource-001", "1m"))],
        &[
            canonical(&pod("resource-002", "1m")),
            canonical(&pod("resource-003", "1m")),
        ],
    );
    let generator = ScriptedGenerator::new(vec![
        ("alpha-01.yaml", Err(GenerationError::Transport("timeout".into()))),
        ("beta-01.yaml", Ok("Sorry, I cannot do that.".into())),
    ]);

    let results = repair_task("t", root.path(), &generator, "m");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].status, RepairStatus::Error);
    assert!(results[0].error.as_deref().expect("error").contains("timeout"));
    assert_eq!(
        results[1].error.as_deref(),
        Some("repair output missing manifest YAML")
    );
    assert_eq!(results[2].status, RepairStatus::NoChanges);
}

#[test]
fn bundle_missing_violating_artifacts_is_one_error() {
    let root = tempdir().expect("tmp");
    write_bundle(
        root.path(),
        Some(PROBES_CONSTRAINT),
        &[canonical(&pod("resource-001", "1m"))],
        &[],
    );
    let generator = ScriptedGenerator::new(Vec::new());
    let results = repair_task("t", root.path(), &generator, "m");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, RepairStatus::Error);
    assert!(results[0]
        .error
        .as_deref()
        .expect("error")
        .starts_with("missing alpha or beta artifacts"));
    assert!(generator.prompts.lock().expect("prompts").is_empty());
}

#[test]
fn unreadable_constraint_is_one_error() {
    let root = tempdir().expect("tmp");
    write_bundle(
        root.path(),
        None,
        &[canonical(&pod("resource-001", "1m"))],
        &[canonical(&pod("resource-002", "1m"))],
    );
    let generator = ScriptedGenerator::new(Vec::new());
    let results = repair_task("t", root.path(), &generator, "m");
    assert_eq!(results.len(), 1);
    assert!(results[0]
        .error
        .as_deref()
        .expect("error")
        .contains("constraint.yaml"));
}

#[test]
fn unreadable_template_is_one_error() {
    let root = tempdir().expect("tmp");
    write_bundle(
        root.path(),
        Some(PROBES_CONSTRAINT),
        &[canonical(&pod("resource-001", "1m"))],
        &[canonical(&pod("resource-002", "1m"))],
    );
    fs::create_dir(root.path().join("template.yaml")).expect("template dir");
    let generator = ScriptedGenerator::new(Vec::new());
    let results = repair_task("t", root.path(), &generator, "m");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, RepairStatus::Error);
    assert!(results[0]
        .error
        .as_deref()
        .expect("error")
        .contains("template.yaml"));
    assert!(generator.prompts.lock().expect("prompts").is_empty());
}

/// Tracks how many requests run at once.
struct SlowGenerator {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TextGenerator for SlowGenerator {
    fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        if request.prompt.contains("/explode/") {
            panic!("generator crashed");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(25));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("NO_CHANGES".into())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_bounds_concurrency_and_sorts_results() {
    let root = tempdir().expect("tmp");
    let mut jobs = Vec::new();
    for id in ["delta", "alpha-task", "charlie", "bravo", "explode"] {
        let dir = root.path().join(id);
        write_bundle(
            &dir,
            Some(PROBES_CONSTRAINT),
            &[canonical(&pod("resource-001", "1m"))],
            &[canonical(&pod("resource-002", "1m"))],
        );
        jobs.push(RepairJob {
            task_id: id.to_string(),
            task_dir: dir,
        });
    }
    let generator = Arc::new(SlowGenerator {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let settings = RepairSettings {
        concurrency: 2,
        model: "m".into(),
    };

    let results = repair_all(jobs, generator.clone(), &settings).await;
    let ids: Vec<_> = results.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "alpha-task",
            "alpha-task",
            "bravo",
            "bravo",
            "charlie",
            "charlie",
            "delta",
            "delta",
            "explode"
        ]
    );
    assert!(generator.peak.load(Ordering::SeqCst) <= 2);
    let crashed = results.last().expect("explode");
    assert_eq!(crashed.status, RepairStatus::Error);
    assert!(crashed
        .error
        .as_deref()
        .expect("error")
        .starts_with("repair worker failed"));
}

#[test]
fn report_lists_every_outcome() {
    let results = vec![
        RepairResult::repaired(
            "limits",
            "tasks/limits/artifacts/beta-01.yaml".into(),
            Some("--- original\n+++ repaired\n-a\n+b\n".into()),
        ),
        RepairResult::no_changes("probes", "tasks/probes/artifacts/alpha-01.yaml".into()),
        RepairResult::error("ratios", None, "missing alpha or beta artifacts"),
    ];
    let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single().expect("time");
    let report = render_report(&results, &at);
    assert!(report.starts_with("# Gatekeeper Task Repair Report\n\nGenerated: 2024-05-06 07:08:09\n"));
    assert!(report.contains("| Repaired | 1 |\n| No Changes | 1 |\n| Errors | 1 |"));
    assert!(report.contains(
        "### limits\n\n**File:** `tasks/limits/artifacts/beta-01.yaml`\n\n```diff\n--- original\n+++ repaired\n-a\n+b\n```"
    ));
    assert!(report.contains("## No Changes Needed\n\n- probes"));
    assert!(report.contains("## Errors\n\n### ratios\n\n```\nmissing alpha or beta artifacts\n```"));
}

#[test]
fn empty_run_report_has_only_summary() {
    let dir = tempdir().expect("tmp");
    let path = write_report(dir.path(), &[]).expect("report");
    assert_eq!(path, dir.path().join(REPORT_FILE_NAME));
    let text = fs::read_to_string(path).expect("read");
    assert!(text.contains("| Repaired | 0 |"));
    assert!(!text.contains("## Errors"));
    assert!(!text.contains("## Repaired Tasks"));
}
