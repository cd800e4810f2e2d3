// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;
use std::process::Command;

use gatekeeper_taskgen_core::text::indent;
use gatekeeper_taskgen_model::SUITE_FILE_NAME;

use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifySummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Task ids whose suite failed, in visit order.
    pub failures: Vec<String>,
}

impl VerifySummary {
    pub fn into_result(self) -> Result<Self, CliError> {
        if self.failed > 0 {
            return Err(CliError::Verification {
                failed: self.failed,
            });
        }
        Ok(self)
    }
}

/// Runs `<gator> verify <task>/suite.yaml` for every task directory under
/// `output_dir`, in sorted order. Directories without a suite are skipped.
pub fn verify_tasks(output_dir: &Path, gator: &str) -> Result<VerifySummary, CliError> {
    let entries = fs::read_dir(output_dir).map_err(|e| CliError::io(output_dir, e))?;
    let mut task_dirs: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    task_dirs.sort();

    println!("\nVerifying tasks with gator...");
    let mut summary = VerifySummary::default();
    for task_dir in task_dirs {
        let task_id = task_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suite = task_dir.join(SUITE_FILE_NAME);
        if !suite.is_file() {
            summary.skipped += 1;
            continue;
        }
        match Command::new(gator).arg("verify").arg(&suite).output() {
            Ok(output) if output.status.success() => {
                println!("Verifying {task_id}... OK");
                summary.passed += 1;
            }
            Ok(output) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                report_failure(&task_id, &output.status.to_string(), &combined);
                summary.failed += 1;
                summary.failures.push(task_id);
            }
            Err(err) => {
                report_failure(&task_id, &err.to_string(), "");
                summary.failed += 1;
                summary.failures.push(task_id);
            }
        }
    }
    println!(
        "\nVerification Complete: {} passed, {} failed, {} skipped",
        summary.passed, summary.failed, summary.skipped
    );
    Ok(summary)
}

fn report_failure(task_id: &str, cause: &str, output: &str) {
    println!("Verifying {task_id}... FAILED");
    println!("  Error: {cause}");
    println!("  Output:");
    println!("{}", indent(output.trim_end(), "    "));
    tracing::warn!(task_id, error = cause, "gator verify failed");
}
