// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use gatekeeper_taskgen_model::{RepairResult, RepairStatus};

use crate::error::RepairError;

pub const REPORT_FILE_NAME: &str = "repair-report.md";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    pub repaired: usize,
    pub no_changes: usize,
    pub errors: usize,
}

#[must_use]
pub fn summarize(results: &[RepairResult]) -> RepairSummary {
    let mut summary = RepairSummary::default();
    for result in results {
        match result.status {
            RepairStatus::Repaired => summary.repaired += 1,
            RepairStatus::NoChanges => summary.no_changes += 1,
            RepairStatus::Error => summary.errors += 1,
        }
    }
    summary
}

fn file_of(result: &RepairResult) -> String {
    result
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[must_use]
pub fn render_report<Tz>(results: &[RepairResult], generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let summary = summarize(results);
    let mut out = String::from("# Gatekeeper Task Repair Report\n\n");
    let _ = write!(
        out,
        "Generated: {}\n\n## Summary\n\n| Status | Count |\n|--------|-------|\n| Repaired | {} |\n| No Changes | {} |\n| Errors | {} |\n\n---\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        summary.repaired,
        summary.no_changes,
        summary.errors
    );

    let with = |status: RepairStatus| results.iter().filter(move |r| r.status == status);

    if summary.repaired > 0 {
        out.push_str("## Repaired Tasks\n\n");
        for result in with(RepairStatus::Repaired) {
            let _ = write!(
                out,
                "### {}\n\n**File:** `{}`\n\n```diff\n{}\n```\n\n",
                result.task_id,
                file_of(result),
                result.diff.as_deref().unwrap_or_default().trim_end()
            );
        }
        out.push_str("---\n\n");
    }
    if summary.no_changes > 0 {
        out.push_str("## No Changes Needed\n\n");
        for result in with(RepairStatus::NoChanges) {
            let _ = writeln!(out, "- {} (`{}`)", result.task_id, file_of(result));
        }
        out.push_str("\n---\n\n");
    }
    if summary.errors > 0 {
        out.push_str("## Errors\n\n");
        for result in with(RepairStatus::Error) {
            let _ = write!(
                out,
                "### {}\n\n```\n{}\n```\n\n",
                result.task_id,
                result.error.as_deref().unwrap_or_default()
            );
        }
    }
    out
}

pub fn write_report(output_dir: &Path, results: &[RepairResult]) -> Result<PathBuf, RepairError> {
    let path = output_dir.join(REPORT_FILE_NAME);
    fs::write(&path, render_report(results, &Local::now())).map_err(|e| RepairError::io(&path, e))?;
    Ok(path)
}
