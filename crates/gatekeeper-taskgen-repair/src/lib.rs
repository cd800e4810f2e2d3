// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Repair stage: one model-driven edit attempt per generated manifest,
//! convergence against the normalized original, and the repair report.

mod convergence;
mod error;
mod pool;
mod prompt;
mod report;
mod task;

pub const CRATE_NAME: &str = "gatekeeper-taskgen-repair";

pub use convergence::{apply_candidate, converge, unified_diff, Convergence};
pub use error::RepairError;
pub use pool::{repair_all, RepairJob, RepairSettings, DEFAULT_REPAIR_CONCURRENCY};
pub use prompt::{
    render_repair_prompt, role_label, RepairPrompt, DEFAULT_REPAIR_MODEL, NO_CHANGES_SENTINEL,
    REPAIR_SECTION_LIMIT,
};
pub use report::{render_report, summarize, write_report, RepairSummary, REPORT_FILE_NAME};
pub use task::{find_targets, repair_task, RepairTargets};
