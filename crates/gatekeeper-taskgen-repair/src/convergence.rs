// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use gatekeeper_taskgen_core::text::strip_code_fences;
use gatekeeper_taskgen_model::{RepairResult, RepairStatus};
use gatekeeper_taskgen_synth::{normalize_document, parse_documents, NormalizationGate};
use similar::TextDiff;

use crate::error::RepairError;
use crate::prompt::NO_CHANGES_SENTINEL;

/// Disposition of one candidate relative to the on-disk manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    pub status: RepairStatus,
    /// Text to persist (without trailing newline), if the file must change.
    pub write: Option<String>,
    pub diff: Option<String>,
}

fn normalized(text: &str, gate: NormalizationGate) -> String {
    if !gate.is_active() {
        return text.to_string();
    }
    normalize_document(text, gate).unwrap_or_else(|_| text.to_string())
}

#[must_use]
pub fn unified_diff(before: &str, after: &str) -> String {
    let before = format!("{}\n", before.trim_end());
    let after = format!("{}\n", after.trim_end());
    TextDiff::from_lines(&before, &after)
        .unified_diff()
        .context_radius(3)
        .header("original", "repaired")
        .to_string()
}

fn has_manifest_markers(text: &str) -> bool {
    text.contains("apiVersion:") || text.contains("kind:")
}

/// Decides what to do with `candidate` for the manifest whose on-disk text is
/// `original`. Both sides go through the same normalization gate before they
/// are compared.
pub fn converge(
    original: &str,
    candidate: &str,
    gate: NormalizationGate,
) -> Result<Convergence, RepairError> {
    let on_disk = original.trim();
    let baseline = normalized(on_disk, gate);
    let drift = (baseline != on_disk).then(|| baseline.clone());

    let cleaned = strip_code_fences(candidate);
    if cleaned.to_uppercase().contains(NO_CHANGES_SENTINEL) {
        return Ok(match drift {
            Some(content) => Convergence {
                status: RepairStatus::Repaired,
                diff: Some(unified_diff(on_disk, &content)),
                write: Some(content),
            },
            None => Convergence {
                status: RepairStatus::NoChanges,
                write: None,
                diff: None,
            },
        });
    }

    if !has_manifest_markers(&cleaned) {
        return Err(RepairError::MissingManifest);
    }
    parse_documents(&cleaned).map_err(RepairError::InvalidCandidate)?;

    let repaired = normalized(cleaned.trim(), gate);
    if repaired == baseline {
        return Ok(Convergence {
            status: RepairStatus::NoChanges,
            write: drift,
            diff: None,
        });
    }
    Ok(Convergence {
        status: RepairStatus::Repaired,
        diff: Some(unified_diff(&baseline, &repaired)),
        write: Some(repaired),
    })
}

/// Runs [`converge`] and persists the outcome, turning every failure into an
/// `error` result for the manifest.
pub fn apply_candidate(
    task_id: &str,
    path: &Path,
    original: &str,
    candidate: &str,
    gate: NormalizationGate,
) -> RepairResult {
    let outcome = converge(original, candidate, gate).and_then(|convergence| {
        if let Some(content) = &convergence.write {
            fs::write(path, format!("{content}\n")).map_err(|e| RepairError::io(path, e))?;
        }
        Ok(convergence)
    });
    match outcome {
        Ok(Convergence {
            status: RepairStatus::Repaired,
            diff,
            ..
        }) => RepairResult::repaired(task_id, path.to_path_buf(), diff),
        Ok(_) => RepairResult::no_changes(task_id, path.to_path_buf()),
        Err(err) => RepairResult::error(task_id, Some(path.to_path_buf()), err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: resource-001\nspec:\n  containers:\n  - name: c\n    image: nginx\n    resources:\n      limits:\n        cpu: 1m";

    const OFF: NormalizationGate = NormalizationGate {
        resources: false,
        replicas: false,
    };

    #[test]
    fn sentinel_without_drift_is_no_change() {
        let out = converge(MINIMAL, "NO_CHANGES", OFF).expect("converge");
        assert_eq!(out.status, RepairStatus::NoChanges);
        assert!(out.write.is_none());
    }

    #[test]
    fn sentinel_is_case_insensitive_and_fenced() {
        let out = converge(MINIMAL, "```\nno_changes\n```", OFF).expect("converge");
        assert_eq!(out.status, RepairStatus::NoChanges);
    }

    #[test]
    fn prose_without_markers_is_rejected() {
        let err =
            converge(MINIMAL, "I could not help", NormalizationGate::ALL).expect_err("no yaml");
        assert_eq!(err.to_string(), "repair output missing manifest YAML");
    }

    #[test]
    fn invalid_yaml_candidate_is_rejected() {
        let err =
            converge(MINIMAL, "kind: [unclosed", NormalizationGate::ALL).expect_err("bad yaml");
        assert!(matches!(err, RepairError::InvalidCandidate(_)));
    }

    #[test]
    fn inactive_gate_compares_trimmed_text() {
        let out = converge(&format!("{MINIMAL}\n\n"), MINIMAL, OFF).expect("converge");
        assert_eq!(out.status, RepairStatus::NoChanges);
        assert!(out.write.is_none());
    }

    #[test]
    fn diff_has_headers_and_hunks() {
        let diff = unified_diff("a: 1\nb: 2", "a: 1\nb: 3");
        assert!(diff.starts_with("--- original\n+++ repaired\n"));
        assert!(diff.contains("-b: 2\n+b: 3\n"));
    }
}
