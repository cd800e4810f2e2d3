// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use gatekeeper_taskgen_model::{
    Classification, SuiteDefinition, SuiteTest, TaskCase, TaskMetadata, SUITE_FILE_NAME,
};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::SuiteError;

/// A suite test that did not become a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedTest {
    pub task_id: String,
    pub suite_name: String,
    pub test_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSuites {
    pub tasks: BTreeMap<String, TaskMetadata>,
    pub rejected: Vec<RejectedTest>,
    pub suite_files: usize,
}

/// Every `suite.yaml` under `root`, in sorted path order.
#[must_use]
pub fn discover_suite_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == SUITE_FILE_NAME)
        .map(walkdir::DirEntry::into_path)
        .collect()
}

struct LoadedSuite {
    name: String,
    dir: PathBuf,
    definition: SuiteDefinition,
}

fn load_suite(path: &Path) -> Option<LoadedSuite> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            debug!(file = %path.display(), error = %err, "suite unreadable; skipped");
            return None;
        }
    };
    let definition: SuiteDefinition = match serde_yaml::from_str(&text) {
        Ok(definition) => definition,
        Err(err) => {
            debug!(file = %path.display(), error = %err, "suite malformed; skipped");
            return None;
        }
    };
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = if definition.metadata.name.is_empty() {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        definition.metadata.name.clone()
    };
    Some(LoadedSuite {
        name,
        dir,
        definition,
    })
}

fn resolve_test(suite: &LoadedSuite, test: &SuiteTest) -> TaskMetadata {
    let cases = test
        .cases
        .iter()
        .filter(|case| !case.object.is_empty())
        .filter_map(|case| {
            let classification = Classification::of_assertions(&case.assertions)?;
            Some(TaskCase {
                name: case.name.clone(),
                classification,
                object_path: suite.dir.join(&case.object),
                inventory: case.inventory.iter().map(|p| suite.dir.join(p)).collect(),
            })
        })
        .collect();
    TaskMetadata {
        task_id: test.name.clone(),
        suite_name: suite.name.clone(),
        test_name: test.name.clone(),
        template_path: suite.dir.join(&test.template),
        constraint_path: suite.dir.join(&test.constraint),
        cases,
    }
}

/// Discovers, decodes and classifies every suite under `root`.
///
/// Malformed suites are skipped. A test name seen in more than one suite is
/// keyed `suite-test` for every occurrence.
pub fn parse_suites(root: &Path) -> Result<ParsedSuites, SuiteError> {
    let suites: Vec<LoadedSuite> = discover_suite_files(root)
        .iter()
        .filter_map(|path| load_suite(path))
        .collect();
    if suites.is_empty() {
        return Err(SuiteError::NoSuites(root.to_path_buf()));
    }

    let mut test_counts: HashMap<&str, usize> = HashMap::new();
    for suite in &suites {
        for test in &suite.definition.tests {
            *test_counts.entry(test.name.as_str()).or_default() += 1;
        }
    }

    let mut parsed = ParsedSuites {
        suite_files: suites.len(),
        ..ParsedSuites::default()
    };
    for suite in &suites {
        for test in &suite.definition.tests {
            let mut meta = resolve_test(suite, test);
            if test_counts.get(test.name.as_str()).copied().unwrap_or(0) > 1 {
                meta.task_id = format!("{}-{}", meta.suite_name, meta.test_name);
            }

            if !meta.has_both_classifications() {
                parsed.rejected.push(RejectedTest {
                    reason: format!(
                        "missing compliant or violating cases (compliant={} violating={})",
                        meta.count(Classification::Compliant),
                        meta.count(Classification::Violating)
                    ),
                    task_id: meta.task_id,
                    suite_name: meta.suite_name,
                    test_name: meta.test_name,
                });
                continue;
            }

            if parsed.tasks.contains_key(&meta.task_id) {
                warn!(task_id = %meta.task_id, suite = %suite.name, "duplicate task id; keeping first");
                parsed.rejected.push(RejectedTest {
                    reason: "duplicate task id".to_string(),
                    task_id: meta.task_id,
                    suite_name: meta.suite_name,
                    test_name: meta.test_name,
                });
                continue;
            }
            parsed.tasks.insert(meta.task_id.clone(), meta);
        }
    }
    Ok(parsed)
}
