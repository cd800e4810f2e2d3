// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gatekeeper_taskgen_model::TaskMetadata;
use gatekeeper_taskgen_repair::{DEFAULT_REPAIR_CONCURRENCY, DEFAULT_REPAIR_MODEL};
use gatekeeper_taskgen_synth::DEFAULT_PROMPT_MODEL;

/// Tests that are never generated: custom storage types and deprecated APIs.
pub const DEFAULT_SKIP_LIST: &[&str] = &[
    "storageclass",
    "storageclass-allowlist",
    "verifydeprecatedapi-1.16",
    "verifydeprecatedapi-1.22",
    "verifydeprecatedapi-1.25",
    "verifydeprecatedapi-1.26",
    "verifydeprecatedapi-1.27",
    "verifydeprecatedapi-1.29",
];

pub const DEFAULT_LIBRARY_ROOT: &str = ".gatekeeper-library/library/general";
pub const DEFAULT_OUTPUT_DIR: &str = "tasks/gatekeeper";

#[derive(Debug, Parser)]
#[command(name = "gatekeeper-taskgen")]
#[command(about = "Generate Kubernetes policy benchmark tasks from the Gatekeeper library")]
#[command(version)]
pub struct Cli {
    /// Path to the gatekeeper-library general directory.
    #[arg(long, default_value = DEFAULT_LIBRARY_ROOT)]
    pub library_root: PathBuf,
    /// Directory to write tasks into.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
    /// Test or suite name pattern to skip; repeatable.
    #[arg(long = "skip", value_name = "PATTERN")]
    pub skip: Vec<String>,
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
    /// Run gator verify on generated tasks.
    #[arg(long, default_value_t = false)]
    pub verify: bool,
    /// Run gator verify on existing tasks without generation.
    #[arg(long, default_value_t = false)]
    pub verify_only: bool,
    /// Run the repair stage on generated tasks.
    #[arg(long, default_value_t = false)]
    pub repair: bool,
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,
    #[arg(long, default_value_t = DEFAULT_REPAIR_CONCURRENCY)]
    pub repair_concurrency: usize,
    #[arg(long, default_value = DEFAULT_PROMPT_MODEL)]
    pub prompt_model: String,
    #[arg(long, default_value = DEFAULT_REPAIR_MODEL)]
    pub repair_model: String,
    #[arg(long, default_value_t = 120)]
    pub request_timeout_secs: u64,
    /// gator executable used for verification.
    #[arg(long, default_value = "gator")]
    pub gator: String,
}

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub library_root: PathBuf,
    pub output_dir: PathBuf,
    pub skip_list: Vec<String>,
    pub verbose: bool,
    pub verify: bool,
    pub verify_only: bool,
    pub repair: bool,
    pub repair_concurrency: usize,
    pub prompt_model: String,
    pub repair_model: String,
    pub request_timeout: Duration,
    pub gator: String,
    pub api_key: Option<String>,
}

impl GeneratorConfig {
    /// User skips come first, followed by [`DEFAULT_SKIP_LIST`].
    #[must_use]
    pub fn from_cli(cli: Cli, api_key: Option<String>) -> Self {
        let mut skip_list = cli.skip;
        skip_list.extend(DEFAULT_SKIP_LIST.iter().map(|s| (*s).to_string()));
        Self {
            library_root: cli.library_root,
            output_dir: cli.output_dir,
            skip_list,
            verbose: cli.verbose,
            verify: cli.verify,
            verify_only: cli.verify_only,
            repair: cli.repair,
            repair_concurrency: cli.repair_concurrency.max(1),
            prompt_model: cli.prompt_model,
            repair_model: cli.repair_model,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            gator: cli.gator,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// The matching skip pattern, if any.
    #[must_use]
    pub fn skip_reason(&self, task: &TaskMetadata) -> Option<&str> {
        self.skip_list
            .iter()
            .find(|pattern| {
                **pattern == task.test_name
                    || **pattern == task.suite_name
                    || task.test_name.contains(pattern.as_str())
            })
            .map(String::as_str)
    }

    #[must_use]
    pub fn should_skip(&self, task: &TaskMetadata) -> bool {
        self.skip_reason(task).is_some()
    }
}
