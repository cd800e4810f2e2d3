// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! `gatekeeper-taskgen`: turns Gatekeeper library suites into benchmark task
//! bundles, optionally verifying and repairing them.

mod config;
mod error;
mod gemini;
mod pipeline;
mod verify;

use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

use clap::Parser;
use gatekeeper_taskgen_core::{
    ExitCode, TextGenerator, ENV_GEMINI_API_KEY, ENV_TASKGEN_LOG_LEVEL,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const CRATE_NAME: &str = "gatekeeper-taskgen-cli";

pub use config::{
    Cli, GeneratorConfig, DEFAULT_LIBRARY_ROOT, DEFAULT_OUTPUT_DIR, DEFAULT_SKIP_LIST,
};
pub use error::CliError;
pub use gemini::{GeminiClient, GEMINI_ENDPOINT};
pub use pipeline::{generate_all, repair_jobs, run_pipeline, run_repair, GenerationSummary};
pub use verify::{verify_tasks, VerifySummary};

fn log_filter(verbose: bool) -> EnvFilter {
    match std::env::var(ENV_TASKGEN_LOG_LEVEL) {
        Ok(level) if !level.trim().is_empty() => {
            EnvFilter::try_new(level.trim()).unwrap_or_else(|_| EnvFilter::new("info"))
        }
        _ if verbose => EnvFilter::new("debug"),
        _ => EnvFilter::new("info"),
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = log_filter(verbose);
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = installed {
        eprintln!("logging already initialized: {err}");
    }
}

fn text_generator(config: &GeneratorConfig) -> Result<Option<Arc<dyn TextGenerator>>, CliError> {
    let Some(api_key) = config.api_key.as_deref() else {
        return Ok(None);
    };
    let client = GeminiClient::new(api_key, config.request_timeout)
        .map_err(|e| CliError::Client(e.to_string()))?;
    tracing::info!("Gemini client initialized");
    let generator: Arc<dyn TextGenerator> = Arc::new(client);
    Ok(Some(generator))
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    init_tracing(cli.verbose, cli.json_logs);
    let config = GeneratorConfig::from_cli(cli, std::env::var(ENV_GEMINI_API_KEY).ok());
    if config.api_key.is_none() && !config.verify_only {
        return Err(CliError::MissingApiKey);
    }
    let generator = text_generator(&config)?;
    pipeline::run_pipeline(&config, generator)
}

pub fn main_entry() -> ProcessExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            eprintln!("{err}");
            tracing::error!(exit = err.exit_code().as_str(), error = %err, "run failed");
            ProcessExitCode::from(err.exit_code() as u8)
        }
    }
}
