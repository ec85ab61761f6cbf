use anyhow::{Context, Result};
use clap::Parser;
use specdoc::config::{load_providers, resolve_provider, RunSettings};
use specdoc::llm::ProviderClient;
use specdoc::runner::BatchRunner;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "specdoc",
    about = "Re-run AI documentation for test files that failed in an earlier pass",
    version
)]
struct Cli {
    /// Provider slot to use; reads its key from AI_API_KEY_<BATCH_INDEX>
    batch_index: u32,

    /// Newline-delimited list of test file paths to retry
    #[arg(long, env = "SPECDOC_FAILED_LIST", default_value = "failed-tests.txt")]
    failed_list: PathBuf,

    /// Markdown prompt template placed ahead of each test file
    #[arg(long, env = "SPECDOC_TEMPLATE", default_value = "docs/test-doc-template.md")]
    template: PathBuf,

    /// Directory for reports, progress logs and remaining-failure lists
    #[arg(long, env = "SPECDOC_OUTPUT_DIR", default_value = "docs/generated")]
    output_dir: PathBuf,

    /// Pause between provider requests, in seconds
    #[arg(long, env = "SPECDOC_DELAY_SECS", default_value_t = 60)]
    delay_secs: u64,

    /// Hard limit on each provider request, in seconds
    #[arg(long, env = "SPECDOC_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Skip files already recorded in this batch's progress log
    #[arg(long, env = "SPECDOC_RESUME")]
    resume: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "SPECDOC_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn settings(&self) -> RunSettings {
        RunSettings {
            failed_list: self.failed_list.clone(),
            template: self.template.clone(),
            output_dir: self.output_dir.clone(),
            delay: Duration::from_secs(self.delay_secs),
            request_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            resume: self.resume,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let provider = resolve_provider(&load_providers(&env), cli.batch_index)?;
    info!(
        "Using {} ({}, model {})",
        provider.name,
        provider.kind.as_str(),
        provider.model
    );

    let client = ProviderClient::from_descriptor(&provider)
        .context("Failed to build HTTP client")?;
    let runner = BatchRunner::new(client, provider.name.clone(), cli.batch_index, cli.settings());
    runner.run().await?;
    Ok(())
}
