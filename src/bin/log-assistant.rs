//! Standalone runner.
//!
//! Loads a JSON configuration, skips existing log history, runs one scan,
//! then scans periodically until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use log_assistant_core::config::AssistantConfig;
use log_assistant_core::logging::init_logger;
use log_assistant_core::pipeline::{LoggingSink, ScanEngine, ScanOutcome};
use log_assistant_core::trigger::PeriodicTrigger;

#[derive(Parser, Debug)]
#[command(name = "log-assistant", version, about = "Watch a Home Assistant log and diagnose new issues")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override the monitored log file
    #[arg(short, long, value_name = "PATH")]
    log_path: Option<PathBuf>,

    /// Analyze the whole file instead of only new lines
    #[arg(long)]
    from_start: bool,

    /// Run a single scan and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let mut config = AssistantConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(path) = args.log_path {
        config.log_path = path;
    }

    let engine = Arc::new(
        ScanEngine::from_config(&config, Arc::new(LoggingSink))
            .context("building scan engine")?,
    );
    if !args.from_start {
        engine.initialize();
    }

    let outcome = engine.scan().await;
    if let ScanOutcome::Completed(report) = &outcome {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    if args.once {
        println!("{}", serde_json::to_string_pretty(&engine.summary())?);
        return Ok(());
    }

    let trigger = PeriodicTrigger::start(Arc::clone(&engine), config.scan_interval());
    log::info!(
        "LOG_ASSISTANT_RUNNING path={} model={} interval_secs={}",
        config.log_path.display(),
        engine.analyzer().model_name(),
        config.scan_interval
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    trigger.shutdown().await;
    println!("{}", serde_json::to_string_pretty(&engine.summary())?);
    Ok(())
}
