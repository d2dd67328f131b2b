//! Tether Worker
//!
//! Standalone worker process. It subscribes an `echo` handler, which
//! completes every job with its own variables, to the given task types.
//! Useful for smoke-testing a broker deployment.
//!
//! Broker settings and polling parameters are read from the environment (see
//! `BrokerSettings::from_env` and `WorkerConfig::from_env`); command-line
//! flags override the broker settings. Ctrl-C stops polling and waits for in-flight
//! jobs to be reported.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tether_client::BrokerClient;
use tether_core::domain::{HandlerResult, Job};
use tether_worker::{BrokerSettings, Worker, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "tether-worker", about = "Long-poll job worker")]
struct Args {
    /// Broker base URL (default: BROKER_URL or http://localhost:8080)
    #[arg(long)]
    broker_url: Option<String>,

    /// Name this worker reports to the broker (default: WORKER_NAME or generated)
    #[arg(long)]
    worker_name: Option<String>,

    /// Task type to subscribe to; repeat or comma-separate for several
    #[arg(long = "task-type", env = "TASK_TYPES", value_delimiter = ',', required = true)]
    task_types: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether_worker=info,tether_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut settings = BrokerSettings::from_env();
    if let Some(broker_url) = args.broker_url {
        settings.broker_url = broker_url;
    }
    if let Some(worker_name) = args.worker_name {
        settings.worker_name = worker_name;
    }
    settings.validate().context("Invalid broker settings")?;

    info!(
        "Starting Tether worker {} against {}",
        settings.worker_name, settings.broker_url
    );

    let client = Arc::new(BrokerClient::new(settings.broker_url.clone()));
    let mut worker = Worker::new(client);

    for task_type in args.task_types {
        let config = WorkerConfig::from_env(task_type.as_str(), settings.worker_name.clone());
        worker
            .subscribe(task_type.as_str(), echo, config)
            .with_context(|| format!("Failed to subscribe to '{}'", task_type))?;
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C, worker can only be killed: {}", e);
            return;
        }
        info!("Shutdown requested");
        signal.cancel();
    });

    worker.run(shutdown).await.context("Worker failed")?;

    Ok(())
}

/// Completes the job with its input variables
async fn echo(job: Job) -> anyhow::Result<HandlerResult> {
    Ok(HandlerResult::from(job.variables))
}
