//! Worker runtime
//!
//! Collects subscriptions and runs one poller task per subscribed task type
//! until shutdown is requested.

use std::sync::Arc;
use tether_client::Broker;
use tether_core::domain::TaskType;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::handler::JobHandler;
use crate::registry::HandlerRegistry;
use crate::scheduler::Poller;
use crate::service::{CompletionReporter, Dispatcher};

/// Job worker for one broker connection
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tether_client::BrokerClient;
/// use tether_core::domain::{HandlerResult, Job};
/// use tether_worker::{Worker, WorkerConfig};
/// use tokio_util::sync::CancellationToken;
///
/// async fn ship(_job: Job) -> anyhow::Result<HandlerResult> {
///     Ok(HandlerResult::from(serde_json::json!({ "shipped": true })))
/// }
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut worker = Worker::new(Arc::new(BrokerClient::new("http://localhost:8080")));
/// worker.subscribe("ship-order", ship, WorkerConfig::new("ship-order", "worker-1"))?;
///
/// let shutdown = CancellationToken::new();
/// worker.run(shutdown).await?;
/// # Ok(())
/// # }
/// ```
pub struct Worker {
    broker: Arc<dyn Broker>,
    registry: HandlerRegistry,
}

impl Worker {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            registry: HandlerRegistry::new(),
        }
    }

    /// Registers `handler` for jobs of `task_type`
    ///
    /// # Errors
    /// Fails if `config` is for a different task type or does not validate,
    /// or if the task type is already subscribed
    pub fn subscribe<H: JobHandler>(
        &mut self,
        task_type: impl Into<TaskType>,
        handler: H,
        config: WorkerConfig,
    ) -> Result<()> {
        let task_type = task_type.into();
        if config.task_type != task_type {
            return Err(WorkerError::InvalidConfig(format!(
                "config is for task type '{}', not '{}'",
                config.task_type, task_type
            )));
        }

        self.registry.register(config, handler)?;
        info!("Subscribed to '{}'", task_type);
        Ok(())
    }

    /// Returns a reporter for handlers that complete jobs themselves
    pub fn reporter(&self) -> CompletionReporter {
        CompletionReporter::new(Arc::clone(&self.broker))
    }

    pub fn subscriptions(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Runs all pollers until `shutdown` is cancelled
    ///
    /// Returns once every poller has stopped and every job it activated has
    /// been reported.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        if self.registry.is_empty() {
            return Err(WorkerError::NoSubscriptions);
        }

        let configs: Vec<Arc<WorkerConfig>> = self
            .registry
            .iter()
            .map(|(_, subscription)| Arc::clone(&subscription.config))
            .collect();

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(self.registry)));

        let handles: Vec<_> = configs
            .into_iter()
            .map(|config| {
                let task_type = config.task_type.clone();
                let poller = Poller::new(config, Arc::clone(&self.broker), Arc::clone(&dispatcher));
                (task_type, tokio::spawn(poller.run(shutdown.clone())))
            })
            .collect();

        info!("Worker running {} poller(s)", handles.len());

        let mut failure = None;
        for (task_type, handle) in handles {
            if let Err(e) = handle.await {
                error!("Poller for '{}' panicked: {}", task_type, e);
                failure.get_or_insert(WorkerError::Poller {
                    task_type,
                    message: e.to_string(),
                });
            }
        }

        info!("Worker stopped");
        failure.map_or(Ok(()), Err)
    }
}
