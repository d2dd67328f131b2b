//! Worker configuration
//!
//! Defines the broker connection settings and the per-subscription polling
//! parameters: long-poll and request timeouts, batch size, backoff and
//! completion mode.

use std::time::Duration;
use tether_core::domain::TaskType;
use tokio::sync::Semaphore;

use crate::error::{Result, WorkerError};

/// How many jobs of one subscription may run at the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// Every activated job gets its own task; in-flight jobs are bounded only
    /// by the batch size of each poll
    Unbounded,
    /// At most this many jobs in flight; the poller waits for a free slot
    /// before asking for more work
    Bounded(usize),
}

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Broker base URL (e.g., "http://localhost:8080")
    pub broker_url: String,

    /// Identifies this worker instance to the broker
    pub worker_name: String,
}

impl BrokerSettings {
    pub fn new(broker_url: impl Into<String>, worker_name: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            worker_name: worker_name.into(),
        }
    }

    /// Creates settings from environment variables
    ///
    /// Expected environment variables:
    /// - BROKER_URL (optional, default: http://localhost:8080)
    /// - WORKER_NAME (optional, default: generated)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            broker_url: lookup("BROKER_URL").unwrap_or(defaults.broker_url),
            worker_name: lookup("WORKER_NAME").unwrap_or(defaults.worker_name),
        }
    }

    /// Validates the settings
    pub fn validate(&self) -> Result<()> {
        if self.worker_name.trim().is_empty() {
            return Err(invalid("worker_name cannot be empty"));
        }

        if self.broker_url.is_empty() {
            return Err(invalid("broker_url cannot be empty"));
        }

        if !self.broker_url.starts_with("http://") && !self.broker_url.starts_with("https://") {
            return Err(invalid("broker_url must start with http:// or https://"));
        }

        Ok(())
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self::new("http://localhost:8080", default_worker_name())
    }
}

/// Generates a worker name unique to this process
pub fn default_worker_name() -> String {
    format!("tether-worker-{}", uuid::Uuid::new_v4())
}

/// Configuration of one task-type subscription
///
/// Built once when subscribing and never changed afterwards; the worker keeps
/// it behind an `Arc` for the lifetime of the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Task type to poll for
    pub task_type: TaskType,

    /// Identifies this worker instance to the broker
    pub worker_name: String,

    /// How long the broker may hold a long-poll open
    pub poll_timeout: Duration,

    /// How long the client waits for a whole activate call
    pub request_timeout: Duration,

    /// Upper bound on jobs requested by a single poll
    pub max_jobs_per_poll: u32,

    /// Pause before the next poll after a recoverable broker failure
    pub backoff_interval: Duration,

    /// Report completion automatically when a handler returns normally
    pub autocomplete: bool,

    /// Per-subscription limit on jobs in flight
    pub concurrency: Concurrency,
}

impl WorkerConfig {
    /// Creates a subscription configuration with defaults
    pub fn new(task_type: impl Into<TaskType>, worker_name: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            worker_name: worker_name.into(),
            poll_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            max_jobs_per_poll: 32,
            backoff_interval: Duration::from_secs(5),
            autocomplete: true,
            concurrency: Concurrency::Unbounded,
        }
    }

    /// Creates configuration with overrides from environment variables
    ///
    /// Optional environment variables:
    /// - POLL_TIMEOUT_MS (default: 10000)
    /// - REQUEST_TIMEOUT_MS (default: 15000)
    /// - MAX_JOBS_PER_POLL (default: 32)
    /// - BACKOFF_INTERVAL_MS (default: 5000)
    /// - AUTOCOMPLETE (true/false, default: true)
    /// - MAX_CONCURRENT_JOBS (unset: unbounded)
    pub fn from_env(task_type: impl Into<TaskType>, worker_name: impl Into<String>) -> Self {
        Self::from_lookup(task_type, worker_name, |key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(
        task_type: impl Into<TaskType>,
        worker_name: impl Into<String>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(task_type, worker_name);
        let millis = |key: &str| {
            lookup(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        if let Some(poll_timeout) = millis("POLL_TIMEOUT_MS") {
            config.poll_timeout = poll_timeout;
        }

        if let Some(request_timeout) = millis("REQUEST_TIMEOUT_MS") {
            config.request_timeout = request_timeout;
        }

        if let Some(backoff_interval) = millis("BACKOFF_INTERVAL_MS") {
            config.backoff_interval = backoff_interval;
        }

        if let Some(max_jobs) = lookup("MAX_JOBS_PER_POLL").and_then(|s| s.parse::<u32>().ok()) {
            config.max_jobs_per_poll = max_jobs;
        }

        if let Some(autocomplete) = lookup("AUTOCOMPLETE").and_then(|s| s.parse::<bool>().ok()) {
            config.autocomplete = autocomplete;
        }

        if let Some(limit) = lookup("MAX_CONCURRENT_JOBS").and_then(|s| s.parse::<usize>().ok()) {
            config.concurrency = Concurrency::Bounded(limit);
        }

        config
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_max_jobs_per_poll(mut self, max_jobs_per_poll: u32) -> Self {
        self.max_jobs_per_poll = max_jobs_per_poll;
        self
    }

    pub fn with_backoff_interval(mut self, backoff_interval: Duration) -> Self {
        self.backoff_interval = backoff_interval;
        self
    }

    pub fn with_autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.task_type.is_empty() {
            return Err(invalid("task_type cannot be empty"));
        }

        if self.worker_name.trim().is_empty() {
            return Err(invalid("worker_name cannot be empty"));
        }

        if self.max_jobs_per_poll == 0 {
            return Err(invalid("max_jobs_per_poll must be greater than 0"));
        }

        if self.poll_timeout.is_zero() {
            return Err(invalid("poll_timeout must be greater than 0"));
        }

        if self.request_timeout < self.poll_timeout {
            return Err(invalid("request_timeout must not be shorter than poll_timeout"));
        }

        match self.concurrency {
            Concurrency::Bounded(0) => {
                return Err(invalid("bounded concurrency must allow at least one job"));
            }
            Concurrency::Bounded(limit) if limit > Semaphore::MAX_PERMITS => {
                return Err(WorkerError::InvalidConfig(format!(
                    "bounded concurrency cannot exceed {} jobs",
                    Semaphore::MAX_PERMITS
                )));
            }
            _ => {}
        }

        Ok(())
    }
}

fn invalid(message: &str) -> WorkerError {
    WorkerError::InvalidConfig(message.to_string())
}
