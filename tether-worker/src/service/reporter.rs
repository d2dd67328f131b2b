//! Completion reporter
//!
//! Turns a job outcome into the matching broker acknowledgment. A failed
//! acknowledgment is logged and dropped: it is not retried, so the broker may
//! time the job out and deliver it again. An acknowledgment that gets no
//! answer within the ack timeout counts as failed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tether_client::{Broker, BrokerError};
use tether_core::domain::{JobKey, JobOutcome, Variables};
use tracing::{debug, error};

/// Sends completion and failure reports to the broker
///
/// Cheap to clone and safe to use from many jobs at once. Handlers running
/// with autocomplete disabled keep a clone to report out-of-band.
#[derive(Clone)]
pub struct CompletionReporter {
    broker: Arc<dyn Broker>,
    ack_timeout: Duration,
}

impl CompletionReporter {
    pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            ack_timeout: Self::DEFAULT_ACK_TIMEOUT,
        }
    }

    /// Sets how long a complete or fail call may take
    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    /// Reports a job as completed with its output variables
    pub async fn complete(&self, job_key: JobKey, variables: &Variables) -> tether_client::Result<()> {
        let variables = serde_json::to_string(variables)
            .map_err(|e| BrokerError::ParseError(format!("Failed to encode variables: {}", e)))?;

        self.bounded(self.broker.complete_job(job_key, variables)).await
    }

    /// Reports a job as failed
    pub async fn fail(
        &self,
        job_key: JobKey,
        error_message: impl Into<String>,
    ) -> tether_client::Result<()> {
        self.bounded(self.broker.fail_job(job_key, error_message.into()))
            .await
    }

    async fn bounded<F>(&self, ack: F) -> tether_client::Result<()>
    where
        F: Future<Output = tether_client::Result<()>>,
    {
        tokio::time::timeout(self.ack_timeout, ack)
            .await
            .map_err(|_| {
                BrokerError::DeadlineExceeded(format!("no ack within {:?}", self.ack_timeout))
            })?
    }

    /// Sends the acknowledgment for an outcome
    ///
    /// Returns whether the broker accepted it. Either way the job counts as
    /// reported.
    pub async fn report(&self, outcome: JobOutcome) -> bool {
        let job_key = outcome.job_key();

        let result = match outcome {
            JobOutcome::Completed {
                job_key,
                output_variables,
            } => self.complete(job_key, &output_variables).await,
            JobOutcome::Failed {
                job_key,
                error_message,
            } => self.fail(job_key, error_message).await,
        };

        match result {
            Ok(()) => {
                debug!("Reported outcome of job {}", job_key);
                true
            }
            Err(e) => {
                error!(
                    "Failed to report outcome of job {} ({}); the broker may redeliver it: {}",
                    job_key,
                    e.class(),
                    e
                );
                false
            }
        }
    }
}
