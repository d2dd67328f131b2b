//! Broker abstraction
//!
//! The worker only ever talks to the broker through this trait, so tests and
//! alternative transports can stand in for the HTTP client.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tether_core::domain::job::JobKey;
use tether_core::dto::job::{ActivateJobsRequest, JobBatch};

use crate::error::Result;

/// Response chunks of one activate-jobs call
///
/// The stream ends when the broker closes the call. An item error ends the
/// call as well; batches received before it are still valid.
pub type JobBatchStream = BoxStream<'static, Result<JobBatch>>;

/// RPC surface of the job broker
///
/// Implementations must be safe to share: the poller and every in-flight job
/// use the same instance concurrently.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Opens a long-poll for jobs of one task type
    ///
    /// # Arguments
    /// * `request` - Task type, worker identity, timeouts and batch cap
    ///
    /// # Returns
    /// The stream of job batches for this call
    async fn activate_jobs(&self, request: ActivateJobsRequest) -> Result<JobBatchStream>;

    /// Acknowledges a job as completed
    ///
    /// # Arguments
    /// * `job_key` - The job being completed
    /// * `variables` - Output variables as JSON object text
    async fn complete_job(&self, job_key: JobKey, variables: String) -> Result<()>;

    /// Acknowledges a job as failed
    ///
    /// # Arguments
    /// * `job_key` - The job that failed
    /// * `error_message` - Failure reason attached to the job
    async fn fail_job(&self, job_key: JobKey, error_message: String) -> Result<()>;
}
