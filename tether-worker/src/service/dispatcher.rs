//! Job dispatcher
//!
//! Runs the registered handler for each activated job on its own task and
//! turns whatever happens there, return value, error or panic, into exactly
//! one job outcome.

use std::any::Any;
use std::sync::Arc;
use tether_core::domain::{Job, JobKey, JobOutcome, JobState};
use tether_core::dto::job::ActivatedJob;
use tracing::{debug, warn};

use crate::registry::HandlerRegistry;
use crate::service::reporter::CompletionReporter;

/// Invokes handlers and produces job outcomes
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Runs one job to its outcome
    ///
    /// Never fails: an undecodable payload, an unknown task type, a handler
    /// error and a handler panic all become `JobOutcome::Failed`.
    pub async fn dispatch(&self, job: ActivatedJob) -> JobOutcome {
        let job_key = job.key;

        let Some(subscription) = self.registry.get(job.task_type.as_str()) else {
            return JobOutcome::failed(
                job_key,
                format!("No handler registered for task type '{}'", job.task_type),
            );
        };

        let job = match Job::try_from(job) {
            Ok(job) => job,
            Err(e) => {
                return JobOutcome::failed(job_key, format!("Invalid job variables: {}", e));
            }
        };

        transition(job_key, JobState::Activated, JobState::Dispatched);

        // Separate task so a panic stays inside this job
        let handler = Arc::clone(&subscription.handler);
        let task = tokio::spawn(async move { handler.handle(job).await });

        match task.await {
            Ok(Ok(result)) => JobOutcome::completed(job_key, result.into_variables()),
            Ok(Err(e)) => JobOutcome::failed(job_key, format!("{:?}", e)),
            Err(e) if e.is_panic() => JobOutcome::failed(
                job_key,
                format!("Handler panicked: {}", panic_message(e.into_panic())),
            ),
            Err(e) => JobOutcome::failed(job_key, format!("Handler task was cancelled: {}", e)),
        }
    }

    /// Dispatches a job and reports its outcome
    ///
    /// With autocomplete disabled a successful outcome is left for the handler
    /// to report; failures are reported regardless.
    pub async fn process(&self, job: ActivatedJob, reporter: &CompletionReporter) {
        let autocomplete = self
            .registry
            .get(job.task_type.as_str())
            .is_none_or(|s| s.config.autocomplete);

        let outcome = self.dispatch(job).await;
        let job_key = outcome.job_key();
        let state = outcome.state();

        match &outcome {
            JobOutcome::Completed { .. } => debug!("Job {} completed", job_key),
            JobOutcome::Failed { error_message, .. } => {
                warn!("Job {} failed: {}", job_key, error_message)
            }
        }

        if outcome.is_completed() && !autocomplete {
            debug!("Job {} left for the handler to complete", job_key);
            return;
        }

        reporter.report(outcome).await;
        transition(job_key, state, JobState::Reported);
    }
}

fn transition(job_key: JobKey, from: JobState, to: JobState) {
    debug_assert!(from.can_transition_to(to), "{:?} -> {:?}", from, to);
    debug!("Job {}: {:?} -> {:?}", job_key, from, to);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
