//! Job poller
//!
//! Long-polls the broker for jobs of one task type and dispatches them.
//! Each job runs in its own task; the poller goes straight back to polling
//! without waiting for the jobs it handed off.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tether_client::{Broker, BrokerError, ErrorClass};
use tether_core::dto::job::{ActivateJobsRequest, ActivatedJob};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::backoff::{RetryDecision, RetryPolicy};
use crate::config::{Concurrency, WorkerConfig};
use crate::service::{CompletionReporter, Dispatcher};

/// Polling loop for a single subscription
pub struct Poller {
    config: Arc<WorkerConfig>,
    broker: Arc<dyn Broker>,
    dispatcher: Arc<Dispatcher>,
    reporter: CompletionReporter,
    policy: RetryPolicy,
    slots: Option<Arc<Semaphore>>,
}

impl Poller {
    /// Creates a poller for the subscription described by `config`
    pub fn new(
        config: Arc<WorkerConfig>,
        broker: Arc<dyn Broker>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let slots = match config.concurrency {
            Concurrency::Unbounded => None,
            Concurrency::Bounded(limit) => Some(Arc::new(Semaphore::new(limit))),
        };

        Self {
            reporter: CompletionReporter::new(Arc::clone(&broker))
                .with_ack_timeout(config.request_timeout),
            policy: RetryPolicy::new(config.backoff_interval),
            config,
            broker,
            dispatcher,
            slots,
        }
    }

    /// Polls until `shutdown` is cancelled
    ///
    /// Broker failures never end the loop. After shutdown no new work is
    /// requested, and jobs already activated still run to their report before
    /// this returns.
    pub async fn run(self, shutdown: CancellationToken) {
        let task_type = &self.config.task_type;
        info!(
            "Starting poller for '{}' (poll timeout: {:?}, max {} job(s) per poll)",
            task_type, self.config.poll_timeout, self.config.max_jobs_per_poll
        );

        let mut in_flight = JoinSet::new();

        loop {
            reap_finished(&mut in_flight);

            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.poll_once(&mut in_flight) => result,
            };

            let decision = match result {
                Ok(0) => {
                    debug!("No '{}' jobs available", task_type);
                    RetryDecision::Immediate
                }
                Ok(activated) => {
                    info!("Activated {} '{}' job(s)", activated, task_type);
                    RetryDecision::Immediate
                }
                Err(e) => self.on_poll_error(&e),
            };

            if let RetryDecision::Backoff(delay) = decision {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = time::sleep(delay) => {}
                }
            }
        }

        info!(
            "Poller for '{}' stopping, waiting for {} in-flight job(s)",
            task_type,
            in_flight.len()
        );
        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                warn!("Job task panicked: {}", e);
            }
        }
        info!("Poller for '{}' stopped", task_type);
    }

    /// Performs a single activate-jobs call
    ///
    /// Drains every batch of the call and spawns a task per job. Jobs from
    /// batches that arrived before an error are dispatched all the same.
    ///
    /// # Returns
    /// The number of jobs activated by this call
    pub async fn poll_once(&self, in_flight: &mut JoinSet<()>) -> Result<usize, BrokerError> {
        let request = ActivateJobsRequest::new(
            self.config.task_type.clone(),
            self.config.worker_name.clone(),
            self.config.poll_timeout,
            self.config.request_timeout,
            self.request_size().await,
        );

        let request_timeout = self.config.request_timeout;
        let deadline = Instant::now() + request_timeout;

        let mut batches = time::timeout_at(deadline, self.broker.activate_jobs(request))
            .await
            .map_err(|_| timed_out(request_timeout))??;

        let mut activated = 0;
        while let Some(batch) = time::timeout_at(deadline, batches.next())
            .await
            .map_err(|_| timed_out(request_timeout))?
        {
            for job in batch?.jobs {
                self.spawn_job(job, in_flight);
                activated += 1;
            }
        }

        Ok(activated)
    }

    /// Number of jobs to ask for in the next poll
    ///
    /// With bounded concurrency this waits for a free slot and never asks for
    /// more jobs than there are free slots.
    async fn request_size(&self) -> u32 {
        let Some(slots) = &self.slots else {
            return self.config.max_jobs_per_poll;
        };

        if let Ok(permit) = slots.acquire().await {
            drop(permit);
        }

        let free = u32::try_from(slots.available_permits()).unwrap_or(u32::MAX);
        self.config.max_jobs_per_poll.min(free).max(1)
    }

    fn spawn_job(&self, job: ActivatedJob, in_flight: &mut JoinSet<()>) {
        let span = info_span!(
            "job",
            task_type = %job.task_type,
            job_key = %job.key,
            instance_key = job.instance_key
        );
        let dispatcher = Arc::clone(&self.dispatcher);
        let reporter = self.reporter.clone();
        let reserved = self.slots.as_ref().map(|slots| {
            Arc::clone(slots)
                .try_acquire_owned()
                .map_err(|_| Arc::clone(slots))
        });

        debug!("Dispatching job {}", job.key);

        in_flight.spawn(
            async move {
                // Held until the job is reported
                let _permit = match reserved {
                    Some(Ok(permit)) => Some(permit),
                    // Broker sent more jobs than requested
                    Some(Err(slots)) => slots.acquire_owned().await.ok(),
                    None => None,
                };
                dispatcher.process(job, &reporter).await;
            }
            .instrument(span),
        );
    }

    fn on_poll_error(&self, e: &BrokerError) -> RetryDecision {
        let task_type = &self.config.task_type;
        let decision = self.policy.decide(e.class());

        match e.class() {
            ErrorClass::DeadlineExceeded => {
                debug!("Long-poll for '{}' ended without jobs: {}", task_type, e)
            }
            ErrorClass::Cancelled => debug!("Poll for '{}' was cancelled: {}", task_type, e),
            ErrorClass::Other => error!("Unexpected error while polling '{}': {:?}", task_type, e),
            class => warn!(
                "Broker {} while polling '{}', retrying in {:?}: {}",
                class,
                task_type,
                decision.delay(),
                e
            ),
        }

        decision
    }
}

fn reap_finished(in_flight: &mut JoinSet<()>) {
    while let Some(result) = in_flight.try_join_next() {
        if let Err(e) = result {
            warn!("Job task panicked: {}", e);
        }
    }
}

fn timed_out(request_timeout: Duration) -> BrokerError {
    BrokerError::DeadlineExceeded(format!("no response within {:?}", request_timeout))
}
