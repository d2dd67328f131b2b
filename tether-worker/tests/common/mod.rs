//! Scripted in-memory broker shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tether_client::{Broker, BrokerError, ErrorClass, JobBatchStream};
use tether_core::domain::{JobKey, TaskType};
use tether_core::dto::job::{ActivateJobsRequest, ActivatedJob, JobBatch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What the broker does on one activate-jobs call
pub enum Step {
    /// Responds with these batches, then closes the call
    Batches(Vec<Vec<ActivatedJob>>),
    /// Fails the call up front
    Fail(ErrorClass),
    /// Streams the batches, then fails mid-stream
    BatchesThenFail(Vec<Vec<ActivatedJob>>, ErrorClass),
    /// Never answers
    Hang,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Complete(JobKey, JsonValue),
    Fail(JobKey, String),
}

#[derive(Debug, Clone)]
pub struct Poll {
    pub at: Instant,
    pub request: ActivateJobsRequest,
}

/// Broker that plays back a script per task type
///
/// Once every script is used up the broker cancels `shutdown` and stops
/// answering, so a worker driven by it winds down on its own.
pub struct ScriptedBroker {
    scripts: Mutex<HashMap<TaskType, VecDeque<Step>>>,
    polls: Mutex<Vec<Poll>>,
    reports: Mutex<Vec<Report>>,
    hang_acks: bool,
    pub shutdown: CancellationToken,
}

impl ScriptedBroker {
    pub fn new(scripts: Vec<(&str, Vec<Step>)>) -> Arc<Self> {
        Self::build(scripts, false)
    }

    /// Like `new`, but complete and fail calls are recorded and never answered
    pub fn with_unanswered_acks(scripts: Vec<(&str, Vec<Step>)>) -> Arc<Self> {
        Self::build(scripts, true)
    }

    fn build(scripts: Vec<(&str, Vec<Step>)>, hang_acks: bool) -> Arc<Self> {
        let scripts = scripts
            .into_iter()
            .map(|(task_type, steps)| (TaskType::new(task_type), VecDeque::from(steps)))
            .collect();

        Arc::new(Self {
            scripts: Mutex::new(scripts),
            polls: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
            hang_acks,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn polls(&self) -> Vec<Poll> {
        self.polls.lock().unwrap().clone()
    }

    pub fn polls_for(&self, task_type: &str) -> Vec<Poll> {
        self.polls()
            .into_iter()
            .filter(|p| p.request.task_type.as_str() == task_type)
            .collect()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    /// Reports sorted by job key
    pub fn sorted_reports(&self) -> Vec<Report> {
        let mut reports = self.reports();
        reports.sort_by_key(|r| match r {
            Report::Complete(key, _) | Report::Fail(key, _) => *key,
        });
        reports
    }

    async fn record(&self, report: Report) -> tether_client::Result<()> {
        self.reports.lock().unwrap().push(report);
        if self.hang_acks {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }

    fn next_step(&self, task_type: &TaskType) -> Option<Step> {
        let mut scripts = self.scripts.lock().unwrap();
        let step = scripts.get_mut(task_type).and_then(VecDeque::pop_front);
        if step.is_none() && scripts.values().all(VecDeque::is_empty) {
            self.shutdown.cancel();
        }
        step
    }
}

pub fn job(key: i64, task_type: &str, variables: &str) -> ActivatedJob {
    ActivatedJob {
        key: JobKey(key),
        task_type: TaskType::new(task_type),
        instance_key: 1000 + key,
        variables: variables.to_string(),
    }
}

pub fn error_of(class: ErrorClass) -> BrokerError {
    match class {
        ErrorClass::Unavailable => BrokerError::Unavailable("connection refused".to_string()),
        ErrorClass::ResourceExhausted => BrokerError::ResourceExhausted("overloaded".to_string()),
        ErrorClass::Internal => BrokerError::Internal("partition leader missing".to_string()),
        ErrorClass::DeadlineExceeded => BrokerError::DeadlineExceeded("long-poll expired".to_string()),
        ErrorClass::Cancelled => BrokerError::Cancelled("call cancelled".to_string()),
        ErrorClass::Other => BrokerError::api_error(400, "bad request"),
    }
}

fn batches(batches: Vec<Vec<ActivatedJob>>) -> Vec<tether_client::Result<JobBatch>> {
    batches
        .into_iter()
        .map(|jobs| Ok(JobBatch { jobs }))
        .collect()
}

#[async_trait]
impl Broker for ScriptedBroker {
    async fn activate_jobs(&self, request: ActivateJobsRequest) -> tether_client::Result<JobBatchStream> {
        self.polls.lock().unwrap().push(Poll {
            at: Instant::now(),
            request: request.clone(),
        });

        match self.next_step(&request.task_type) {
            Some(Step::Batches(jobs)) => Ok(futures::stream::iter(batches(jobs)).boxed()),
            Some(Step::Fail(class)) => Err(error_of(class)),
            Some(Step::BatchesThenFail(jobs, class)) => {
                let mut items = batches(jobs);
                items.push(Err(error_of(class)));
                Ok(futures::stream::iter(items).boxed())
            }
            Some(Step::Hang) | None => futures::future::pending().await,
        }
    }

    async fn complete_job(&self, job_key: JobKey, variables: String) -> tether_client::Result<()> {
        let variables = serde_json::from_str(&variables).expect("variables must be JSON");
        self.record(Report::Complete(job_key, variables)).await
    }

    async fn fail_job(&self, job_key: JobKey, error_message: String) -> tether_client::Result<()> {
        self.record(Report::Fail(job_key, error_message)).await
    }
}
