//! In-memory broker used by unit tests

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};
use tether_client::{Broker, BrokerError, JobBatchStream};
use tether_core::domain::JobKey;
use tether_core::dto::job::ActivateJobsRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Complete(JobKey, JsonValue),
    Fail(JobKey, String),
}

/// Records acknowledgments; activation always returns no jobs
#[derive(Default)]
pub struct RecordingBroker {
    reports: Mutex<Vec<Report>>,
    reject_reports: bool,
    hang_reports: bool,
}

impl RecordingBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A broker whose complete/fail calls all fail
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject_reports: true,
            ..Self::default()
        })
    }

    /// A broker that records complete/fail calls and never answers them
    pub fn unanswering() -> Arc<Self> {
        Arc::new(Self {
            hang_reports: true,
            ..Self::default()
        })
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    async fn record(&self, report: Report) -> tether_client::Result<()> {
        self.reports.lock().unwrap().push(report);
        if self.hang_reports {
            futures::future::pending::<()>().await;
        }
        if self.reject_reports {
            return Err(BrokerError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Broker for RecordingBroker {
    async fn activate_jobs(&self, _request: ActivateJobsRequest) -> tether_client::Result<JobBatchStream> {
        Ok(futures::stream::empty().boxed())
    }

    async fn complete_job(&self, job_key: JobKey, variables: String) -> tether_client::Result<()> {
        let variables = serde_json::from_str(&variables).unwrap();
        self.record(Report::Complete(job_key, variables)).await
    }

    async fn fail_job(&self, job_key: JobKey, error_message: String) -> tether_client::Result<()> {
        self.record(Report::Fail(job_key, error_message)).await
    }
}
