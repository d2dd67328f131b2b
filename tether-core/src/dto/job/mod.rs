//! Job DTOs for broker communication

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::job::{JobKey, Variables};
use crate::domain::task_type::TaskType;

/// Long-poll request for jobs of one task type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateJobsRequest {
    pub task_type: TaskType,
    pub worker_name: String,
    /// How long the broker may hold the request open waiting for work
    pub poll_timeout_ms: u64,
    /// How long the client waits for the whole call
    pub request_timeout_ms: u64,
    pub max_jobs_to_activate: u32,
}

impl ActivateJobsRequest {
    pub fn new(
        task_type: TaskType,
        worker_name: impl Into<String>,
        poll_timeout: Duration,
        request_timeout: Duration,
        max_jobs_to_activate: u32,
    ) -> Self {
        Self {
            task_type,
            worker_name: worker_name.into(),
            poll_timeout_ms: duration_ms(poll_timeout),
            request_timeout_ms: duration_ms(request_timeout),
            max_jobs_to_activate,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// One chunk of an activate-jobs response stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobBatch {
    #[serde(default)]
    pub jobs: Vec<ActivatedJob>,
}

/// A job as delivered by the broker, variables still encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedJob {
    pub key: JobKey,
    pub task_type: TaskType,
    pub instance_key: i64,
    /// JSON object text
    #[serde(default)]
    pub variables: String,
}

/// Body of a complete-job call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteJobRequest {
    /// JSON object text
    pub variables: String,
}

impl CompleteJobRequest {
    pub fn from_variables(variables: &Variables) -> Result<Self, serde_json::Error> {
        Ok(Self {
            variables: serde_json::to_string(variables)?,
        })
    }
}

/// Body of a fail-job call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailJobRequest {
    pub error_message: String,
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activate_request_carries_durations_in_millis() {
        let request = ActivateJobsRequest::new(
            TaskType::new("ship-order"),
            "worker-1",
            Duration::from_secs(10),
            Duration::from_millis(15_500),
            2,
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "task_type": "ship-order",
                "worker_name": "worker-1",
                "poll_timeout_ms": 10_000,
                "request_timeout_ms": 15_500,
                "max_jobs_to_activate": 2,
            })
        );
        assert_eq!(request.request_timeout(), Duration::from_millis(15_500));
    }

    #[test]
    fn test_batch_without_jobs_field_is_empty() {
        let batch: JobBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.jobs.is_empty());
    }

    #[test]
    fn test_complete_request_encodes_variables_as_text() {
        let mut vars = Variables::new();
        vars.insert("shipped".to_string(), json!(true));

        let request = CompleteJobRequest::from_variables(&vars).unwrap();
        assert_eq!(request.variables, r#"{"shipped":true}"#);

        let empty = CompleteJobRequest::from_variables(&Variables::new()).unwrap();
        assert_eq!(empty.variables, "{}");
    }
}
