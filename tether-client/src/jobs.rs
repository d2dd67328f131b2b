//! Job-related API endpoints

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tether_core::domain::job::JobKey;
use tether_core::dto::job::{ActivateJobsRequest, CompleteJobRequest, FailJobRequest, JobBatch};
use tracing::debug;

use crate::BrokerClient;
use crate::broker::{Broker, JobBatchStream};
use crate::error::{BrokerError, Result};

#[async_trait]
impl Broker for BrokerClient {
    async fn activate_jobs(&self, request: ActivateJobsRequest) -> Result<JobBatchStream> {
        let url = format!("{}/api/jobs/activate", self.base_url);

        debug!(
            "Activating up to {} '{}' job(s) as {}",
            request.max_jobs_to_activate, request.task_type, request.worker_name
        );

        let response = self
            .client
            .post(&url)
            .timeout(request.request_timeout())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BrokerError::api_error(status.as_u16(), error_text));
        }

        Ok(decode_batches(response.bytes_stream()))
    }

    async fn complete_job(&self, job_key: JobKey, variables: String) -> Result<()> {
        let url = format!("{}/api/jobs/{}/complete", self.base_url, job_key);
        let response = self
            .client
            .post(&url)
            .json(&CompleteJobRequest { variables })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    async fn fail_job(&self, job_key: JobKey, error_message: String) -> Result<()> {
        let url = format!("{}/api/jobs/{}/fail", self.base_url, job_key);
        let response = self
            .client
            .post(&url)
            .json(&FailJobRequest { error_message })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

struct NdjsonState<S> {
    body: Pin<Box<S>>,
    buffer: Vec<u8>,
    exhausted: bool,
}

/// Splits a streamed response body into one `JobBatch` per JSON line
///
/// Blank lines are skipped. The stream stops after the first transport or
/// parse error.
pub(crate) fn decode_batches<S, B, E>(body: S) -> JobBatchStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<BrokerError> + Send + 'static,
{
    let state = NdjsonState {
        body: Box::pin(body),
        buffer: Vec::new(),
        exhausted: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                if let Some(item) = parse_line(&line) {
                    if item.is_err() {
                        state.exhausted = true;
                        state.buffer.clear();
                    }
                    return Some((item, state));
                }
                continue;
            }

            if state.exhausted {
                let rest = std::mem::take(&mut state.buffer);
                return parse_line(&rest).map(|item| (item, state));
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.exhausted = true;
                    state.buffer.clear();
                    return Some((Err(e.into()), state));
                }
                None => state.exhausted = true,
            }
        }
    })
    .boxed()
}

fn parse_line(line: &[u8]) -> Option<Result<JobBatch>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    Some(
        serde_json::from_slice::<JobBatch>(line)
            .map_err(|e| BrokerError::ParseError(format!("Invalid job batch: {}", e))),
    )
}
