//! Tether Broker Client
//!
//! A type-safe client for the job broker's activate / complete / fail API.
//!
//! The [`Broker`] trait is the seam the worker depends on; [`BrokerClient`] is
//! its HTTP implementation, streaming activate-jobs responses as
//! newline-delimited JSON batches.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use std::time::Duration;
//! use tether_client::{Broker, BrokerClient};
//! use tether_core::domain::TaskType;
//! use tether_core::dto::job::ActivateJobsRequest;
//!
//! # async fn example() -> tether_client::Result<()> {
//! let client = BrokerClient::new("http://localhost:8080");
//!
//! let request = ActivateJobsRequest::new(
//!     TaskType::new("ship-order"),
//!     "worker-1",
//!     Duration::from_secs(10),
//!     Duration::from_secs(15),
//!     8,
//! );
//!
//! let mut batches = client.activate_jobs(request).await?;
//! while let Some(batch) = batches.next().await {
//!     println!("received {} job(s)", batch?.jobs.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod error;
mod jobs;

// Re-export commonly used types
pub use broker::{Broker, JobBatchStream};
pub use error::{BrokerError, ErrorClass, Result};

use reqwest::Client;

/// HTTP client for the broker API
#[derive(Debug, Clone)]
pub struct BrokerClient {
    /// Base URL of the broker (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl BrokerClient {
    /// Create a new broker client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the broker API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use tether_client::BrokerClient;
    ///
    /// let client = BrokerClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new broker client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. Per-call
    /// timeouts are still taken from each activate-jobs request.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the broker API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the broker
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle an API response that returns no content
    ///
    /// This method checks the status code and returns a classified error if
    /// the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BrokerError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
