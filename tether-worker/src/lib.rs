//! Tether Worker
//!
//! Client-side job worker for a long-poll task broker.
//!
//! Architecture:
//! - Configuration: per-subscription polling parameters
//! - Registry: handlers keyed by task type
//! - Scheduler: one long-poll loop per task type, with retry policy
//! - Services: dispatching jobs to handlers and reporting their outcomes
//!
//! Every activated job ends in exactly one completion or failure report,
//! whatever its handler does.

pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use config::{BrokerSettings, Concurrency, WorkerConfig};
pub use error::WorkerError;
pub use handler::JobHandler;
pub use registry::HandlerRegistry;
pub use service::CompletionReporter;
pub use worker::Worker;
