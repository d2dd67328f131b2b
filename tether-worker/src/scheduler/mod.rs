//! Scheduler layer for the worker
//!
//! This layer keeps one long-poll loop per subscribed task type, hands every
//! activated job to the dispatcher, and decides how to retry when the broker
//! call fails.

pub mod backoff;
pub mod poller;

pub use backoff::{RetryDecision, RetryPolicy};
pub use poller::Poller;
