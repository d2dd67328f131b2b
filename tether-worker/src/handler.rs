//! Job handler interface
//!
//! Application code supplies handlers; the worker never defines job logic
//! itself. Async closures and functions taking a [`Job`] work as handlers out
//! of the box.

use async_trait::async_trait;
use std::future::Future;
use tether_core::domain::{HandlerResult, Job};

/// Business logic for one task type
///
/// Returning `Err` fails the job with the error's full rendering as message.
/// A panic is caught by the dispatcher and treated the same way.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: Job) -> anyhow::Result<HandlerResult>;
}

#[async_trait]
impl<F, Fut> JobHandler for F
where
    F: Fn(Job) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<HandlerResult>> + Send + 'static,
{
    async fn handle(&self, job: Job) -> anyhow::Result<HandlerResult> {
        (self)(job).await
    }
}
