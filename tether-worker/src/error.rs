//! Error types for the worker runtime

use tether_core::domain::TaskType;
use thiserror::Error;

/// Errors raised while setting up or running a worker
///
/// Transport failures and handler failures never show up here: the poller
/// recovers the former and the dispatcher reports the latter to the broker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid worker configuration: {0}")]
    InvalidConfig(String),

    #[error("Task type '{0}' is already subscribed")]
    DuplicateSubscription(TaskType),

    #[error("No task types subscribed")]
    NoSubscriptions,

    #[error("Poller for '{task_type}' stopped unexpectedly: {message}")]
    Poller { task_type: TaskType, message: String },
}

pub type Result<T> = std::result::Result<T, WorkerError>;
