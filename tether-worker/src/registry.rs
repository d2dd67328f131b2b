//! Subscription registry
//!
//! Maps each subscribed task type to its handler and configuration. The
//! registry is filled before the worker starts and is read-only afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;
use tether_core::domain::TaskType;

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::handler::JobHandler;

/// A handler together with the configuration it was subscribed with
#[derive(Clone)]
pub struct Subscription {
    pub config: Arc<WorkerConfig>,
    pub handler: Arc<dyn JobHandler>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Registry of subscriptions keyed by task type
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    subscriptions: BTreeMap<TaskType, Subscription>,
}

impl HandlerRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for the config's task type
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the config does not validate, and
    /// `DuplicateSubscription` if the task type already has a handler
    pub fn register<H: JobHandler>(&mut self, config: WorkerConfig, handler: H) -> Result<()> {
        config.validate()?;

        if self.subscriptions.contains_key(&config.task_type) {
            return Err(WorkerError::DuplicateSubscription(config.task_type));
        }

        self.subscriptions.insert(
            config.task_type.clone(),
            Subscription {
                config: Arc::new(config),
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Looks up the subscription for a task type
    pub fn get(&self, task_type: &str) -> Option<&Subscription> {
        self.subscriptions.get(task_type)
    }

    /// Iterates over subscriptions in task type order
    pub fn iter(&self) -> impl Iterator<Item = (&TaskType, &Subscription)> {
        self.subscriptions.iter()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
