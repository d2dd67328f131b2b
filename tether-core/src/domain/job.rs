//! Job domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use super::task_type::TaskType;
use crate::dto::job::ActivatedJob;

/// Job variables: a JSON object keyed by variable name
pub type Variables = Map<String, JsonValue>;

/// Broker-assigned job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKey(pub i64);

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work delivered by the broker
///
/// A job is handed to exactly one handler invocation and is done, from the
/// worker's point of view, once its outcome has been reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub key: JobKey,
    pub task_type: TaskType,
    /// Owning process instance, kept for log correlation
    pub instance_key: i64,
    pub variables: Variables,
}

impl Job {
    /// Returns a variable by name
    pub fn variable(&self, name: &str) -> Option<&JsonValue> {
        self.variables.get(name)
    }
}

impl TryFrom<ActivatedJob> for Job {
    type Error = serde_json::Error;

    /// Decodes the wire job. A blank payload is read as no variables; anything
    /// other than a JSON object is rejected.
    fn try_from(wire: ActivatedJob) -> Result<Self, Self::Error> {
        let variables = if wire.variables.trim().is_empty() {
            Variables::new()
        } else {
            serde_json::from_str::<Variables>(&wire.variables)?
        };

        Ok(Self {
            key: wire.key,
            task_type: wire.task_type,
            instance_key: wire.instance_key,
            variables,
        })
    }
}

/// Output variables produced by a job handler
///
/// Only JSON objects carry variables. Any other value a handler produces,
/// `null` included, becomes an empty result rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerResult(Variables);

impl HandlerResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serializes any value and normalizes it into output variables
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::from(serde_json::to_value(value)?))
    }

    pub fn variables(&self) -> &Variables {
        &self.0
    }

    pub fn into_variables(self) -> Variables {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<JsonValue> for HandlerResult {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self(map),
            _ => Self::empty(),
        }
    }
}

impl From<Variables> for HandlerResult {
    fn from(map: Variables) -> Self {
        Self(map)
    }
}

impl From<()> for HandlerResult {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}
