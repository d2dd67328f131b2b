//! Task type identifier

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier grouping jobs that are handled by the same handler
///
/// Handlers are registered against a `TaskType` rather than a bare string so
/// lookups in the worker registry stay typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for TaskType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_task_type_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(TaskType::from("ship-order"), 1);

        assert_eq!(map.get("ship-order"), Some(&1));
        assert_eq!(map.get("bill-order"), None);
    }

    #[test]
    fn test_task_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&TaskType::new("ship-order")).unwrap();
        assert_eq!(json, "\"ship-order\"");
    }

    #[test]
    fn test_blank_task_type_is_empty() {
        assert!(TaskType::new("  ").is_empty());
        assert!(!TaskType::new("a").is_empty());
    }
}
