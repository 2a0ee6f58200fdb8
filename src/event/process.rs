//! Processing event contract
//!
//! A processing event is the object a request carries through the pipeline. Stages read
//! and write named parameters on it; the normalizer only needs presence checks, reads and
//! writes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Parameter store shared by pipeline stages
///
/// A parameter holding `Value::Null` is present. Absence is only ever expressed by the
/// parameter not being in the store.
pub trait ProcessEvent {
    fn has_parameter(&self, name: &str) -> bool;

    fn parameter(&self, name: &str) -> Option<&Value>;

    /// Insert or replace a parameter
    fn set_parameter(&mut self, name: &str, value: Value);
}

/// In-memory processing event backed by a parameter map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingEvent {
    #[serde(default)]
    parameters: HashMap<String, Value>,
}

impl ProcessingEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<Value> {
        self.parameters.remove(name)
    }

    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }
}

impl From<HashMap<String, Value>> for ProcessingEvent {
    fn from(parameters: HashMap<String, Value>) -> Self {
        Self { parameters }
    }
}

impl ProcessEvent for ProcessingEvent {
    fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    fn set_parameter(&mut self, name: &str, value: Value) {
        self.parameters.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_parameter_is_present() {
        let event = ProcessingEvent::new().with_parameter("payload", Value::Null);

        assert!(event.has_parameter("payload"));
        assert_eq!(event.parameter("payload"), Some(&Value::Null));
        assert!(!event.has_parameter("other"));
        assert_eq!(event.parameter("other"), None);
    }

    #[test]
    fn test_set_parameter_overwrites() {
        let mut event = ProcessingEvent::new().with_parameter("data", "old");
        event.set_parameter("data", json!({"new": true}));

        assert_eq!(event.parameter("data"), Some(&json!({"new": true})));
        assert_eq!(event.parameters().len(), 1);
    }

    #[test]
    fn test_remove_parameter() {
        let mut event = ProcessingEvent::new().with_parameter("data", 1);

        assert_eq!(event.remove_parameter("data"), Some(json!(1)));
        assert!(!event.has_parameter("data"));
        assert_eq!(event.remove_parameter("data"), None);
    }

    #[test]
    fn test_deserialize_from_json() {
        let event: ProcessingEvent =
            serde_json::from_value(json!({"parameters": {"loader_storage": [1, 2]}})).unwrap();
        assert_eq!(event.parameter("loader_storage"), Some(&json!([1, 2])));

        let empty: ProcessingEvent = serde_json::from_value(json!({})).unwrap();
        assert!(empty.parameters().is_empty());
    }
}
