//! Shared fixtures for integration tests

use api_normalizer::{Context, NormalizationStrategy, ProcessingEvent, StrategyError};
use serde_json::{json, Value};

/// Context with a single `locale` entry
#[allow(dead_code)]
pub fn locale_context(locale: &str) -> Context {
    Context::from([("locale".to_string(), json!(locale))])
}

/// Processing event carrying `value` under `parameter`
#[allow(dead_code)]
pub fn event_with(parameter: &str, value: Value) -> ProcessingEvent {
    ProcessingEvent::new().with_parameter(parameter, value)
}

/// Uppercases string values and leaves anything else alone
#[allow(dead_code)]
pub fn uppercase_strategy() -> impl NormalizationStrategy + Clone {
    |value: Value, _: Option<&str>, _: &Context| -> Result<Value, StrategyError> {
        Ok(match value {
            Value::String(text) => Value::String(text.to_uppercase()),
            other => other,
        })
    }
}

/// Wraps the value together with the context it was normalized under
#[allow(dead_code)]
pub fn context_echo_strategy() -> impl NormalizationStrategy + Clone {
    |value: Value, _: Option<&str>, context: &Context| -> Result<Value, StrategyError> {
        Ok(json!({ "value": value, "context": context }))
    }
}
