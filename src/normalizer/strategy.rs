//! Normalization strategies
//!
//! The normalizer does not know how values are normalized. It delegates to a
//! [`NormalizationStrategy`], the same way a serializer delegates to its normalizers.

use crate::event::normalizing::Context;
use serde_json::Value;

/// Error returned by a strategy; handed back to the caller unchanged
pub type StrategyError = Box<dyn std::error::Error + Send + Sync>;

/// Transformation applied to the in-flight value of a pass
pub trait NormalizationStrategy: Send + Sync {
    /// Normalize `value`
    ///
    /// `target_type` names a concrete type to normalize into. The normalization stage never
    /// requests one and always passes `None`.
    fn normalize(
        &self,
        value: Value,
        target_type: Option<&str>,
        context: &Context,
    ) -> Result<Value, StrategyError>;
}

impl<F> NormalizationStrategy for F
where
    F: Fn(Value, Option<&str>, &Context) -> Result<Value, StrategyError> + Send + Sync,
{
    fn normalize(
        &self,
        value: Value,
        target_type: Option<&str>,
        context: &Context,
    ) -> Result<Value, StrategyError> {
        self(value, target_type, context)
    }
}

/// Returns the value untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStrategy;

impl NormalizationStrategy for IdentityStrategy {
    fn normalize(
        &self,
        value: Value,
        _target_type: Option<&str>,
        _context: &Context,
    ) -> Result<Value, StrategyError> {
        Ok(value)
    }
}
