//! Error types for the normalization stage
//!
//! The stage raises exactly one error of its own, [`NormalizerError::MissingInputParameter`].
//! Failures coming from the injected strategy or from dispatch listeners are carried through
//! untouched: their `Display` is forwarded and the original value stays reachable for
//! downcasting.

pub use crate::config::ConfigError;
use crate::event::dispatcher::ListenerError;
use crate::normalizer::strategy::StrategyError;
use thiserror::Error;

/// Main error type for normalization passes
#[derive(Debug, Error)]
pub enum NormalizerError {
    #[error("The expected parameter \"{parameter}\" does not exist in the process event")]
    MissingInputParameter { parameter: String },

    #[error(transparent)]
    Strategy(StrategyError),

    #[error(transparent)]
    Dispatch(ListenerError),
}

impl NormalizerError {
    /// Create missing input parameter error
    pub fn missing_input_parameter<S: Into<String>>(parameter: S) -> Self {
        Self::MissingInputParameter {
            parameter: parameter.into(),
        }
    }

    /// Whether this error is the stage's own precondition failure
    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::MissingInputParameter { .. })
    }

    /// Borrow the original strategy error, if this is one
    pub fn as_strategy_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Strategy(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Borrow the original listener error, if this is one
    pub fn as_dispatch_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Dispatch(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Unwrap into the original strategy or listener error
    ///
    /// The stage's own precondition failure has no inner error and is returned boxed as is.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        match self {
            Self::Strategy(e) | Self::Dispatch(e) => e,
            other @ Self::MissingInputParameter { .. } => Box::new(other),
        }
    }
}

/// Result type for normalization passes
pub type NormalizerResult<T> = Result<T, NormalizerError>;
