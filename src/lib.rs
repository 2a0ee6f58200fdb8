//! API Normalizer
//!
//! The normalization stage of an API processing pipeline.
//!
//! # Overview
//!
//! A [`Normalizer`] takes the value a previous stage stored on a processing event,
//! transforms it through an injected [`NormalizationStrategy`], and writes the result back
//! onto the event. Around the strategy call it dispatches a "before" and an "after"
//! event, both carrying the same [`NormalizingEvent`], so observers can inspect or replace
//! the in-flight value and context.
//!
//! # Quick Start
//!
//! ```rust
//! use api_normalizer::{
//!     Context, ListenerRegistry, Normalizer, NormalizingEvent, ProcessEvent,
//!     ProcessingEvent, StrategyError, EVENT_BEFORE,
//! };
//! use serde_json::{json, Value};
//!
//! let normalizer = Normalizer::new(
//!     |value: Value, _: Option<&str>, _: &Context| -> Result<Value, StrategyError> {
//!         Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
//!     },
//! )
//! .with_input_parameter("loaderKey");
//!
//! let mut listeners = ListenerRegistry::new();
//! listeners.add_listener(EVENT_BEFORE, |event: &mut NormalizingEvent<'_>, _: &str| {
//!     event.context_mut().insert("locale".to_string(), json!("fr"));
//!     Ok(())
//! });
//!
//! let mut event = ProcessingEvent::new().with_parameter("loaderKey", "raw");
//! normalizer.normalize(&mut event, "process", &listeners)?;
//!
//! assert_eq!(event.parameter("data"), Some(&json!("RAW")));
//! # Ok::<(), api_normalizer::NormalizerError>(())
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod normalizer;
pub mod observability;
pub mod testing;

pub use config::NormalizerConfig;
pub use error::{ConfigError, NormalizerError, NormalizerResult};
pub use event::{
    Context, EventDispatcher, Listener, ListenerError, ListenerRegistry, NormalizingEvent,
    ProcessEvent, ProcessingEvent,
};
pub use normalizer::{
    IdentityStrategy, NormalizationStrategy, Normalizer, StrategyError, EVENT_AFTER,
    EVENT_BEFORE, EVENT_KEY_STORAGE, NORMALIZED_DATA,
};
