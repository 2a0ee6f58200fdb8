//! Normalization stage
//!
//! [`Normalizer`] reads a parameter off a processing event, runs it through the injected
//! [`NormalizationStrategy`] between a "before" and an "after" dispatch, and writes the
//! result to another parameter of the same event.
//!
//! ```text
//! guard ──► wrap ──► dispatch(before) ──► strategy ──► dispatch(after) ──► commit
//! ```
//!
//! Listeners of both dispatches share one [`NormalizingEvent`], so a "before" listener
//! can prepare the raw value and an "after" listener has the final word on the output.

pub mod strategy;

pub use strategy::{IdentityStrategy, NormalizationStrategy, StrategyError};

use crate::config::NormalizerConfig;
use crate::error::{NormalizerError, NormalizerResult};
use crate::event::dispatcher::EventDispatcher;
use crate::event::normalizing::{Context, NormalizingEvent};
use crate::event::process::ProcessEvent;
use crate::observability::metrics::metrics;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error};

/// Parameter the normalized value is written to by default
pub const NORMALIZED_DATA: &str = "data";

/// Event dispatched before the strategy runs
pub const EVENT_BEFORE: &str = "event_before_normalization";

/// Event dispatched after the strategy ran
pub const EVENT_AFTER: &str = "event_after_normalization";

/// Parameter the loader stage stores its result under; the default input
pub const EVENT_KEY_STORAGE: &str = "loader_storage";

/// Pipeline stage normalizing one processing event parameter into another
///
/// Configuration is fixed at construction. A single instance can run any number of
/// passes; each pass gets its own [`NormalizingEvent`].
pub struct Normalizer {
    strategy: Box<dyn NormalizationStrategy>,
    context: Context,
    input_parameter: String,
    output_parameter: String,
    before_event: String,
    after_event: String,
}

impl Normalizer {
    /// Create a normalizer with the default parameter and event names and an empty context
    pub fn new<S: NormalizationStrategy + 'static>(strategy: S) -> Self {
        Self::from_boxed(Box::new(strategy))
    }

    pub fn from_boxed(strategy: Box<dyn NormalizationStrategy>) -> Self {
        Self {
            strategy,
            context: Context::new(),
            input_parameter: EVENT_KEY_STORAGE.to_string(),
            output_parameter: NORMALIZED_DATA.to_string(),
            before_event: EVENT_BEFORE.to_string(),
            after_event: EVENT_AFTER.to_string(),
        }
    }

    /// Create a normalizer from a loaded configuration
    pub fn from_config<S: NormalizationStrategy + 'static>(
        config: NormalizerConfig,
        strategy: S,
    ) -> Self {
        Self {
            strategy: Box::new(strategy),
            context: config.context,
            input_parameter: config.input_parameter,
            output_parameter: config.output_parameter,
            before_event: config.before_event,
            after_event: config.after_event,
        }
    }

    /// Default context handed to every pass
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_input_parameter(mut self, name: impl Into<String>) -> Self {
        self.input_parameter = name.into();
        self
    }

    pub fn with_output_parameter(mut self, name: impl Into<String>) -> Self {
        self.output_parameter = name.into();
        self
    }

    pub fn with_before_event(mut self, name: impl Into<String>) -> Self {
        self.before_event = name.into();
        self
    }

    pub fn with_after_event(mut self, name: impl Into<String>) -> Self {
        self.after_event = name.into();
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn input_parameter(&self) -> &str {
        &self.input_parameter
    }

    pub fn output_parameter(&self) -> &str {
        &self.output_parameter
    }

    pub fn before_event(&self) -> &str {
        &self.before_event
    }

    pub fn after_event(&self) -> &str {
        &self.after_event
    }

    /// Run one normalization pass over `originating_event`
    ///
    /// `event_name` is the name the stage itself was invoked under; it is only recorded on
    /// the tracing span. Strategy and listener errors are returned unchanged, and a failed
    /// pass leaves `originating_event` untouched.
    pub fn normalize<D>(
        &self,
        originating_event: &mut dyn ProcessEvent,
        event_name: &str,
        dispatcher: &D,
    ) -> NormalizerResult<()>
    where
        D: EventDispatcher + ?Sized,
    {
        let span = crate::normalization_span!(
            event = event_name,
            input = %self.input_parameter,
            output = %self.output_parameter
        );
        let _entered = span.enter();

        let started = Instant::now();
        metrics().pass_started();

        let result = self.run_pass(originating_event, dispatcher);
        match &result {
            Ok(()) => metrics().pass_completed(started.elapsed()),
            Err(e) => metrics().pass_failed(e),
        }
        result
    }

    fn run_pass<D>(
        &self,
        originating_event: &mut dyn ProcessEvent,
        dispatcher: &D,
    ) -> NormalizerResult<()>
    where
        D: EventDispatcher + ?Sized,
    {
        if !originating_event.has_parameter(&self.input_parameter) {
            let error = NormalizerError::missing_input_parameter(&self.input_parameter);
            error!(parameter = %self.input_parameter, "{error}");
            return Err(error);
        }

        let value = originating_event
            .parameter(&self.input_parameter)
            .cloned()
            .unwrap_or_default();

        let normalized = {
            let mut carrier =
                NormalizingEvent::new(&*originating_event, self.context.clone(), value);

            self.dispatch(dispatcher, &self.before_event, &mut carrier)?;

            let raw = std::mem::take(carrier.value_mut());
            let normalized = self
                .strategy
                .normalize(raw, None, carrier.context())
                .map_err(NormalizerError::Strategy)?;
            debug!("Strategy produced normalized value");
            carrier.set_value(normalized);

            self.dispatch(dispatcher, &self.after_event, &mut carrier)?;

            carrier.into_value()
        };

        // Unconditional overwrite; a previous output value is not inspected
        originating_event.set_parameter(&self.output_parameter, normalized);
        debug!("Normalized value committed");

        Ok(())
    }

    fn dispatch<D>(
        &self,
        dispatcher: &D,
        event_name: &str,
        carrier: &mut NormalizingEvent<'_>,
    ) -> NormalizerResult<()>
    where
        D: EventDispatcher + ?Sized,
    {
        debug!(dispatched = event_name, "Dispatching normalizing event");
        metrics().dispatch_issued();
        dispatcher
            .dispatch(event_name, carrier)
            .map_err(NormalizerError::Dispatch)
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("context", &self.context)
            .field("input_parameter", &self.input_parameter)
            .field("output_parameter", &self.output_parameter)
            .field("before_event", &self.before_event)
            .field("after_event", &self.after_event)
            .finish_non_exhaustive()
    }
}
