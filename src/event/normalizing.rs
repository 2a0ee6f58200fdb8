//! The carrier handed to normalization observers
//!
//! One [`NormalizingEvent`] is built per normalization pass. The same instance is lent to
//! the "before" listeners, to the strategy call and to the "after" listeners, so every
//! mutation made along the way is seen by the next step.

use super::process::ProcessEvent;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Out-of-band options passed alongside the value to the strategy and to observers
pub type Context = HashMap<String, Value>;

/// In-flight value of a normalization pass
///
/// The originating event is borrowed for the whole pass, which keeps observers from
/// holding on to the carrier once the pass has completed.
pub struct NormalizingEvent<'a> {
    originating_event: &'a dyn ProcessEvent,
    value: Value,
    context: Context,
    propagation_stopped: bool,
}

impl<'a> NormalizingEvent<'a> {
    pub fn new(originating_event: &'a dyn ProcessEvent, context: Context, value: Value) -> Self {
        Self {
            originating_event,
            value,
            context,
            propagation_stopped: false,
        }
    }

    /// Carrier with an empty context and a null value
    pub fn from_event(originating_event: &'a dyn ProcessEvent) -> Self {
        Self::new(originating_event, Context::new(), Value::Null)
    }

    /// The processing event this pass was started from
    pub fn originating_event(&self) -> &'a dyn ProcessEvent {
        self.originating_event
    }

    /// The value, raw before the strategy ran and normalized afterwards
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn set_value(&mut self, value: Value) -> &mut Self {
        self.value = value;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Replace the whole context. Entries are not merged.
    pub fn set_context(&mut self, context: Context) -> &mut Self {
        self.context = context;
        self
    }

    /// Skip the listeners that have not run yet
    ///
    /// The flag stays set for the rest of the pass, including the "after" dispatch.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl fmt::Debug for NormalizingEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizingEvent")
            .field(
                "originating_event",
                &format_args!("{:p}", self.originating_event),
            )
            .field("value", &self.value)
            .field("context", &self.context)
            .field("propagation_stopped", &self.propagation_stopped)
            .finish()
    }
}
