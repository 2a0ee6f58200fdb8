//! Mock implementations for testing
//!
//! Provides a recording strategy, a recording dispatcher and a scoped log capture so the
//! normalizer can be exercised without real serializers or a global subscriber.

use crate::event::dispatcher::{EventDispatcher, ListenerError, ListenerRegistry};
use crate::event::normalizing::{Context, NormalizingEvent};
use crate::event::process::ProcessEvent;
use crate::normalizer::strategy::{NormalizationStrategy, StrategyError};
use serde_json::Value;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*};

/// Address of a processing event, for identity assertions
pub fn event_address(event: &dyn ProcessEvent) -> usize {
    event as *const _ as *const () as usize
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Error returned by [`MockStrategy::with_failure`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mock strategy failure")]
pub struct MockStrategyError;

/// Arguments of one strategy call
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyCall {
    pub value: Value,
    pub target_type: Option<String>,
    pub context: Context,
}

/// Mock strategy for testing
///
/// Clones share the call log, so a clone kept by the test sees the calls made through the
/// one moved into the normalizer.
#[derive(Debug, Clone, Default)]
pub struct MockStrategy {
    pub calls: Arc<Mutex<Vec<StrategyCall>>>,
    /// Fixed result; the input value is returned when unset
    pub response: Option<Value>,
    pub should_fail: bool,
}

impl MockStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(response: Value) -> Self {
        Self {
            response: Some(response),
            ..Default::default()
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<StrategyCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl NormalizationStrategy for MockStrategy {
    fn normalize(
        &self,
        value: Value,
        target_type: Option<&str>,
        context: &Context,
    ) -> Result<Value, StrategyError> {
        lock(&self.calls).push(StrategyCall {
            value: value.clone(),
            target_type: target_type.map(str::to_string),
            context: context.clone(),
        });

        if self.should_fail {
            return Err(Box::new(MockStrategyError));
        }

        Ok(self.response.clone().unwrap_or(value))
    }
}

/// Error returned by a [`RecordingDispatcher`] configured with `failing_on`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mock listener failed on {event_name}")]
pub struct MockDispatchError {
    pub event_name: String,
}

/// State of the carrier when a dispatch started
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub event_name: String,
    pub value: Value,
    pub context: Context,
    /// See [`event_address`]
    pub originating_event: usize,
    pub propagation_stopped: bool,
}

/// Mock dispatcher recording every dispatch
///
/// Optionally forwards to a [`ListenerRegistry`] after recording, so real listeners can
/// mutate the carrier while the dispatch sequence is still observed.
#[derive(Default)]
pub struct RecordingDispatcher {
    records: Mutex<Vec<DispatchRecord>>,
    registry: Option<ListenerRegistry>,
    fail_on: Option<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarding(registry: ListenerRegistry) -> Self {
        Self {
            registry: Some(registry),
            ..Default::default()
        }
    }

    /// Fail every dispatch of `event_name` with [`MockDispatchError`]
    pub fn failing_on(mut self, event_name: impl Into<String>) -> Self {
        self.fail_on = Some(event_name.into());
        self
    }

    pub fn records(&self) -> Vec<DispatchRecord> {
        lock(&self.records).clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        lock(&self.records)
            .iter()
            .map(|record| record.event_name.clone())
            .collect()
    }

    pub fn dispatch_count(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(
        &self,
        event_name: &str,
        event: &mut NormalizingEvent<'_>,
    ) -> Result<(), ListenerError> {
        lock(&self.records).push(DispatchRecord {
            event_name: event_name.to_string(),
            value: event.value().clone(),
            context: event.context().clone(),
            originating_event: event_address(event.originating_event()),
            propagation_stopped: event.is_propagation_stopped(),
        });

        if self.fail_on.as_deref() == Some(event_name) {
            return Err(Box::new(MockDispatchError {
                event_name: event_name.to_string(),
            }));
        }

        match &self.registry {
            Some(registry) => registry.dispatch(event_name, event),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RecordingDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingDispatcher")
            .field("records", &self.records())
            .field("registry", &self.registry)
            .field("fail_on", &self.fail_on)
            .finish()
    }
}

/// One log line emitted while a [`LogCapture`] was active
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLog {
    pub level: String,
    pub message: String,
    /// Every field of the event, `message` included
    pub fields: Value,
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Scoped JSON subscriber collecting every record emitted on the current thread
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the capturing subscriber as the thread's default
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let buffer = Arc::clone(&self.buffer);
        let layer = tracing_fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(move || CaptureWriter(Arc::clone(&buffer)));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn records(&self) -> Vec<CapturedLog> {
        let buffer = lock(&self.buffer);
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .map(|record| CapturedLog {
                level: record["level"].as_str().unwrap_or_default().to_string(),
                message: record["fields"]["message"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                fields: record["fields"].clone(),
            })
            .collect()
    }

    pub fn at_level(&self, level: Level) -> Vec<CapturedLog> {
        let level = level.to_string();
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .collect()
    }
}
