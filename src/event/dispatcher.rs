//! Synchronous event dispatch for normalization observers
//!
//! [`ListenerRegistry`] maps event names to ordered listener lists. Dispatch runs every
//! listener registered under the name on the calling thread, lending each one the same
//! [`NormalizingEvent`], and stops at the first listener error.

use super::normalizing::NormalizingEvent;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Error returned by a listener; handed back to the caller unchanged
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Listener callback: receives the carrier and the name it was dispatched under
pub type Listener =
    Box<dyn Fn(&mut NormalizingEvent<'_>, &str) -> Result<(), ListenerError> + Send + Sync>;

/// Dispatch contract consumed by the normalizer
pub trait EventDispatcher {
    /// Invoke the listeners registered for `event_name`, in order, with `event` lent by
    /// mutable reference. The first listener error aborts the dispatch.
    fn dispatch(
        &self,
        event_name: &str,
        event: &mut NormalizingEvent<'_>,
    ) -> Result<(), ListenerError>;
}

struct RegisteredListener {
    priority: i32,
    listener: Listener,
}

/// Observer registry keyed by event name
///
/// Listeners with a higher priority run first. Listeners sharing a priority run in
/// registration order, so plain [`add_listener`](Self::add_listener) calls keep their
/// registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<RegisteredListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener with the default priority (0)
    pub fn add_listener<F>(&mut self, event_name: impl Into<String>, listener: F) -> &mut Self
    where
        F: Fn(&mut NormalizingEvent<'_>, &str) -> Result<(), ListenerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_listener_with_priority(event_name, 0, listener)
    }

    pub fn add_listener_with_priority<F>(
        &mut self,
        event_name: impl Into<String>,
        priority: i32,
        listener: F,
    ) -> &mut Self
    where
        F: Fn(&mut NormalizingEvent<'_>, &str) -> Result<(), ListenerError>
            + Send
            + Sync
            + 'static,
    {
        let listeners = self.listeners.entry(event_name.into()).or_default();

        // Insert after every listener of greater or equal priority
        let position = listeners
            .iter()
            .position(|registered| registered.priority < priority)
            .unwrap_or(listeners.len());

        listeners.insert(
            position,
            RegisteredListener {
                priority,
                listener: Box::new(listener),
            },
        );
        self
    }

    pub fn has_listeners(&self, event_name: &str) -> bool {
        self.listener_count(event_name) > 0
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.get(event_name).map_or(0, Vec::len)
    }

    /// Drop every listener registered under `event_name`, returning how many were removed
    pub fn remove_listeners(&mut self, event_name: &str) -> usize {
        self.listeners.remove(event_name).map_or(0, |removed| removed.len())
    }

    /// Event names with at least one listener, sorted
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .listeners
            .iter()
            .filter(|(_, listeners)| !listeners.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl EventDispatcher for ListenerRegistry {
    fn dispatch(
        &self,
        event_name: &str,
        event: &mut NormalizingEvent<'_>,
    ) -> Result<(), ListenerError> {
        let Some(listeners) = self.listeners.get(event_name) else {
            trace!(event = event_name, "No listeners registered");
            return Ok(());
        };

        for (index, registered) in listeners.iter().enumerate() {
            if event.is_propagation_stopped() {
                trace!(
                    event = event_name,
                    skipped = listeners.len() - index,
                    "Propagation stopped"
                );
                break;
            }
            (registered.listener)(event, event_name)?;
        }

        Ok(())
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, listeners)| (name.as_str(), listeners.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

impl<D: EventDispatcher + ?Sized> EventDispatcher for &D {
    fn dispatch(
        &self,
        event_name: &str,
        event: &mut NormalizingEvent<'_>,
    ) -> Result<(), ListenerError> {
        (**self).dispatch(event_name, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::process::ProcessingEvent;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        label: &'static str,
    ) -> impl Fn(&mut NormalizingEvent<'_>, &str) -> Result<(), ListenerError> + Send + Sync + 'static
    {
        let log = Arc::clone(log);
        move |_event: &mut NormalizingEvent<'_>, _name: &str| {
            log.lock().unwrap().push(label.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry
            .add_listener("before", recorder(&log, "first"))
            .add_listener("before", recorder(&log, "second"))
            .add_listener("before", recorder(&log, "third"));

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        registry.dispatch("before", &mut event).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry
            .add_listener("after", recorder(&log, "default"))
            .add_listener_with_priority("after", -10, recorder(&log, "late"))
            .add_listener_with_priority("after", 10, recorder(&log, "early"))
            .add_listener("after", recorder(&log, "default-2"));

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        registry.dispatch("after", &mut event).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["early", "default", "default-2", "late"]
        );
    }

    #[test]
    fn test_only_matching_name_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry
            .add_listener("before", recorder(&log, "before"))
            .add_listener("after", recorder(&log, "after"));

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        registry.dispatch("after", &mut event).unwrap();
        registry.dispatch("unknown", &mut event).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn test_listener_receives_dispatched_name() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let mut registry = ListenerRegistry::new();
        registry.add_listener("before", move |_event: &mut NormalizingEvent<'_>, name: &str| {
            *seen_clone.lock().unwrap() = Some(name.to_string());
            Ok(())
        });

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        registry.dispatch("before", &mut event).unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("before"));
    }

    #[test]
    fn test_mutations_are_shared_between_listeners() {
        let mut registry = ListenerRegistry::new();
        registry
            .add_listener("before", |event: &mut NormalizingEvent<'_>, _: &str| {
                event.set_value(json!(1));
                Ok(())
            })
            .add_listener("before", |event: &mut NormalizingEvent<'_>, _: &str| {
                let next = event.value().as_i64().unwrap_or_default() + 1;
                event.set_value(json!(next));
                Ok(())
            });

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        registry.dispatch("before", &mut event).unwrap();

        assert_eq!(event.value(), &json!(2));
    }

    #[test]
    fn test_first_error_aborts_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry
            .add_listener("before", recorder(&log, "ok"))
            .add_listener("before", |_: &mut NormalizingEvent<'_>, _: &str| {
                Err("listener failed".into())
            })
            .add_listener("before", recorder(&log, "never"));

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        let error = registry.dispatch("before", &mut event).unwrap_err();

        assert_eq!(error.to_string(), "listener failed");
        assert_eq!(*log.lock().unwrap(), vec!["ok"]);
    }

    #[test]
    fn test_stop_propagation_skips_remaining() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry
            .add_listener("before", |event: &mut NormalizingEvent<'_>, _: &str| {
                event.set_value(Value::Bool(true));
                event.stop_propagation();
                Ok(())
            })
            .add_listener("before", recorder(&log, "skipped"));

        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        registry.dispatch("before", &mut event).unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(event.value(), &Value::Bool(true));
    }

    #[test]
    fn test_listener_bookkeeping() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        assert!(!registry.has_listeners("before"));

        registry
            .add_listener("before", recorder(&log, "a"))
            .add_listener("before", recorder(&log, "b"))
            .add_listener("after", recorder(&log, "c"));

        assert_eq!(registry.listener_count("before"), 2);
        assert_eq!(registry.event_names(), vec!["after", "before"]);

        assert_eq!(registry.remove_listeners("before"), 2);
        assert!(!registry.has_listeners("before"));
        assert_eq!(registry.remove_listeners("before"), 0);
        assert_eq!(registry.event_names(), vec!["after"]);
    }

    #[test]
    fn test_dispatch_through_reference() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.add_listener("before", recorder(&log, "ref"));

        let dispatcher: &dyn EventDispatcher = &registry;
        let origin = ProcessingEvent::new();
        let mut event = NormalizingEvent::from_event(&origin);
        (&dispatcher).dispatch("before", &mut event).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["ref"]);
    }
}
