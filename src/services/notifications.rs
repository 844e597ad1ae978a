//! Event sinks receiving category change notifications.

use std::sync::{Arc, Mutex};

use crate::domain::event::CategoryEvent;

/// Fire-and-forget receiver of [`CategoryEvent`]s.
pub trait CategoryEventSink {
    fn publish(&self, event: &CategoryEvent);
}

impl<T: CategoryEventSink + ?Sized> CategoryEventSink for &T {
    fn publish(&self, event: &CategoryEvent) {
        (**self).publish(event)
    }
}

impl<T: CategoryEventSink + ?Sized> CategoryEventSink for Arc<T> {
    fn publish(&self, event: &CategoryEvent) {
        (**self).publish(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl CategoryEventSink for NoopEventSink {
    fn publish(&self, _event: &CategoryEvent) {}
}

/// Sink that writes events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl CategoryEventSink for LogEventSink {
    fn publish(&self, event: &CategoryEvent) {
        log::info!(
            "{} {}#{} categories={:?}",
            event.name,
            event.owner_type,
            event.owner_id,
            event.category_ids
        );
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CategoryEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, oldest first.
    pub fn events(&self) -> Vec<CategoryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of the events published so far.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl CategoryEventSink for RecordingEventSink {
    fn publish(&self, event: &CategoryEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(e) => log::error!("Dropping {}: recorder poisoned: {e}", event.name),
        }
    }
}
