//! Notification sinks.
//!
//! Every accepted mutation produces one or more [`EventEnvelope`]s. The
//! registry hands them to an [`EventSink`] after the store commit. The sink
//! is write-only from the registry's point of view.

use std::sync::{Arc, PoisonError, RwLock};

use quill_core::{EventEnvelope, EventKind};

/// Destination for registry notifications.
pub trait EventSink: Send + Sync {
    /// Publish one notification.
    fn publish(&self, envelope: &EventEnvelope);
}

impl<E: EventSink + ?Sized> EventSink for Arc<E> {
    fn publish(&self, envelope: &EventEnvelope) {
        (**self).publish(envelope)
    }
}

/// Keeps every notification in memory, in publish order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RwLock<Vec<EventEnvelope>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kinds of everything published so far.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(EventEnvelope::kind)
            .collect()
    }

    /// The most recent notification.
    pub fn last(&self) -> Option<EventEnvelope> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything collected so far.
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, envelope: &EventEnvelope) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope.clone());
    }
}

/// Logs each notification through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, envelope: &EventEnvelope) {
        let bytes = envelope.canonical_bytes();
        tracing::info!(
            kind = ?envelope.kind(),
            item = ?envelope.event.item_id(),
            actor = %envelope.actor,
            digest = %envelope.digest(),
            size = bytes.len(),
            "notification"
        );
    }
}
