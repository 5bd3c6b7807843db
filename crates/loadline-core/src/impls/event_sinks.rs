//! EventSink implementations.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::domain::RunEvent;
use crate::ports::EventSink;

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &RunEvent) {}
}

/// Records events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &RunEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}

/// Forwards events to an unbounded channel (e.g. a progress UI task).
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: &RunEvent) {
        // ignore send error: the receiver may already be dropped
        let _ = self.tx.send(event.clone());
    }
}
