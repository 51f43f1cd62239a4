//! Progress reporting for long-running operations.
//!
//! The scanner and organizer write [`ProgressEvent`]s to a [`ProgressSink`]. A
//! sink can be a closure, an `mpsc::Sender` draining into another thread, or
//! [`NoProgress`]. Sinks may also report cancellation; the core checks it
//! between files.

use std::sync::mpsc::Sender;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub message: String,
    pub current: usize,
    pub total: usize,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>, current: usize, total: usize) -> Self {
        debug_assert!(current <= total);
        Self {
            message: message.into(),
            current,
            total,
        }
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    /// Called for each event, in order.
    fn emit(&self, event: ProgressEvent);

    /// Polled between files. Returning true stops the operation.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent),
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for Sender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // A dropped receiver just means nobody is watching anymore.
        let _ = self.send(event);
    }
}
