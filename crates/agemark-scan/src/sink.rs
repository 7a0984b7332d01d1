//! Thread-safe collection and streaming of scan records.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agemark_core::ScanRecord;

use crate::event::ScanEvent;

#[derive(Debug, Default)]
struct SinkState {
    records: Vec<ScanRecord>,
    sealed: bool,
}

/// Append-only collector of findings and errors.
///
/// Every accepted record is stored for the final result and, when a stream is
/// attached, forwarded as a [`ScanEvent`] in the same order. Once the scan's
/// token is cancelled or the sink is sealed, records are rejected.
#[derive(Debug)]
pub struct ResultSink {
    state: Mutex<SinkState>,
    events: Option<mpsc::UnboundedSender<ScanEvent>>,
    token: CancellationToken,
}

impl ResultSink {
    /// Create a collecting sink without a stream.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            state: Mutex::new(SinkState::default()),
            events: None,
            token,
        }
    }

    /// Create a sink that also streams every event to `events`.
    pub fn streaming(token: CancellationToken, events: mpsc::UnboundedSender<ScanEvent>) -> Self {
        Self {
            events: Some(events),
            ..Self::new(token)
        }
    }

    /// Append a record. Returns `false` if the scan was cancelled first.
    pub fn record(&self, record: impl Into<ScanRecord>) -> bool {
        let mut state = self.lock();
        if state.sealed || self.token.is_cancelled() {
            return false;
        }

        let record = record.into();
        // Sent under the lock so the stream order matches the stored order.
        self.emit(ScanEvent::Record(record.clone()));
        state.records.push(record);
        true
    }

    /// Stop accepting records. After this returns no record can be added.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    /// Send a lifecycle event to the stream, bypassing cancellation.
    pub fn emit(&self, event: ScanEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }

    /// Number of records accepted so far.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every accepted record, in arrival order.
    pub fn drain(&self) -> Vec<ScanRecord> {
        std::mem::take(&mut self.lock().records)
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        // Records are pushed atomically, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
