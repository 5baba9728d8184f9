//! Completion callback invoked by worker threads.

use crate::ServiceRecord;

/// Receives one [`ServiceRecord`] per finished service.
///
/// Called on the specialist's worker thread once the request is complete but
/// before the specialist returns to `Available`.  Implementations must be
/// thread-safe and should not block for long: the specialist takes no new
/// request until the call returns.  A panic here closes the specialist.
pub trait CompletionSink: Send + Sync + 'static {
    fn on_complete(&self, record: &ServiceRecord);
}

/// A [`CompletionSink`] that ignores every record.
pub struct NoopCompletion;

impl CompletionSink for NoopCompletion {
    fn on_complete(&self, _record: &ServiceRecord) {}
}

impl<F> CompletionSink for F
where
    F: Fn(&ServiceRecord) + Send + Sync + 'static,
{
    fn on_complete(&self, record: &ServiceRecord) {
        self(record)
    }
}
