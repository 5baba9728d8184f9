//! Run observer trait for progress reporting and data collection.

use qs_core::{Request, SpecialistId};
use qs_pool::ServiceRecord;
use qs_stats::SnapshotRow;

use crate::RunReport;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] as the run progresses.
///
/// Hooks fire concurrently from the generation, processing, snapshot, and
/// specialist worker threads, so they take `&self` and the trait requires
/// `Send + Sync`.  All methods have default no-op implementations.
///
/// # Example: rejection counter
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Rejections(AtomicU64);
///
/// impl SimObserver for Rejections {
///     fn on_rejection(&self, _lost: &Request) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait SimObserver: Send + Sync {
    /// A client submitted `request`.
    fn on_arrival(&self, _request: &Request) {}

    /// `lost` was displaced from, or refused by, the admission buffer.
    fn on_rejection(&self, _lost: &Request) {}

    /// `request` was handed to `specialist`.
    fn on_dispatch(&self, _request: &Request, _specialist: SpecialistId) {}

    /// Called on the specialist's worker thread once the request is done,
    /// before the specialist becomes available again.  A panic here closes
    /// the specialist and fails the run.
    fn on_service_complete(&self, _record: &ServiceRecord) {}

    /// A snapshot row was produced (including the final one).
    fn on_snapshot(&self, _row: &SnapshotRow) {}

    /// Called once, after every thread has stopped.
    fn on_run_end(&self, _report: &RunReport) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
