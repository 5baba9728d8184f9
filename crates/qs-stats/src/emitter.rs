//! `SnapshotEmitter`: hands snapshot rows to a dedicated writer thread.
//!
//! Producers call [`emit`](SnapshotEmitter::emit), which never blocks: when
//! the queue is full the row is dropped and counted.  Sink errors are logged
//! on the writer thread, the first one is kept, and it is returned from
//! [`close`](SnapshotEmitter::close).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::{MetricsSink, SnapshotRow, StatsError, StatsResult};

/// Rows that may be waiting for the writer thread at once.
pub const EMIT_QUEUE_CAPACITY: usize = 100;

pub struct SnapshotEmitter {
    tx:      Mutex<Option<Sender<SnapshotRow>>>,
    handle:  Mutex<Option<JoinHandle<StatsResult<u64>>>>,
    dropped: Arc<AtomicU64>,
}

impl SnapshotEmitter {
    /// Write the header for `specialists` synchronously, then start the
    /// writer thread.  A header failure is returned before any thread runs.
    pub fn spawn(sink: Box<dyn MetricsSink>, specialists: usize) -> StatsResult<Self> {
        Self::with_capacity(sink, specialists, EMIT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(mut sink: Box<dyn MetricsSink>, specialists: usize, capacity: usize) -> StatsResult<Self> {
        sink.write_header(specialists)?;
        let (tx, rx) = bounded::<SnapshotRow>(capacity);
        let handle = thread::Builder::new()
            .name("metrics-writer".into())
            .spawn(move || {
                let mut written = 0u64;
                let mut first_err: Option<StatsError> = None;
                for row in rx.iter() {
                    match sink.write_row(&row) {
                        Ok(()) => written += 1,
                        Err(e) => {
                            error!(error = %e, "metrics row write failed");
                            first_err.get_or_insert(e);
                        }
                    }
                }
                if let Err(e) = sink.finish() {
                    error!(error = %e, "metrics log flush failed");
                    first_err.get_or_insert(e);
                }
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(written),
                }
            })?;
        Ok(Self {
            tx:      Mutex::new(Some(tx)),
            handle:  Mutex::new(Some(handle)),
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Queue `row` for writing.  Returns `false` if the row was dropped.
    pub fn emit(&self, row: SnapshotRow) -> bool {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        match tx.try_send(row) {
            Ok(()) => {
                debug!("snapshot queued");
                true
            }
            Err(TrySendError::Full(_)) => {
                let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped = n, "metrics queue full; snapshot row dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("metrics writer gone; snapshot row dropped");
                false
            }
        }
    }

    /// Rows dropped so far because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting rows, drain the queue, flush the sink, and join the
    /// writer thread.  Returns the number of rows written.  Later calls
    /// return `Ok(0)`.
    pub fn close(&self) -> StatsResult<u64> {
        drop(self.tx.lock().take());
        let Some(handle) = self.handle.lock().take() else {
            return Ok(0);
        };
        let written = handle.join().map_err(|_| StatsError::WriterPanicked)??;
        debug!(written, dropped = self.dropped(), "metrics writer closed");
        Ok(written)
    }
}

impl Drop for SnapshotEmitter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(error = %e, "metrics writer failed during drop");
        }
    }
}
