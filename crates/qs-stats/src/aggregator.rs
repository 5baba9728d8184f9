//! `Aggregator`: cumulative run counters behind one lock.
//!
//! Per-specialist counters are plain `Vec`s indexed by the dense specialist
//! slot.  Every `record_*` call takes the lock once; snapshots copy out
//! under the same lock, so a row never mixes counters from different
//! moments.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{trace, warn};

use qs_core::{RunClock, SpecialistId};

use crate::{SnapshotRow, Totals};

struct Counters {
    totals:        Totals,
    last_snapshot: Instant,
}

pub struct Aggregator {
    inner:        Mutex<Counters>,
    min_interval: Duration,
}

impl Aggregator {
    /// Counters for a pool of `specialists`.  Rate-limited snapshots are
    /// spaced at least `min_interval` apart, measured from construction for
    /// the first one.
    pub fn new(specialists: usize, min_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Counters {
                totals:        Totals {
                    usage: vec![0; specialists],
                    busy: vec![Duration::ZERO; specialists],
                    ..Totals::default()
                },
                last_snapshot: Instant::now(),
            }),
            min_interval,
        }
    }

    pub fn specialists(&self) -> usize {
        self.inner.lock().totals.usage.len()
    }

    // ── Recording ─────────────────────────────────────────────────────────

    pub fn record_arrival(&self) {
        self.inner.lock().totals.total += 1;
    }

    pub fn record_rejection(&self) {
        self.inner.lock().totals.rejected += 1;
    }

    pub fn record_buffer_wait(&self, wait: Duration) {
        self.inner.lock().totals.buffer_wait += wait;
    }

    pub fn record_processing_time(&self, work: Duration) {
        self.inner.lock().totals.processing += work;
    }

    pub fn record_specialist_usage(&self, id: SpecialistId) {
        let mut inner = self.inner.lock();
        match inner.totals.usage.get_mut(id.index()) {
            Some(n) => *n += 1,
            None => warn!(specialist = id.label(), "usage recorded for unknown specialist"),
        }
    }

    pub fn record_specialist_busy_time(&self, id: SpecialistId, busy: Duration) {
        let mut inner = self.inner.lock();
        match inner.totals.busy.get_mut(id.index()) {
            Some(d) => *d += busy,
            None => warn!(specialist = id.label(), "busy time recorded for unknown specialist"),
        }
    }

    // ── Reading ───────────────────────────────────────────────────────────

    pub fn totals(&self) -> Totals {
        self.inner.lock().totals.clone()
    }

    /// Compute a row from the current counters.
    ///
    /// `lifetimes[i]` is the creation instant of specialist slot `i`;
    /// utilization is its busy time over `now - lifetimes[i]`, clamped to
    /// `[0, 1]`.  Slots without a lifetime report 0.
    pub fn snapshot(&self, clock: &RunClock, now: Instant, lifetimes: &[Instant]) -> SnapshotRow {
        let totals = self.totals();
        build_row(&totals, clock, now, lifetimes)
    }

    /// Like [`snapshot`](Self::snapshot), but only if at least the minimum
    /// interval has passed since the previous rate-limited snapshot.
    pub fn maybe_snapshot(&self, clock: &RunClock, now: Instant, lifetimes: &[Instant]) -> Option<SnapshotRow> {
        let mut inner = self.inner.lock();
        if now.saturating_duration_since(inner.last_snapshot) < self.min_interval {
            return None;
        }
        inner.last_snapshot = now;
        let row = build_row(&inner.totals, clock, now, lifetimes);
        drop(inner);
        trace!(total = row.total, rejected = row.rejected, "snapshot taken");
        Some(row)
    }
}

fn build_row(totals: &Totals, clock: &RunClock, now: Instant, lifetimes: &[Instant]) -> SnapshotRow {
    let accepted = totals.accepted();
    let per_accepted_ms = |d: Duration| {
        if accepted == 0 {
            0.0
        } else {
            d.as_secs_f64() * 1_000.0 / accepted as f64
        }
    };
    let rejection_probability = if totals.total == 0 {
        0.0
    } else {
        totals.rejected as f64 / totals.total as f64
    };
    let utilization = totals
        .busy
        .iter()
        .enumerate()
        .map(|(i, busy)| match lifetimes.get(i) {
            Some(&created) => utilization(*busy, now.saturating_duration_since(created)),
            None => 0.0,
        })
        .collect();

    SnapshotRow {
        timestamp: clock.wall_time(now),
        total: totals.total,
        rejected: totals.rejected,
        rejection_probability,
        avg_buffer_ms: per_accepted_ms(totals.buffer_wait),
        avg_processing_ms: per_accepted_ms(totals.processing),
        utilization,
    }
}

/// `busy / alive`, clamped to `[0, 1]`; 0 for a zero-length lifetime.
pub fn utilization(busy: Duration, alive: Duration) -> f64 {
    if alive.is_zero() {
        return 0.0;
    }
    (busy.as_secs_f64() / alive.as_secs_f64()).clamp(0.0, 1.0)
}
