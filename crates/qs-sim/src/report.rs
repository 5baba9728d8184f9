//! End-of-run report values.  Rendering is left to the caller.

use std::time::{Duration, Instant};

use qs_core::SpecialistId;
use qs_pool::SpecialistStats;
use qs_stats::Totals;
use qs_stats::aggregator::utilization;

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistReport {
    pub id:          SpecialistId,
    /// Cumulative service time.
    pub work_time:   Duration,
    pub lambda:      f64,
    pub processed:   u64,
    /// Share of accepted requests this specialist completed, in percent.
    pub load_pct:    f64,
    /// Busy fraction of the specialist's lifetime, in `[0, 1]`.
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemReport {
    pub total:           u64,
    pub rejected:        u64,
    pub buffer_time:     Duration,
    pub processing_time: Duration,
    pub uptime:          Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub system:                SystemReport,
    pub specialists:           Vec<SpecialistReport>,
    /// Refused assignments and empty-slot service runs.
    pub anomalies:             u64,
    /// Snapshot rows lost because the metrics queue was full.
    pub dropped_snapshot_rows: u64,
    /// Requests still queued or held when the loops stopped.
    pub unserved:              u64,
}

impl RunReport {
    pub fn completed(&self) -> u64 {
        self.specialists.iter().map(|s| s.processed).sum()
    }
}

pub(crate) fn specialist_reports(stats: &[SpecialistStats], totals: &Totals, now: Instant) -> Vec<SpecialistReport> {
    let accepted = totals.accepted();
    stats
        .iter()
        .map(|s| SpecialistReport {
            id:          s.id,
            work_time:   s.busy_total,
            lambda:      s.lambda,
            processed:   s.processed,
            load_pct:    if accepted == 0 {
                0.0
            } else {
                s.processed as f64 / accepted as f64 * 100.0
            },
            utilization: utilization(s.busy_total, now.saturating_duration_since(s.created_at)),
        })
        .collect()
}
