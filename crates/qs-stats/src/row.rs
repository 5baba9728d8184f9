//! Plain data row types produced by the aggregator.

use std::time::Duration;

use chrono::{DateTime, Utc};

use qs_core::time::format_timestamp;

/// One line of the metrics log.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub timestamp:             DateTime<Utc>,
    pub total:                 u64,
    pub rejected:              u64,
    /// `rejected / total`, 0 when nothing has arrived.
    pub rejection_probability: f64,
    /// Mean buffer wait over accepted requests, milliseconds.
    pub avg_buffer_ms:         f64,
    /// Mean processing time over accepted requests, milliseconds.
    pub avg_processing_ms:     f64,
    /// Busy fraction of each specialist's lifetime, indexed by slot.
    pub utilization:           Vec<f64>,
}

impl SnapshotRow {
    /// Format as CSV fields: 4 decimals for ratios, 6 for millisecond means.
    pub fn to_record(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(6 + self.utilization.len());
        fields.push(format_timestamp(self.timestamp));
        fields.push(self.total.to_string());
        fields.push(self.rejected.to_string());
        fields.push(format!("{:.4}", self.rejection_probability));
        fields.push(format!("{:.6}", self.avg_buffer_ms));
        fields.push(format!("{:.6}", self.avg_processing_ms));
        fields.extend(self.utilization.iter().map(|u| format!("{u:.4}")));
        fields
    }
}

/// Metrics log header for a pool of `specialists`.  Specialists are numbered
/// from 1.
pub fn header(specialists: usize) -> Vec<String> {
    let mut cols: Vec<String> = [
        "Timestamp",
        "TotalRequests",
        "RejectedRequests",
        "ProbabilityOfRejection",
        "AverageBufferTime",
        "AverageProcessingTime",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    cols.extend((1..=specialists).map(|i| format!("Specialist{i}WorkTimeRatio")));
    cols
}

/// Raw cumulative counters, copied out of the aggregator for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub total:       u64,
    pub rejected:    u64,
    pub buffer_wait: Duration,
    pub processing:  Duration,
    /// Dispatches per specialist slot.
    pub usage:       Vec<u64>,
    /// Accumulated service time per specialist slot.
    pub busy:        Vec<Duration>,
}

impl Totals {
    /// Requests that were admitted and not lost to the buffer.
    #[inline]
    pub fn accepted(&self) -> u64 {
        self.total.saturating_sub(self.rejected)
    }
}
