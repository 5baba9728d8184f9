//! Run configuration.
//!
//! Loaded once at startup (typically from JSON by the application binary)
//! and immutable for the rest of the run.  All durations are integer
//! milliseconds on the wire; use the `Duration` accessors in code.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ArrivalProcess, CoreError, CoreResult, ServiceTime};

// ── OverflowPolicy ────────────────────────────────────────────────────────────

/// What the admission buffer does with an arrival when every slot is taken.
///
/// Every policy counts exactly one rejection per overflowing arrival; they
/// differ in *which* request is lost.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Overwrite the most recently inserted request with the newcomer.
    #[default]
    ReplaceNewest,
    /// Drop the request at the head of the queue and append the newcomer.
    EvictOldest,
    /// Leave the buffer untouched and drop the newcomer.
    RejectIncoming,
}

// ── SpecialistGroup ───────────────────────────────────────────────────────────

/// `count` specialists sharing one rate parameter and service strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialistGroup {
    pub count:   u32,
    pub lambda:  f64,
    #[serde(default)]
    pub service: ServiceTime,
}

impl SpecialistGroup {
    pub fn new(count: u32, lambda: f64, service: ServiceTime) -> Self {
        Self { count, lambda, service }
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Inter-arrival process of the generation loop.
    pub arrival: ArrivalProcess,

    /// Specialist groups; ids are assigned densely in group order.
    pub groups: Vec<SpecialistGroup>,

    /// Number of slots in the admission buffer.  Must be at least 1.
    pub buffer_capacity: usize,

    /// Buffer behavior when full.
    pub overflow: OverflowPolicy,

    /// Size of the client population requests are attributed to.
    pub client_count: u32,

    /// How long the generation loop runs.
    pub generation_ms: u64,

    /// How long the processing loop runs.  Usually longer than
    /// `generation_ms` so the buffer can drain.
    pub processing_ms: u64,

    /// Back-off of the processing loop when the buffer is empty, no
    /// specialist is free, or after a dispatch.
    pub processing_pause_ms: u64,

    /// How often the snapshot ticker wakes up.
    pub snapshot_poll_ms: u64,

    /// Minimum spacing between two materialized snapshots.
    pub snapshot_interval_ms: u64,

    /// Destination of the metrics CSV log.
    pub metrics_path: PathBuf,

    /// Master seed.  `None` seeds from OS entropy (the normal case; runs are
    /// not meant to be reproducible).
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arrival:              ArrivalProcess::default(),
            groups:               vec![
                SpecialistGroup::new(2, 1.901, ServiceTime::Exponential),
                SpecialistGroup::new(1, 1.005, ServiceTime::Exponential),
            ],
            buffer_capacity:      10,
            overflow:             OverflowPolicy::default(),
            client_count:         20,
            generation_ms:        30_000,
            processing_ms:        60_000,
            processing_pause_ms:  100,
            snapshot_poll_ms:     10,
            snapshot_interval_ms: 100,
            metrics_path:         PathBuf::from("stats.csv"),
            seed:                 None,
        }
    }
}

impl SimConfig {
    /// Total number of specialists across all groups.
    pub fn specialist_count(&self) -> usize {
        self.groups.iter().map(|g| g.count as usize).sum()
    }

    #[inline]
    pub fn generation_duration(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }

    #[inline]
    pub fn processing_duration(&self) -> Duration {
        Duration::from_millis(self.processing_ms)
    }

    #[inline]
    pub fn processing_pause(&self) -> Duration {
        Duration::from_millis(self.processing_pause_ms)
    }

    #[inline]
    pub fn snapshot_poll(&self) -> Duration {
        Duration::from_millis(self.snapshot_poll_ms)
    }

    #[inline]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    /// Reject configurations the simulator cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.buffer_capacity == 0 {
            return Err(CoreError::Config("buffer_capacity must be at least 1".into()));
        }
        if self.client_count == 0 {
            return Err(CoreError::Config("client_count must be at least 1".into()));
        }
        if self.specialist_count() == 0 {
            return Err(CoreError::Config("at least one specialist is required".into()));
        }
        if self.snapshot_poll_ms == 0 {
            return Err(CoreError::Config("snapshot_poll_ms must be at least 1".into()));
        }
        self.arrival.validate()?;
        for group in &self.groups {
            group.service.validate(group.lambda)?;
        }
        Ok(())
    }
}
