//! Run clock.
//!
//! The simulator runs in real time.  Durations are measured with the
//! monotonic `Instant`; timestamps written to the metrics log are derived by
//! adding the elapsed monotonic time to a wall-clock anchor taken once at
//! start, so rows stay ordered even if the system clock is adjusted mid-run.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

/// Monotonic start instant paired with its wall-clock equivalent.
#[derive(Copy, Clone, Debug)]
pub struct RunClock {
    started:      Instant,
    started_wall: DateTime<Utc>,
}

impl RunClock {
    /// Start a clock now.
    pub fn start() -> Self {
        Self {
            started:      Instant::now(),
            started_wall: Utc::now(),
        }
    }

    #[inline]
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since `start()`.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock timestamp corresponding to a monotonic instant.
    ///
    /// Instants taken before the clock started map to the start timestamp.
    pub fn wall_time(&self, at: Instant) -> DateTime<Utc> {
        let since = at.saturating_duration_since(self.started);
        match chrono::Duration::from_std(since) {
            Ok(d) => self.started_wall + d,
            Err(_) => self.started_wall,
        }
    }

    /// RFC 3339 timestamp with nanoseconds, e.g. `2024-05-01T12:00:00.123456789Z`.
    pub fn timestamp(&self, at: Instant) -> String {
        format_timestamp(self.wall_time(at))
    }
}

impl fmt::Display for RunClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run started {} (+{:?})", format_timestamp(self.started_wall), self.elapsed())
    }
}

/// Sortable RFC 3339 form used by the metrics log.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
