//! The `MetricsSink` trait implemented by metrics log backends.

use crate::{SnapshotRow, StatsResult};

/// Destination for snapshot rows.
///
/// Driven from the [`SnapshotEmitter`](crate::SnapshotEmitter) writer
/// thread, never from the simulation loops, so implementations may block on
/// I/O.
pub trait MetricsSink: Send {
    /// Write the column header for a pool of `specialists`.
    fn write_header(&mut self, specialists: usize) -> StatsResult<()>;

    fn write_row(&mut self, row: &SnapshotRow) -> StatsResult<()>;

    /// Flush and close the underlying handle.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> StatsResult<()>;
}
