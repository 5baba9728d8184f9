//! `qs-stats`: run statistics and the metrics log.
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`aggregator`]  | `Aggregator`: locked counters, snapshots, rate limiting  |
//! | [`row`]         | `SnapshotRow`, `Totals`, CSV header/record formatting     |
//! | [`sink`]        | `MetricsSink` trait                                       |
//! | [`csv`]         | `CsvSink` backend                                         |
//! | [`emitter`]     | `SnapshotEmitter`: background writer thread              |
//! | [`error`]       | `StatsError`, `StatsResult<T>`                            |
//!
//! # Usage
//!
//! ```rust,ignore
//! use qs_stats::{Aggregator, CsvSink, SnapshotEmitter};
//!
//! let agg = Aggregator::new(3, Duration::from_millis(100));
//! let sink = CsvSink::from_path(Path::new("stats.csv"))?;
//! let emitter = SnapshotEmitter::spawn(Box::new(sink), 3)?;
//! if let Some(row) = agg.maybe_snapshot(&clock, Instant::now(), &lifetimes) {
//!     emitter.emit(row);
//! }
//! emitter.close()?;
//! ```

pub mod aggregator;
pub mod csv;
pub mod emitter;
pub mod error;
pub mod row;
pub mod sink;


pub use aggregator::Aggregator;
pub use crate::csv::CsvSink;
pub use emitter::{SnapshotEmitter, EMIT_QUEUE_CAPACITY};
pub use error::{StatsError, StatsResult};
pub use row::{header, SnapshotRow, Totals};
pub use sink::MetricsSink;
