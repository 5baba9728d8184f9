//! CSV metrics log backend.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::row::header;
use crate::sink::MetricsSink;
use crate::{SnapshotRow, StatsResult};

/// Writes the metrics log as CSV, one row per snapshot.  Every row is
/// flushed as soon as it is written.
pub struct CsvSink<W: Write = File> {
    writer:   Writer<W>,
    finished: bool,
}

impl CsvSink<File> {
    /// Create (or truncate) the log file at `path`.
    pub fn from_path(path: &Path) -> StatsResult<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer:   Writer::from_writer(inner),
            finished: false,
        }
    }
}

impl<W: Write + Send> MetricsSink for CsvSink<W> {
    fn write_header(&mut self, specialists: usize) -> StatsResult<()> {
        self.writer.write_record(header(specialists))?;
        // The header goes out immediately so an empty run still leaves a
        // well-formed file behind.
        self.writer.flush()?;
        Ok(())
    }

    fn write_row(&mut self, row: &SnapshotRow) -> StatsResult<()> {
        self.writer.write_record(row.to_record())?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> StatsResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}
