//! baseline: the reference M/M/c run of the queuesim simulator.
//!
//! With no arguments, runs `SimConfig::default()`: 20 clients submitting a
//! request every 200 ms for 30 s, a 10-slot buffer that overwrites its newest
//! entry when full, and three exponential specialists (two at λ = 1.901, one
//! at λ = 1.005) draining it for 60 s.  Pass a JSON file to override any
//! subset of fields:
//!
//! ```text
//! cargo run --release -p baseline -- demos/baseline/configs/overload.json
//! RUST_LOG=qs_pool=trace cargo run -p baseline
//! ```
//!
//! The metrics log goes to `config.metrics_path`; the final report tables go
//! to stdout; logs go to stderr.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qs_core::SimConfig;
use qs_pool::ServiceRecord;
use qs_sim::{RunReport, SimBuilder, SimObserver};
use qs_stats::SnapshotRow;

// ── Observer ──────────────────────────────────────────────────────────────────

/// Counts snapshot rows and logs a progress line every `every` of them.
struct Progress {
    every:     u64,
    snapshots: AtomicU64,
    served:    AtomicU64,
}

impl SimObserver for Progress {
    fn on_service_complete(&self, _record: &ServiceRecord) {
        self.served.fetch_add(1, Ordering::Relaxed);
    }

    fn on_snapshot(&self, row: &SnapshotRow) {
        let n = self.snapshots.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.every == 0 {
            info!(
                total = row.total,
                rejected = row.rejected,
                served = self.served.load(Ordering::Relaxed),
                p_reject = format_args!("{:.4}", row.rejection_probability),
                "progress"
            );
        }
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_thread_names(true))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

// ── Report rendering ──────────────────────────────────────────────────────────

fn fmt_duration(d: Duration) -> String {
    format!("{:.3?}", d)
}

fn print_report(report: &RunReport) {
    println!("Stats for Specialists:");
    println!(
        "{:<5} {:<15} {:<15} {:<20} {:<15} {:<15}",
        "ID", "WorkTime", "Lambda", "ProcessedRequests", "LoadPercentage", "LoadPercentageByTime"
    );
    for s in &report.specialists {
        println!(
            "{:<5} {:<15} {:<15.4} {:<20} {:<15.2} {:<15.2}",
            s.id.label(),
            fmt_duration(s.work_time),
            s.lambda,
            s.processed,
            s.load_pct,
            s.utilization * 100.0,
        );
    }

    let sys = &report.system;
    println!();
    println!("Stats for System:");
    println!(
        "{:<20} {:<20} {:<20} {:<20} {:<20}",
        "TotalRequests", "RejectedRequests", "TotalBufferTime", "TotalProcessingTime", "TotalSystemTime"
    );
    println!(
        "{:<20} {:<20} {:<20} {:<20} {:<20}",
        sys.total,
        sys.rejected,
        fmt_duration(sys.buffer_time),
        fmt_duration(sys.processing_time),
        fmt_duration(sys.uptime),
    );

    if report.unserved > 0 || report.anomalies > 0 || report.dropped_snapshot_rows > 0 {
        println!();
        println!(
            "unserved: {}  anomalies: {}  dropped snapshot rows: {}",
            report.unserved, report.anomalies, report.dropped_snapshot_rows
        );
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();

    let arg = std::env::args().nth(1);
    let config = load_config(arg.as_deref().map(Path::new))?;
    info!(
        specialists = config.specialist_count(),
        capacity = config.buffer_capacity,
        clients = config.client_count,
        metrics = %config.metrics_path.display(),
        "=== baseline: queuesim ==="
    );

    let sim = SimBuilder::new(config).build().context("building simulation")?;
    let progress = Arc::new(Progress {
        every:     50,
        snapshots: AtomicU64::new(0),
        served:    AtomicU64::new(0),
    });
    let report = sim.run(progress.clone())?;

    info!(snapshots = progress.snapshots.load(Ordering::Relaxed), "metrics log complete");
    print_report(&report);
    Ok(())
}
