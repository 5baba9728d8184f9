//! The `Sim` struct and its run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{error, info};

use qs_core::{Client, RequestIdGenerator, RunClock, SimConfig, SimRng};
use qs_pool::{CompletionSink, Dispatcher, ServiceRecord, Specialist};
use qs_queue::AdmissionBuffer;
use qs_stats::{Aggregator, SnapshotEmitter};

use crate::loops::{self, RunContext};
use crate::report::{specialist_reports, RunReport, SystemReport};
use crate::{SimError, SimObserver, SimResult};

// ── Completion bookkeeping ────────────────────────────────────────────────────

/// Records each finished service into the aggregator, then tells the
/// observer.  Runs on the specialist's worker thread.
struct RecordCompletion {
    stats:    Arc<Aggregator>,
    observer: Arc<dyn SimObserver>,
}

impl CompletionSink for RecordCompletion {
    fn on_complete(&self, record: &ServiceRecord) {
        self.stats.record_processing_time(record.work);
        self.stats.record_specialist_busy_time(record.specialist, record.work);
        self.observer.on_service_complete(record);
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// A configured, not yet started simulation run.
///
/// Create via [`SimBuilder`][crate::SimBuilder]; consume with
/// [`run`](Self::run).
pub struct Sim {
    pub(crate) config:      SimConfig,
    pub(crate) buffer:      Arc<AdmissionBuffer>,
    pub(crate) specialists: Vec<Specialist>,
    pub(crate) stats:       Arc<Aggregator>,
    pub(crate) emitter:     SnapshotEmitter,
    pub(crate) clients:     Vec<Client>,
    pub(crate) ids:         RequestIdGenerator,
    pub(crate) rng:         SimRng,
}

impl Sim {
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run the generation and processing loops to their deadlines, wait for
    /// every in-progress service, and return the final report.
    ///
    /// Blocks the calling thread for at least the longer of the two
    /// configured durations.
    pub fn run(mut self, observer: Arc<dyn SimObserver>) -> SimResult<RunReport> {
        let lifetimes: Vec<Instant> = self.specialists.iter().map(|s| s.created_at()).collect();
        let completion = Arc::new(RecordCompletion {
            stats:    Arc::clone(&self.stats),
            observer: Arc::clone(&observer),
        });
        let specialists = std::mem::take(&mut self.specialists);
        let dispatcher = match Dispatcher::start(specialists, Arc::clone(&self.buffer), completion, &mut self.rng) {
            Ok(d) => d,
            Err(e) => {
                let _ = self.emitter.close();
                return Err(e.into());
            }
        };
        let generation_rng = self.rng.child(0);

        let clock = RunClock::start();
        let ctx = RunContext {
            config:     &self.config,
            clock:      &clock,
            ids:        &self.ids,
            clients:    &self.clients,
            buffer:     &self.buffer,
            dispatcher: &dispatcher,
            stats:      &self.stats,
            emitter:    &self.emitter,
            observer:   observer.as_ref(),
            lifetimes:  &lifetimes,
        };
        info!(
            specialists = dispatcher.len(),
            capacity = self.config.buffer_capacity,
            policy = ?self.config.overflow,
            generation_ms = self.config.generation_ms,
            processing_ms = self.config.processing_ms,
            "run started"
        );

        let loops = drive(&ctx, generation_rng);
        let held = match loops {
            Ok(held) => held,
            Err(e) => {
                error!(error = %e, "run aborted");
                let _ = dispatcher.shutdown();
                let _ = self.emitter.close();
                return Err(e);
            }
        };

        loops::final_snapshot(&ctx);
        let uptime = clock.elapsed();
        let anomalies = dispatcher.anomalies();
        let stats = dispatcher.stats();
        if let Err(e) = dispatcher.shutdown() {
            error!(error = %e, "specialist worker failed");
            let _ = self.emitter.close();
            return Err(e.into());
        }
        self.emitter.close()?;

        let totals = self.stats.totals();
        let report = RunReport {
            specialists:           specialist_reports(&stats, &totals, Instant::now()),
            system:                SystemReport {
                total:           totals.total,
                rejected:        totals.rejected,
                buffer_time:     totals.buffer_wait,
                processing_time: totals.processing,
                uptime,
            },
            anomalies,
            dropped_snapshot_rows: self.emitter.dropped(),
            unserved:              held + self.buffer.len() as u64,
        };
        info!(
            total = report.system.total,
            rejected = report.system.rejected,
            completed = report.completed(),
            unserved = report.unserved,
            "run finished"
        );
        observer.on_run_end(&report);
        Ok(report)
    }
}

/// Run the three loops on scoped threads and join them.  Returns the number
/// of requests the processing loop was still holding.
fn drive(ctx: &RunContext<'_>, generation_rng: SimRng) -> SimResult<u64> {
    let started = ctx.clock.started();
    let generation_deadline = started + ctx.config.generation_duration();
    let processing_deadline = started + ctx.config.processing_duration();
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        let generation = thread::Builder::new()
            .name("generation".into())
            .spawn_scoped(s, move || loops::generation_loop(ctx, generation_deadline, generation_rng))
            .map_err(|source| SimError::Spawn { what: "generation", source })?;
        let processing = thread::Builder::new()
            .name("processing".into())
            .spawn_scoped(s, move || loops::processing_loop(ctx, processing_deadline))
            .map_err(|source| SimError::Spawn { what: "processing", source })?;
        let stop = &stop;
        let snapshots = thread::Builder::new()
            .name("snapshots".into())
            .spawn_scoped(s, move || loops::snapshot_loop(ctx, stop))
            .map_err(|source| SimError::Spawn { what: "snapshot", source })?;

        let generated = generation.join();
        let held = processing.join();
        ctx.dispatcher.wait_idle();
        stop.store(true, Ordering::Release);
        let ticker = snapshots.join();

        generated.map_err(|_| SimError::LoopPanicked("generation"))?;
        ticker.map_err(|_| SimError::LoopPanicked("snapshot"))?;
        held.map_err(|_| SimError::LoopPanicked("processing"))
    })
}
