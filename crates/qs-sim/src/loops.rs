//! The three long-running loops of a run.
//!
//! Each loop checks its deadline (or stop flag) once per iteration and never
//! holds a lock across a sleep.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use qs_core::{Client, Request, RequestIdGenerator, RunClock, SimConfig, SimRng};
use qs_pool::Dispatcher;
use qs_queue::{Admission, AdmissionBuffer};
use qs_stats::{Aggregator, SnapshotEmitter};

use crate::SimObserver;

/// Borrowed view of everything the loops share.
pub(crate) struct RunContext<'a> {
    pub config:     &'a SimConfig,
    pub clock:      &'a RunClock,
    pub ids:        &'a RequestIdGenerator,
    pub clients:    &'a [Client],
    pub buffer:     &'a AdmissionBuffer,
    pub dispatcher: &'a Dispatcher,
    pub stats:      &'a Aggregator,
    pub emitter:    &'a SnapshotEmitter,
    pub observer:   &'a dyn SimObserver,
    /// Creation instant per specialist slot.
    pub lifetimes:  &'a [Instant],
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Submit requests from random clients until `deadline`.  Returns the number
/// generated.
pub(crate) fn generation_loop(ctx: &RunContext<'_>, deadline: Instant, mut rng: SimRng) -> u64 {
    let mut generated = 0u64;
    while Instant::now() < deadline {
        let Some(client) = rng.choose(ctx.clients) else {
            warn!("no clients; generation loop stopping");
            break;
        };
        admit(ctx, client.submit(ctx.ids));
        generated += 1;

        let pause = ctx.config.arrival.next_interval(&mut rng);
        thread::sleep(pause.min(deadline.saturating_duration_since(Instant::now())));
    }
    info!(generated, "generation loop finished");
    generated
}

/// Record the arrival of `request`, then hand it straight to a free
/// specialist or, failing that, to the admission buffer.
pub(crate) fn admit(ctx: &RunContext<'_>, request: Arc<Request>) {
    ctx.stats.record_arrival();
    ctx.observer.on_arrival(&request);

    let request = match ctx.dispatcher.claim(Arc::clone(&request)) {
        Ok(specialist) => {
            ctx.stats.record_buffer_wait(request.created_at.elapsed());
            ctx.stats.record_specialist_usage(specialist);
            ctx.observer.on_dispatch(&request, specialist);
            return;
        }
        Err(request) => request,
    };

    match ctx.buffer.add(request) {
        Admission::Enqueued => {}
        Admission::Displaced(lost) | Admission::Refused(lost) => {
            ctx.stats.record_rejection();
            ctx.observer.on_rejection(&lost);
            debug!(request = lost.id.0, "request rejected by buffer");
        }
    }
}

// ── Processing ────────────────────────────────────────────────────────────────

/// Move buffered requests to free specialists until `deadline`.
///
/// A request dequeued while every specialist is busy is held and retried
/// after a pause rather than dropped.  Returns the number of requests still
/// held when the deadline passed (0 or 1).
pub(crate) fn processing_loop(ctx: &RunContext<'_>, deadline: Instant) -> u64 {
    let pause = ctx.config.processing_pause();
    let mut held: Option<Arc<Request>> = None;
    let mut dispatched = 0u64;

    while Instant::now() < deadline {
        let Some(request) = held.take().or_else(|| ctx.buffer.next()) else {
            thread::sleep(pause);
            continue;
        };

        match ctx.dispatcher.claim(Arc::clone(&request)) {
            Ok(specialist) => {
                ctx.stats.record_buffer_wait(request.created_at.elapsed());
                ctx.stats.record_specialist_usage(specialist);
                ctx.observer.on_dispatch(&request, specialist);
                dispatched += 1;
            }
            Err(request) => held = Some(request),
        }
        thread::sleep(pause);
    }

    let held = u64::from(held.is_some());
    info!(dispatched, held, "processing loop finished");
    held
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

/// Poll the aggregator until `stop` is set, emitting every rate-limited
/// snapshot it produces.
pub(crate) fn snapshot_loop(ctx: &RunContext<'_>, stop: &AtomicBool) {
    let poll = ctx.config.snapshot_poll();
    while !stop.load(Ordering::Acquire) {
        thread::sleep(poll);
        if let Some(row) = ctx.stats.maybe_snapshot(ctx.clock, Instant::now(), ctx.lifetimes) {
            ctx.observer.on_snapshot(&row);
            ctx.emitter.emit(row);
        }
    }
}

/// Take an unconditional snapshot now and emit it.
pub(crate) fn final_snapshot(ctx: &RunContext<'_>) {
    let row = ctx.stats.snapshot(ctx.clock, Instant::now(), ctx.lifetimes);
    ctx.observer.on_snapshot(&row);
    ctx.emitter.emit(row);
}
