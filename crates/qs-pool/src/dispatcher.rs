//! Round-robin dispatcher over a fixed set of specialists.
//!
//! The cursor lock serialises selection only; each claim is decided by the
//! candidate's own compare-and-swap, so a concurrent dispatcher racing on the
//! same specialist simply loses and moves on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use qs_core::{Request, ServiceTimeModel, SimRng, SpecialistGroup, SpecialistId};
use qs_queue::AdmissionBuffer;

use crate::{CompletionSink, PoolError, PoolResult, Specialist, SpecialistStats};

pub struct Dispatcher {
    specialists: Vec<Arc<Specialist>>,
    cursor:      Mutex<usize>,
    buffer:      Arc<AdmissionBuffer>,
    workers:     Mutex<Vec<(SpecialistId, JoinHandle<()>)>>,
    anomalies:   Arc<AtomicU64>,
}

impl Dispatcher {
    /// Spawn one worker thread per specialist and return a ready dispatcher.
    ///
    /// Each worker gets its own RNG stream derived from `rng`, so service
    /// times are reproducible for a seeded run regardless of thread timing.
    pub fn start(
        specialists: Vec<Specialist>,
        buffer: Arc<AdmissionBuffer>,
        sink: Arc<dyn CompletionSink>,
        rng: &mut SimRng,
    ) -> PoolResult<Self> {
        if specialists.is_empty() {
            return Err(PoolError::Empty);
        }
        let specialists: Vec<Arc<Specialist>> = specialists.into_iter().map(Arc::new).collect();
        let anomalies = Arc::new(AtomicU64::new(0));

        let mut workers = Vec::with_capacity(specialists.len());
        for (i, specialist) in specialists.iter().enumerate() {
            let specialist = Arc::clone(specialist);
            let sink = Arc::clone(&sink);
            let anomalies = Arc::clone(&anomalies);
            let worker_rng = rng.child(i as u64);
            let id = specialist.id();
            let handle = thread::Builder::new()
                .name(format!("specialist-{}", id.label()))
                .spawn(move || serve(specialist, worker_rng, sink, anomalies));
            match handle {
                Ok(h) => workers.push((id, h)),
                Err(e) => {
                    // Release the workers already running before bailing out.
                    for s in &specialists {
                        s.close();
                    }
                    for (_, h) in workers {
                        let _ = h.join();
                    }
                    return Err(PoolError::Spawn(e));
                }
            }
        }
        info!(specialists = specialists.len(), "dispatcher started");

        Ok(Self {
            specialists,
            cursor: Mutex::new(0),
            buffer,
            workers: Mutex::new(workers),
            anomalies,
        })
    }

    /// Build specialists from `groups` (ids assigned in group order, 0-based)
    /// and [`start`](Self::start) them.
    pub fn from_groups(
        groups: &[SpecialistGroup],
        buffer: Arc<AdmissionBuffer>,
        sink: Arc<dyn CompletionSink>,
        rng: &mut SimRng,
    ) -> PoolResult<Self> {
        let mut specialists = Vec::new();
        for group in groups {
            let service: Arc<dyn ServiceTimeModel> = Arc::new(group.service.clone());
            for _ in 0..group.count {
                let id = SpecialistId(specialists.len() as u32);
                specialists.push(Specialist::new(id, group.lambda, Arc::clone(&service)));
            }
        }
        Self::start(specialists, buffer, sink, rng)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn len(&self) -> usize {
        self.specialists.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specialists.is_empty()
    }

    pub fn specialist(&self, id: SpecialistId) -> Option<&Specialist> {
        self.specialists.get(id.index()).map(|s| s.as_ref())
    }

    pub fn any_available(&self) -> bool {
        self.specialists.iter().any(|s| s.is_available())
    }

    pub fn busy_count(&self) -> usize {
        self.specialists.iter().filter(|s| !s.is_available()).count()
    }

    /// Anomalies seen so far: refused assignments, service runs that found
    /// an empty slot, and workers that died mid-service.
    pub fn anomalies(&self) -> u64 {
        self.anomalies.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> Vec<SpecialistStats> {
        self.specialists.iter().map(|s| s.stats()).collect()
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Round-robin scan for an `Available` specialist.
    ///
    /// The cursor advances once per candidate examined, so consecutive calls
    /// start where the previous one stopped.  The result is advisory: the
    /// specialist may be claimed by someone else before the caller acts on
    /// it.  Use [`claim`](Self::claim) to select and assign atomically.
    pub fn select_available(&self) -> Option<SpecialistId> {
        let n = self.specialists.len();
        let mut cursor = self.cursor.lock();
        for _ in 0..n {
            let idx = *cursor;
            *cursor = (idx + 1) % n;
            if self.specialists[idx].is_available() {
                return Some(self.specialists[idx].id());
            }
        }
        None
    }

    /// Select an `Available` specialist round-robin and hand it `request` in
    /// one step.
    ///
    /// The request is removed from the admission buffer if it is still
    /// waiting there.  When every specialist is busy the request is returned
    /// to the caller unchanged.
    pub fn claim(&self, request: Arc<Request>) -> Result<SpecialistId, Arc<Request>> {
        let n = self.specialists.len();
        let mut request = request;
        let mut cursor = self.cursor.lock();
        for _ in 0..n {
            let idx = *cursor;
            *cursor = (idx + 1) % n;
            let specialist = &self.specialists[idx];
            if !specialist.is_available() {
                continue;
            }
            let id = request.id;
            match specialist.try_assign(request) {
                Ok(()) => {
                    drop(cursor);
                    self.buffer.remove(id);
                    debug!(specialist = specialist.id().label(), request = id.0, "dispatched");
                    return Ok(specialist.id());
                }
                Err(refusal) => request = refusal.into_request(),
            }
        }
        Err(request)
    }

    /// Hand `request` to a specific specialist.
    ///
    /// Removes the request from the admission buffer, assigns it, and wakes
    /// the specialist's worker; service runs in the background.  If the
    /// specialist is already busy the assignment is refused, counted as an
    /// anomaly, and the request comes back inside the error.
    pub fn dispatch(&self, request: Arc<Request>, specialist: SpecialistId) -> PoolResult<()> {
        let Some(target) = self.specialists.get(specialist.index()) else {
            return Err(PoolError::UnknownSpecialist(specialist));
        };
        let id = request.id;
        match target.take_request(request) {
            Ok(()) => {
                self.buffer.remove(id);
                debug!(specialist = specialist.label(), request = id.0, "dispatched");
                Ok(())
            }
            Err(e @ PoolError::AlreadyBusy { .. }) => {
                self.anomalies.fetch_add(1, Ordering::Relaxed);
                warn!(specialist = specialist.label(), request = id.0, "assignment to busy specialist refused");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Block until every specialist is `Available` or has lost its worker.
    pub fn wait_idle(&self) {
        for s in &self.specialists {
            s.wait_idle();
        }
    }

    /// Stop accepting work, let in-progress services finish, and join every
    /// worker thread.  Calling this more than once is harmless.
    pub fn shutdown(&self) -> PoolResult<()> {
        for s in &self.specialists {
            s.close();
        }
        let workers = std::mem::take(&mut *self.workers.lock());
        let mut first_err = None;
        for (id, handle) in workers {
            if handle.join().is_err() && first_err.is_none() {
                first_err = Some(PoolError::WorkerPanicked(id));
            }
        }
        debug!("dispatcher shut down");
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Workers exit on their own once closed; joining is left to shutdown().
        for s in &self.specialists {
            s.close();
        }
    }
}

/// Releases the specialist if its worker unwinds, so waiters wake and later
/// claims skip it.
struct WorkerGuard<'a> {
    specialist: &'a Specialist,
    anomalies:  &'a AtomicU64,
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.anomalies.fetch_add(1, Ordering::Relaxed);
            self.specialist.abandon();
        }
    }
}

fn serve(specialist: Arc<Specialist>, mut rng: SimRng, sink: Arc<dyn CompletionSink>, anomalies: Arc<AtomicU64>) {
    let _guard = WorkerGuard { specialist: &*specialist, anomalies: &*anomalies };
    while specialist.wait_for_work() {
        if let Err(e) = specialist.serve_one(&mut rng, sink.as_ref()) {
            anomalies.fetch_add(1, Ordering::Relaxed);
            warn!(specialist = specialist.id().label(), error = %e, "service anomaly");
        }
    }
    debug!(specialist = specialist.id().label(), "worker exiting");
}
