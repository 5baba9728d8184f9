//! A single specialist: a two-state machine plus the slot it serves from.
//!
//! The `Available → Busy` edge is a compare-and-swap performed while holding
//! the specialist's own slot lock, and the `Busy → Available` edge is a plain
//! store under the same lock.  A specialist therefore never holds more than
//! one request, and nothing outside this type can observe `Busy` with an
//! empty slot.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use qs_core::{ClientId, Request, RequestId, RequestStatus, ServiceTimeModel, SimRng, SpecialistId};

use crate::{CompletionSink, NoopCompletion, PoolError, PoolResult};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SpecialistState {
    Available,
    Busy,
}

impl fmt::Display for SpecialistState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpecialistState::Available => "available",
            SpecialistState::Busy => "busy",
        })
    }
}

/// Outcome of one completed service.
#[derive(Clone, Debug)]
pub struct ServiceRecord {
    pub specialist: SpecialistId,
    pub request:    RequestId,
    pub client:     ClientId,
    /// Sampled service time the specialist spent on this request.
    pub work:       Duration,
    /// Creation-to-completion time of the request.
    pub sojourn:    Duration,
}

/// Point-in-time copy of a specialist's counters.
#[derive(Clone, Debug)]
pub struct SpecialistStats {
    pub id:         SpecialistId,
    pub lambda:     f64,
    pub state:      SpecialistState,
    pub processed:  u64,
    pub last_work:  Duration,
    pub busy_total: Duration,
    pub created_at: Instant,
}

pub(crate) enum Refusal {
    Busy(Arc<Request>),
    Closed(Arc<Request>),
}

impl Refusal {
    pub(crate) fn into_request(self) -> Arc<Request> {
        match self {
            Refusal::Busy(r) | Refusal::Closed(r) => r,
        }
    }
}

#[derive(Default)]
struct Slot {
    current:    Option<Arc<Request>>,
    processed:  u64,
    last_work:  Duration,
    busy_total: Duration,
    closed:     bool,
}

pub struct Specialist {
    id:         SpecialistId,
    lambda:     f64,
    service:    Arc<dyn ServiceTimeModel>,
    created_at: Instant,
    busy:       AtomicBool,
    slot:       Mutex<Slot>,
    /// Signalled when a request lands in the slot or the specialist closes.
    work_ready: Condvar,
    /// Signalled when the specialist returns to `Available`.
    went_idle:  Condvar,
}

impl fmt::Debug for Specialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specialist")
            .field("id", &self.id)
            .field("lambda", &self.lambda)
            .field("state", &self.state())
            .finish()
    }
}

impl Specialist {
    pub fn new(id: SpecialistId, lambda: f64, service: Arc<dyn ServiceTimeModel>) -> Self {
        Self {
            id,
            lambda,
            service,
            created_at: Instant::now(),
            busy:       AtomicBool::new(false),
            slot:       Mutex::new(Slot::default()),
            work_ready: Condvar::new(),
            went_idle:  Condvar::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> SpecialistId {
        self.id
    }

    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[inline]
    pub fn state(&self) -> SpecialistState {
        if self.busy.load(Ordering::Acquire) {
            SpecialistState::Busy
        } else {
            SpecialistState::Available
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Request currently being served, if any.
    pub fn current_request(&self) -> Option<RequestId> {
        self.slot.lock().current.as_ref().map(|r| r.id)
    }

    pub fn processed_count(&self) -> u64 {
        self.slot.lock().processed
    }

    pub fn stats(&self) -> SpecialistStats {
        let slot = self.slot.lock();
        SpecialistStats {
            id:         self.id,
            lambda:     self.lambda,
            state:      self.state(),
            processed:  slot.processed,
            last_work:  slot.last_work,
            busy_total: slot.busy_total,
            created_at: self.created_at,
        }
    }

    // ── State transitions ─────────────────────────────────────────────────

    /// Take `request` if this specialist is `Available`.
    ///
    /// On success the specialist is `Busy`, the request is `Processing`, and
    /// the worker thread is woken.  On refusal the request is handed back
    /// inside the error, untouched.
    pub fn take_request(&self, request: Arc<Request>) -> PoolResult<()> {
        self.try_assign(request).map_err(|refusal| match refusal {
            Refusal::Busy(request) => PoolError::AlreadyBusy { specialist: self.id, request },
            Refusal::Closed(request) => PoolError::Closed { specialist: self.id, request },
        })
    }

    pub(crate) fn try_assign(&self, request: Arc<Request>) -> Result<(), Refusal> {
        let mut slot = self.slot.lock();
        if slot.closed {
            return Err(Refusal::Closed(request));
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Refusal::Busy(request));
        }
        request.set_status(RequestStatus::Processing);
        trace!(specialist = self.id.label(), request = request.id.0, "assigned");
        slot.current = Some(request);
        self.work_ready.notify_one();
        Ok(())
    }

    /// Serve the request in the slot: sample a service time, sleep for it,
    /// then complete the request and return to `Available`.
    ///
    /// The slot lock is not held while sleeping.  An empty slot is an error
    /// and leaves every counter untouched.
    pub fn run_service(&self, rng: &mut SimRng) -> PoolResult<ServiceRecord> {
        self.serve_one(rng, &NoopCompletion)
    }

    /// [`run_service`](Self::run_service), reporting the record to `sink`
    /// before the specialist goes back to `Available`.  Anyone woken by
    /// [`wait_idle`](Self::wait_idle) therefore sees the completion already
    /// recorded.
    pub(crate) fn serve_one(&self, rng: &mut SimRng, sink: &dyn CompletionSink) -> PoolResult<ServiceRecord> {
        let (request, processed) = {
            let slot = self.slot.lock();
            match &slot.current {
                Some(r) => (Arc::clone(r), slot.processed),
                None => return Err(PoolError::EmptySlot(self.id)),
            }
        };

        let work = self.service.sample(self.lambda, processed, rng);
        thread::sleep(work);

        request.set_status(RequestStatus::Completed);
        let record = ServiceRecord {
            specialist: self.id,
            request:    request.id,
            client:     request.client,
            work,
            sojourn:    request.created_at.elapsed(),
        };
        sink.on_complete(&record);

        let mut slot = self.slot.lock();
        slot.current = None;
        slot.processed += 1;
        slot.last_work = work;
        slot.busy_total += work;
        self.busy.store(false, Ordering::Release);
        self.went_idle.notify_all();
        drop(slot);

        trace!(
            specialist = self.id.label(),
            request = request.id.0,
            work_ms = work.as_secs_f64() * 1_000.0,
            "completed"
        );
        Ok(record)
    }

    // ── Worker support ────────────────────────────────────────────────────

    /// Block until the slot holds a request (`true`) or the specialist has
    /// been closed with nothing left to serve (`false`).
    pub(crate) fn wait_for_work(&self) -> bool {
        let mut slot = self.slot.lock();
        loop {
            if slot.current.is_some() {
                return true;
            }
            if slot.closed {
                return false;
            }
            self.work_ready.wait(&mut slot);
        }
    }

    /// Block until the specialist is `Available` or its worker has died.
    pub fn wait_idle(&self) {
        let mut slot = self.slot.lock();
        while slot.current.is_some() {
            self.went_idle.wait(&mut slot);
        }
    }

    /// Release a specialist whose worker died mid-service: drop the request
    /// in the slot, close, and wake every waiter.  Must not be called with
    /// the slot lock held.
    pub(crate) fn abandon(&self) {
        let mut slot = self.slot.lock();
        let lost = slot.current.take();
        if let Some(request) = lost.as_ref().filter(|r| !r.status().is_terminal()) {
            request.set_status(RequestStatus::Dropped);
        }
        slot.closed = true;
        self.busy.store(false, Ordering::Release);
        self.went_idle.notify_all();
        self.work_ready.notify_all();
        drop(slot);
        error!(
            specialist = self.id.label(),
            request = ?lost.map(|r| r.id.0),
            "worker died; specialist closed"
        );
    }

    /// Stop accepting requests.  A request already in the slot is still
    /// served.
    pub(crate) fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        self.work_ready.notify_all();
        debug!(specialist = self.id.label(), "closed");
    }
}
