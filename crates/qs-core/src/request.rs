//! Requests, their lifecycle status, and the clients that submit them.
//!
//! A [`Request`] is shared as `Arc<Request>` between the admission buffer,
//! the dispatcher, and the specialist serving it.  Identity (`id`, `client`,
//! `created_at`) is immutable; only the status changes, and only the current
//! holder changes it.  The status is an atomic so readers never need the
//! holder's lock.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Instant;

use tracing::trace;

use crate::{ClientId, RequestId};

// ── RequestStatus ─────────────────────────────────────────────────────────────

/// Lifecycle of a request.
///
/// `New → Queued → Processing → Completed` for buffered requests,
/// `New → Processing → Completed` for immediate dispatch.  `Dropped` is
/// terminal for requests displaced or refused by a full buffer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum RequestStatus {
    New = 0,
    Queued = 1,
    Processing = 2,
    Completed = 3,
    Dropped = 4,
}

impl RequestStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RequestStatus::New,
            1 => RequestStatus::Queued,
            2 => RequestStatus::Processing,
            3 => RequestStatus::Completed,
            _ => RequestStatus::Dropped,
        }
    }

    /// `true` for `Completed` and `Dropped`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Dropped)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::New => "new",
            RequestStatus::Queued => "queued",
            RequestStatus::Processing => "processing",
            RequestStatus::Completed => "completed",
            RequestStatus::Dropped => "dropped",
        };
        f.write_str(s)
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// A single unit of work submitted by a client.
#[derive(Debug)]
pub struct Request {
    pub id:         RequestId,
    pub client:     ClientId,
    pub created_at: Instant,
    status:         AtomicU8,
}

impl Request {
    /// Build a request directly.  Simulation code goes through
    /// [`Client::submit`] so ids come from the run's generator.
    pub fn new(id: RequestId, client: ClientId) -> Self {
        Self {
            id,
            client,
            created_at: Instant::now(),
            status:     AtomicU8::new(RequestStatus::New as u8),
        }
    }

    #[inline]
    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_status(&self, status: RequestStatus) {
        trace!(request = self.id.0, %status, "request status change");
        self.status.store(status as u8, Ordering::Release);
    }
}

// ── RequestIdGenerator ────────────────────────────────────────────────────────

/// Monotonic request-id source.
///
/// One generator per run, passed explicitly to whoever creates requests, so
/// independent runs (and tests) never share a counter.  Ids start at 1.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    #[inline]
    pub fn next_id(&self) -> RequestId {
        RequestId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// A request source.  Clients carry no state beyond their id.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Client {
    pub id: ClientId,
}

impl Client {
    pub fn new(id: ClientId) -> Self {
        Self { id }
    }

    /// Build `count` clients numbered `0..count`.
    pub fn population(count: u32) -> Vec<Client> {
        (0..count).map(|i| Client::new(ClientId(i))).collect()
    }

    /// Create a fresh `New` request tagged with this client.
    pub fn submit(&self, ids: &RequestIdGenerator) -> Arc<Request> {
        let request = Request::new(ids.next_id(), self.id);
        trace!(client = self.id.0, request = request.id.0, "request submitted");
        Arc::new(request)
    }
}
