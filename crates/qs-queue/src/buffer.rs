//! `AdmissionBuffer`: the shared, locked buffer of waiting requests.
//!
//! Every operation takes the single buffer lock exactly once, so `add`
//! (including its full check), `next`, and `remove` are each atomic.  No
//! atomicity is promised across calls: callers that need "check then act"
//! must use the combined operations here rather than `is_full()` followed by
//! `add()`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use qs_core::{OverflowPolicy, Request, RequestId, RequestStatus};

use crate::{Admission, QueueResult, RingBuffer};

pub struct AdmissionBuffer {
    ring:   Mutex<RingBuffer<Arc<Request>>>,
    policy: OverflowPolicy,
}

impl AdmissionBuffer {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> QueueResult<Self> {
        Ok(Self {
            ring: Mutex::new(RingBuffer::new(capacity)?),
            policy,
        })
    }

    #[inline]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Admit `request`.
    ///
    /// A stored request becomes `Queued`; whichever request is lost (the
    /// displaced victim or the refused newcomer) becomes `Dropped`.  Any
    /// result other than [`Admission::Enqueued`] is one rejection.
    pub fn add(&self, request: Arc<Request>) -> Admission<Arc<Request>> {
        let mut ring = self.ring.lock();
        let outcome = ring.push(Arc::clone(&request), self.policy);
        if !matches!(outcome, Admission::Refused(_)) {
            request.set_status(RequestStatus::Queued);
        }
        if let Some(lost) = outcome.lost() {
            lost.set_status(RequestStatus::Dropped);
        }
        trace!(request = request.id.0, len = ring.len(), full = ring.is_full(), "buffer add");
        outcome
    }

    /// Dequeue the oldest waiting request.
    pub fn next(&self) -> Option<Arc<Request>> {
        let mut ring = self.ring.lock();
        let request = ring.pop();
        if let Some(r) = &request {
            trace!(request = r.id.0, len = ring.len(), "buffer next");
        }
        request
    }

    /// Remove the request with `id` if it is still waiting here.
    pub fn remove(&self, id: RequestId) -> Option<Arc<Request>> {
        let mut ring = self.ring.lock();
        let removed = ring.remove_where(|r| r.id == id);
        if removed.is_some() {
            trace!(request = id.0, len = ring.len(), "buffer remove");
        }
        removed
    }

    pub fn is_full(&self) -> bool {
        self.ring.lock().is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    /// Ids of the waiting requests, oldest first.
    pub fn contents(&self) -> Vec<RequestId> {
        self.ring.lock().iter().map(|r| r.id).collect()
    }
}
