use std::sync::Arc;

use qs_core::{Request, SpecialistId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    /// A request was handed to a specialist that is already serving one.
    /// The refused request is returned to the caller.
    #[error("{specialist} is busy; refused request {}", .request.id)]
    AlreadyBusy {
        specialist: SpecialistId,
        request:    Arc<Request>,
    },

    /// The service routine ran with nothing in the specialist's slot.
    #[error("{0} has no current request to serve")]
    EmptySlot(SpecialistId),

    #[error("{specialist} is shut down; refused request {}", .request.id)]
    Closed {
        specialist: SpecialistId,
        request:    Arc<Request>,
    },

    #[error("no specialist with id {0}")]
    UnknownSpecialist(SpecialistId),

    #[error("pool has no specialists")]
    Empty,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker thread of {0} panicked")]
    WorkerPanicked(SpecialistId),
}

impl PoolError {
    /// Recover the request a refusing error carries.
    pub fn into_request(self) -> Option<Arc<Request>> {
        match self {
            PoolError::AlreadyBusy { request, .. } | PoolError::Closed { request, .. } => Some(request),
            _ => None,
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
