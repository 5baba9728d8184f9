use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,
}

pub type QueueResult<T> = Result<T, QueueError>;
