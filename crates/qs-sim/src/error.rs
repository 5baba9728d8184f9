use qs_core::CoreError;
use qs_pool::PoolError;
use qs_queue::QueueError;
use qs_stats::StatsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Core(#[from] CoreError),

    #[error("buffer error: {0}")]
    Queue(#[from] QueueError),

    #[error("specialist pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("metrics error: {0}")]
    Stats(#[from] StatsError),

    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        what:   &'static str,
        source: std::io::Error,
    },

    #[error("{0} loop panicked")]
    LoopPanicked(&'static str),
}

pub type SimResult<T> = Result<T, SimError>;
