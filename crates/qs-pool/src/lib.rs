//! `qs-pool`: specialists and the dispatcher that feeds them.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`specialist`]  | `Specialist` state machine, `SpecialistStats`, `ServiceRecord` |
//! | [`dispatcher`]  | `Dispatcher`: round-robin claim, dispatch, worker threads |
//! | [`completion`]  | `CompletionSink` trait, `NoopCompletion`                  |
//! | [`error`]       | `PoolError`, `PoolResult<T>`                              |
//!
//! # Execution model
//!
//! Every specialist owns one worker thread for the lifetime of the pool.  A
//! dispatch stores the request in the specialist's slot and signals that
//! thread; the dispatch call itself returns immediately.  Concurrency is
//! therefore bounded by the number of specialists, and no thread is spawned
//! per request.
//!
//! ```text
//! claim(request)                      worker thread (one per specialist)
//!   cursor lock                         wait until slot holds a request
//!   for each candidate from cursor:     sample service time, sleep
//!     slot lock + CAS Available→Busy    Completed, CompletionSink::on_complete
//!   signal worker                       slot lock: clear, Available, wake idlers
//! ```
//!
//! A worker that panics closes its specialist on the way out: the slot is
//! cleared, waiters are woken, and `Dispatcher::shutdown` reports
//! `PoolError::WorkerPanicked`.

pub mod completion;
pub mod dispatcher;
pub mod error;
pub mod specialist;

#[cfg(test)]
mod tests;

pub use completion::{CompletionSink, NoopCompletion};
pub use dispatcher::Dispatcher;
pub use error::{PoolError, PoolResult};
pub use specialist::{ServiceRecord, Specialist, SpecialistState, SpecialistStats};
