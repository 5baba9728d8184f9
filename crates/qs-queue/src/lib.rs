//! `qs-queue`: the bounded admission buffer.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`ring`]    | `RingBuffer<T>` (unsynchronized), `Admission<T>`            |
//! | [`buffer`]  | `AdmissionBuffer`: the locked, request-aware wrapper       |
//! | [`error`]   | `QueueError`, `QueueResult<T>`                              |
//!
//! # Ring model (summary)
//!
//! ```text
//! head  = next write slot
//! tail  = next read slot
//! empty ⇔ head == tail && !full
//! full  ⇔ head == tail &&  full
//! ```
//!
//! What happens to an arrival at a full ring is decided by
//! [`qs_core::OverflowPolicy`]; the default overwrites the most recently
//! inserted entry.

pub mod buffer;
pub mod error;
pub mod ring;

#[cfg(test)]
mod tests;

pub use buffer::AdmissionBuffer;
pub use error::{QueueError, QueueResult};
pub use ring::{Admission, RingBuffer};
