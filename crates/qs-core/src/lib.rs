//! `qs-core`: foundational types for the `queuesim` multi-server simulator.
//!
//! This crate is a dependency of every other `qs-*` crate.  It has no `qs-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `RequestId`, `ClientId`, `SpecialistId`                   |
//! | [`request`]     | `Request`, `RequestStatus`, `RequestIdGenerator`, `Client`|
//! | [`dist`]        | `ArrivalProcess`, `ServiceTime`, `ServiceTimeModel`       |
//! | [`config`]      | `SimConfig`, `SpecialistGroup`, `OverflowPolicy`          |
//! | [`time`]        | `RunClock`: monotonic clock with a wall-clock anchor     |
//! | [`rng`]         | `SimRng`                                                  |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod dist;
pub mod error;
pub mod ids;
pub mod request;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{OverflowPolicy, SimConfig, SpecialistGroup};
pub use dist::{ArrivalProcess, ServiceTime, ServiceTimeModel};
pub use error::{CoreError, CoreResult};
pub use ids::{ClientId, RequestId, SpecialistId};
pub use request::{Client, Request, RequestIdGenerator, RequestStatus};
pub use rng::SimRng;
pub use time::RunClock;
