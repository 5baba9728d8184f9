//! `qs-sim`: run orchestrator for the queuesim simulator.
//!
//! # Run phases
//!
//! ```text
//! build():  validate config → buffer, specialists, aggregator
//!           open metrics sink, write header (fails here, before any loop)
//! run():    start one worker thread per specialist
//!   ① generation loop:  until generation deadline:
//!                          pick client → request → record arrival
//!                          claim a specialist, else admit to buffer
//!                          sleep one inter-arrival interval
//!   ② processing loop:  until processing deadline:
//!                          held request or buffer.next()
//!                          claim a specialist (hold and retry if none)
//!                          record buffer wait + usage, pause
//!   ③ snapshot ticker:  every poll interval: rate-limited snapshot → sink
//!   join ①②, wait for every busy specialist, stop ③
//!   final snapshot, shut down workers, close sink → RunReport
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use qs_core::SimConfig;
//! use qs_sim::{NoopObserver, SimBuilder};
//!
//! let sim = SimBuilder::new(SimConfig::default()).build()?;
//! let report = sim.run(Arc::new(NoopObserver))?;
//! println!("{} of {} rejected", report.system.rejected, report.system.total);
//! ```

pub mod builder;
pub mod error;
mod loops;
pub mod observer;
pub mod report;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use report::{RunReport, SpecialistReport, SystemReport};
pub use sim::Sim;
