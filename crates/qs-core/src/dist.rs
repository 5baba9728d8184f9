//! Arrival processes and service-time strategies.
//!
//! Both are plain serde enums so they can live in [`SimConfig`][crate::SimConfig].
//! Service times additionally go through the [`ServiceTimeModel`] trait, the
//! extension point for strategies the enum does not cover.

use std::fmt;
use std::time::Duration;

use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CoreError, CoreResult, SimRng};

/// Upper bound for any sampled duration.  Escalating service times grow
/// exponentially and would otherwise overflow `Duration`.
pub const MAX_SAMPLED: Duration = Duration::from_secs(3_600);

/// Convert seconds to a `Duration`, mapping NaN/negative to zero and clamping
/// at [`MAX_SAMPLED`].
pub fn secs_to_duration(secs: f64) -> Duration {
    if !secs.is_finite() {
        return if secs > 0.0 { MAX_SAMPLED } else { Duration::ZERO };
    }
    if secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs)
        .map(|d| d.min(MAX_SAMPLED))
        .unwrap_or(MAX_SAMPLED)
}

// ── Arrival process ───────────────────────────────────────────────────────────

/// How long the generation loop sleeps between two arrivals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArrivalProcess {
    /// Constant inter-arrival interval.
    Fixed { interval_ms: u64 },
    /// Interval drawn uniformly from `[min_ms, max_ms]`.
    Uniform { min_ms: u64, max_ms: u64 },
    /// Poisson arrivals: exponential intervals with mean `1 / rate_per_sec`.
    Poisson { rate_per_sec: f64 },
}

impl Default for ArrivalProcess {
    fn default() -> Self {
        ArrivalProcess::Fixed { interval_ms: 200 }
    }
}

impl ArrivalProcess {
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            ArrivalProcess::Fixed { .. } => Ok(()),
            ArrivalProcess::Uniform { min_ms, max_ms } if min_ms > max_ms => Err(
                CoreError::Distribution(format!("uniform arrivals: min_ms {min_ms} > max_ms {max_ms}")),
            ),
            ArrivalProcess::Uniform { .. } => Ok(()),
            ArrivalProcess::Poisson { rate_per_sec } if !(rate_per_sec > 0.0) || !rate_per_sec.is_finite() => {
                Err(CoreError::Distribution(format!(
                    "poisson arrivals: rate_per_sec must be positive, got {rate_per_sec}"
                )))
            }
            ArrivalProcess::Poisson { .. } => Ok(()),
        }
    }

    /// Sample the next inter-arrival interval.
    pub fn next_interval(&self, rng: &mut SimRng) -> Duration {
        match *self {
            ArrivalProcess::Fixed { interval_ms } => Duration::from_millis(interval_ms),
            ArrivalProcess::Uniform { min_ms, max_ms } => {
                Duration::from_millis(rng.gen_range(min_ms..=max_ms.max(min_ms)))
            }
            ArrivalProcess::Poisson { rate_per_sec } => match Exp::new(rate_per_sec) {
                Ok(exp) => secs_to_duration(exp.sample(rng.inner())),
                Err(_) => {
                    warn!(rate_per_sec, "invalid poisson rate; arriving back-to-back");
                    Duration::ZERO
                }
            },
        }
    }
}

// ── Service time ──────────────────────────────────────────────────────────────

/// Strategy that decides how long a specialist works on one request.
///
/// `lambda` is the specialist's rate parameter and `processed` the number of
/// requests it has completed so far.  Implementations must be cheap and
/// thread-safe: every specialist worker calls `sample` from its own thread.
pub trait ServiceTimeModel: Send + Sync + fmt::Debug {
    fn sample(&self, lambda: f64, processed: u64, rng: &mut SimRng) -> Duration;
}

/// Built-in service-time strategies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceTime {
    /// Every request takes exactly `ms`; `lambda` is ignored.
    Constant { ms: u64 },
    /// Exponentially distributed with rate `lambda` per second
    /// (mean `1 / lambda` seconds).
    Exponential,
    /// `base_ms · e^(lambda · processed)`: the specialist slows down with
    /// every request it completes.
    Escalating { base_ms: f64 },
}

impl Default for ServiceTime {
    fn default() -> Self {
        ServiceTime::Exponential
    }
}

impl ServiceTime {
    /// Check the strategy against the rate parameter it will be used with.
    pub fn validate(&self, lambda: f64) -> CoreResult<()> {
        match *self {
            ServiceTime::Constant { .. } => Ok(()),
            ServiceTime::Exponential if !(lambda > 0.0) || !lambda.is_finite() => Err(
                CoreError::Distribution(format!("exponential service: lambda must be positive, got {lambda}")),
            ),
            ServiceTime::Exponential => Ok(()),
            ServiceTime::Escalating { base_ms } if !(base_ms >= 0.0) || !base_ms.is_finite() => Err(
                CoreError::Distribution(format!("escalating service: base_ms must be >= 0, got {base_ms}")),
            ),
            ServiceTime::Escalating { .. } if !lambda.is_finite() => Err(CoreError::Distribution(
                format!("escalating service: lambda must be finite, got {lambda}"),
            )),
            ServiceTime::Escalating { .. } => Ok(()),
        }
    }
}

impl ServiceTimeModel for ServiceTime {
    fn sample(&self, lambda: f64, processed: u64, rng: &mut SimRng) -> Duration {
        match *self {
            ServiceTime::Constant { ms } => Duration::from_millis(ms),
            ServiceTime::Exponential => match Exp::new(lambda) {
                Ok(exp) => secs_to_duration(exp.sample(rng.inner())),
                Err(_) => {
                    warn!(lambda, "invalid exponential rate; zero service time");
                    Duration::ZERO
                }
            },
            ServiceTime::Escalating { base_ms } => {
                let ms = base_ms * (lambda * processed as f64).exp();
                secs_to_duration(ms / 1_000.0)
            }
        }
    }
}
