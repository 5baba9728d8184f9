//! Simulation RNG wrapper.
//!
//! Runs are not meant to be reproducible: by default every `SimRng` is seeded
//! from OS entropy.  A fixed seed is still accepted (tests, debugging) and
//! child generators are derived by mixing the parent's output with an offset:
//!
//!   child_seed = parent.next_u64() XOR (offset * MIXING_CONSTANT)
//!
//! Each thread (generation loop, every specialist worker) owns its own child,
//! so no RNG is ever shared or locked.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Thread-local simulation RNG.
pub struct SimRng(SmallRng);

impl SimRng {
    /// Seed deterministically.
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// `Some(seed)` → [`SimRng::new`], `None` → [`SimRng::from_entropy`].
    pub fn seeded_or_entropy(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => SimRng::new(s),
            None => SimRng::from_entropy(),
        }
    }

    /// Derive a child `SimRng` with a different seed offset: used to hand
    /// each worker thread its own generator.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    /// Expose the inner `SmallRng` for use with `rand_distr` types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
