//! Strongly typed identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash`.  `SpecialistId` is a dense 0-based slot
//! so per-specialist statistics can live in plain `Vec`s indexed by
//! `id.index()`; human-facing output renders it 1-based via
//! [`SpecialistId::label`].

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Process-unique request number, handed out by a `RequestIdGenerator`.
    pub struct RequestId(u64);
}

typed_id! {
    /// Index of a client in the configured client population.
    pub struct ClientId(u32);
}

typed_id! {
    /// Dense 0-based slot of a specialist in the pool.
    pub struct SpecialistId(u32);
}

impl SpecialistId {
    /// 1-based number used in metrics headers and reports.
    #[inline]
    pub fn label(self) -> u32 {
        self.0 + 1
    }
}
