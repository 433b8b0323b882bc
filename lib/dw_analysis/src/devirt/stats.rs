use std::fmt;
use std::ops::{Add, AddAssign};

/// Counts of the rewrites performed by the devirtualizer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DevirtStats {
    /// `invoke-virtual` rebound to a more specific method.
    pub rebound: usize,
    /// `invoke-interface` turned into `invoke-virtual`.
    pub devirtualized: usize,
    pub casts_inserted: usize,
    pub casts_reused: usize,
    pub assumes_rewired: usize,
}

impl DevirtStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Number of rewritten invocations.
    #[must_use]
    pub const fn rewritten_invokes(&self) -> usize {
        self.rebound + self.devirtualized
    }
}

impl Add for DevirtStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl AddAssign for DevirtStats {
    fn add_assign(&mut self, other: Self) {
        self.rebound += other.rebound;
        self.devirtualized += other.devirtualized;
        self.casts_inserted += other.casts_inserted;
        self.casts_reused += other.casts_reused;
        self.assumes_rewired += other.assumes_rewired;
    }
}

impl fmt::Display for DevirtStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} rebound, {} devirtualized, {} cast(s) inserted, {} cast(s) reused, {} assumption(s) rewired",
            self.rebound,
            self.devirtualized,
            self.casts_inserted,
            self.casts_reused,
            self.assumes_rewired
        )
    }
}
