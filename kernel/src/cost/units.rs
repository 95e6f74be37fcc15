//! `CostUnits`: fixed-point cost used everywhere past the telemetry boundary.
//!
//! One percent of battery is [`CostUnits::UNITS_PER_PERCENT`] units, and one
//! search step (the `g` and `h` terms) is [`CostUnits::PER_STEP`]. Floats are
//! rounded exactly once, in [`CostUnits::from_percent`]; ordering, audit
//! graphs and hashes only ever see integers.

use std::fmt;
use std::ops::Add;

/// Non-negative fixed-point cost. All arithmetic saturates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CostUnits(u64);

impl CostUnits {
    /// Units per battery percent (six decimal places).
    pub const UNITS_PER_PERCENT: u64 = 1_000_000;

    /// One search step (one unit of path length or Manhattan distance).
    pub const PER_STEP: CostUnits = CostUnits(Self::UNITS_PER_PERCENT);

    pub const ZERO: CostUnits = CostUnits(0);

    pub const MAX: CostUnits = CostUnits(u64::MAX);

    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Convert a percentage, rounding to the nearest unit.
    ///
    /// Returns `None` for negative, NaN, infinite, or out-of-range inputs.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_percent(percent: f64) -> Option<Self> {
        if !percent.is_finite() || percent < 0.0 {
            return None;
        }
        let scaled = (percent * Self::UNITS_PER_PERCENT as f64).round();
        if scaled >= u64::MAX as f64 {
            return None;
        }
        Some(Self(scaled as u64))
    }

    /// `steps` whole search steps.
    #[must_use]
    pub const fn from_steps(steps: u64) -> Self {
        Self(steps.saturating_mul(Self::UNITS_PER_PERCENT))
    }

    #[must_use]
    pub const fn units(self) -> u64 {
        self.0
    }

    /// Back to a percentage. Lossy; for display and reports only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_percent(self) -> f64 {
        self.0 as f64 / Self::UNITS_PER_PERCENT as f64
    }

    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for CostUnits {
    type Output = CostUnits;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl std::iter::Sum for CostUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for CostUnits {
    /// Six-decimal percentage, exact (no float formatting).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNITS_PER_PERCENT;
        let frac = self.0 % Self::UNITS_PER_PERCENT;
        write!(f, "{whole}.{frac:06}")
    }
}
