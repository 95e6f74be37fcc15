//! Search policy: the explicit bounds that make every search terminate.

use skyroute_kernel::carrier::pose::{Axis, Pose};
use skyroute_kernel::cost::units::CostUnits;

use crate::error::SearchError;

/// Inclusive per-axis box of admissible poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseBounds {
    pub min: Pose,
    pub max: Pose,
}

impl PoseBounds {
    #[must_use]
    pub const fn new(min: Pose, max: Pose) -> Self {
        Self { min, max }
    }

    /// The box `center ± radius` on every axis, saturating at `i64` limits.
    #[must_use]
    pub fn around(center: Pose, radius: i64) -> Self {
        let r = radius.max(0);
        let shift = |delta: i64| {
            Pose::from(center.components().map(|c| c.saturating_add(delta)))
        };
        Self::new(shift(-r), shift(r))
    }

    /// Whether `pose` lies inside on every axis.
    #[must_use]
    pub fn contains(&self, pose: &Pose) -> bool {
        Axis::ALL.iter().all(|&axis| {
            let v = pose.component(axis);
            self.min.component(axis) <= v && v <= self.max.component(axis)
        })
    }

    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBounds`] for the first axis with
    /// `min > max`.
    pub fn validate(&self) -> Result<(), SearchError> {
        for axis in Axis::ALL {
            let (min, max) = (self.min.component(axis), self.max.component(axis));
            if min > max {
                return Err(SearchError::InvalidBounds { axis, min, max });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "max": self.max.to_json_value(),
            "min": self.min.to_json_value(),
        })
    }
}

/// Search budgets and cutoffs.
///
/// Every bound is optional except the expansion budget, which is always in
/// force: an unbounded pose space with an unreachable goal would otherwise
/// never terminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Hard cap on node expansions.
    pub max_expansions: u64,
    /// Children deeper than this are not created.
    pub max_depth: Option<u32>,
    /// Children whose `f` exceeds this are not created.
    pub max_f_cost: Option<CostUnits>,
    /// Children outside this box are not created.
    pub bounds: Option<PoseBounds>,
}

impl SearchPolicy {
    /// Default expansion budget. The bundled search graph grows by about
    /// 2 KiB per expansion.
    pub const DEFAULT_MAX_EXPANSIONS: u64 = 20_000;

    /// Check the policy against the start pose.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBounds`] or
    /// [`SearchError::StartOutOfBounds`].
    pub fn validate(&self, start: &Pose) -> Result<(), SearchError> {
        if let Some(bounds) = &self.bounds {
            bounds.validate()?;
            if !bounds.contains(start) {
                return Err(SearchError::StartOutOfBounds { start: *start });
            }
        }
        Ok(())
    }

    /// Policy echo recorded in the search graph and bundles.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "bounds": self.bounds.as_ref().map(PoseBounds::to_json_value),
            "max_depth": self.max_depth,
            "max_expansions": self.max_expansions,
            "max_f_cost": self.max_f_cost.map(CostUnits::units),
            "schema_version": "search_policy.v1",
        })
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            max_expansions: Self::DEFAULT_MAX_EXPANSIONS,
            max_depth: None,
            max_f_cost: None,
            bounds: None,
        }
    }
}
