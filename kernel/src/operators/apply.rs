//! `apply()`: apply a routing action to a `Pose`, producing the successor pose.
//!
//! The single pose transform in the workspace. Search expansion, route
//! replay, telemetry trajectories and the simulated drone all go through
//! [`apply`]; there is no second delta table.
//!
//! Arithmetic is checked. Stepping past `i64::MIN`/`i64::MAX` on any axis is
//! an [`ApplyFailure::AxisOverflow`], never a wrap.

use std::fmt;

use crate::carrier::action::Action;
use crate::carrier::pose::{Axis, Pose};

/// The effect of one action on the pose: a unit step on exactly one axis,
/// or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// Move `step` (either `+1` or `-1`) along `axis`.
    Step { axis: Axis, step: i64 },
    /// No pose change (`flip`).
    Stationary,
}

/// Typed failure for action application. Fail-closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyFailure {
    /// The step would leave the `i64` range on `axis`.
    AxisOverflow { axis: Axis, action: Action },
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AxisOverflow { axis, action } => {
                write!(f, "{action} overflows the {axis} axis")
            }
        }
    }
}

impl std::error::Error for ApplyFailure {}

/// Result type for apply.
pub type ApplyResult = Result<Pose, ApplyFailure>;

/// Dispatch table mapping each action to its pose delta.
///
/// Indexed by [`Action::index`].
const DELTAS: [Delta; Action::COUNT] = [
    Delta::Step { axis: Axis::Z, step: 1 },        // up
    Delta::Step { axis: Axis::Z, step: -1 },       // down
    Delta::Step { axis: Axis::X, step: 1 },        // forward
    Delta::Step { axis: Axis::X, step: -1 },       // back
    Delta::Step { axis: Axis::Y, step: -1 },       // left
    Delta::Step { axis: Axis::Y, step: 1 },        // right
    Delta::Step { axis: Axis::Heading, step: 1 },  // cw
    Delta::Step { axis: Axis::Heading, step: -1 }, // ccw
    Delta::Stationary,                             // flip
];

/// The pose delta declared for `action`.
#[must_use]
pub const fn delta(action: Action) -> Delta {
    DELTAS[action.index()]
}

/// Apply `action` to `pose`.
///
/// # Errors
///
/// Returns [`ApplyFailure::AxisOverflow`] if the step leaves the `i64` range.
pub fn apply(pose: Pose, action: Action) -> ApplyResult {
    match delta(action) {
        Delta::Stationary => Ok(pose),
        Delta::Step { axis, step } => {
            let next = pose
                .component(axis)
                .checked_add(step)
                .ok_or(ApplyFailure::AxisOverflow { axis, action })?;
            Ok(pose.with_component(axis, next))
        }
    }
}
