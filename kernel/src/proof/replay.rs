//! Route replay: re-apply an action sequence from its start pose and check
//! where it lands.
//!
//! A [`ReplayError`] means the route could not be replayed at all (a step
//! overflowed). A [`ReplayVerdict::Divergence`] means it replayed cleanly but
//! did not arrive at the expected goal.

use std::fmt;

use crate::carrier::action::Action;
use crate::carrier::pose::Pose;
use crate::operators::apply::{apply, ApplyFailure};

/// Replay could not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// Step `step` (0-based) failed to apply.
    StepFailed { step: usize, failure: ApplyFailure },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepFailed { step, failure } => write!(f, "replay step {step}: {failure}"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Outcome of [`verify_route`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayVerdict {
    /// The route ends exactly on the goal (all four components).
    Match,
    /// The route ends somewhere else.
    Divergence { expected: Pose, actual: Pose },
}

impl ReplayVerdict {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Every pose visited by `actions` from `start`, `start` included.
///
/// # Errors
///
/// Returns [`ReplayError::StepFailed`] on the first step that overflows.
pub fn replay_trajectory(start: Pose, actions: &[Action]) -> Result<Vec<Pose>, ReplayError> {
    let mut poses = Vec::with_capacity(actions.len() + 1);
    poses.push(start);
    let mut current = start;
    for (step, &action) in actions.iter().enumerate() {
        current = apply(current, action).map_err(|failure| ReplayError::StepFailed { step, failure })?;
        poses.push(current);
    }
    Ok(poses)
}

/// The pose reached by applying `actions` from `start`.
///
/// # Errors
///
/// Returns [`ReplayError::StepFailed`] on the first step that overflows.
pub fn replay_route(start: Pose, actions: &[Action]) -> Result<Pose, ReplayError> {
    actions.iter().enumerate().try_fold(start, |pose, (step, &action)| {
        apply(pose, action).map_err(|failure| ReplayError::StepFailed { step, failure })
    })
}

/// Replay `actions` from `start` and compare the end pose with `goal`.
///
/// # Errors
///
/// Returns [`ReplayError`] if the route cannot be replayed.
pub fn verify_route(start: Pose, goal: Pose, actions: &[Action]) -> Result<ReplayVerdict, ReplayError> {
    let actual = replay_route(start, actions)?;
    if actual == goal {
        Ok(ReplayVerdict::Match)
    } else {
        Ok(ReplayVerdict::Divergence {
            expected: goal,
            actual,
        })
    }
}
