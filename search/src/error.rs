//! Typed search errors.
//!
//! `SearchError` represents pre-flight failures only. Runtime terminations
//! (goal reached, frontier exhausted, budget exhausted) are expressed via
//! [`crate::graph::TerminationReason`] and always produce a `SearchGraph`
//! audit trail.

use skyroute_kernel::carrier::pose::{Axis, Pose};

/// Typed failure for pre-flight search validation.
///
/// Returned before the root node is created. No `SearchGraph` is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Policy bounds have `min > max` on an axis.
    InvalidBounds { axis: Axis, min: i64, max: i64 },
    /// The start pose lies outside the policy bounds.
    StartOutOfBounds { start: Pose },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBounds { axis, min, max } => {
                write!(f, "invalid search bounds on {axis}: min {min} > max {max}")
            }
            Self::StartOutOfBounds { start } => {
                write!(f, "start pose {start} lies outside the search bounds")
            }
        }
    }
}

impl std::error::Error for SearchError {}
