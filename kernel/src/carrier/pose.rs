//! `Pose`: the integer 4-tuple `(x, y, z, heading)` that identifies a search node.
//!
//! Poses are plain values. Two poses are the same graph node iff all four
//! components are equal; there are no bounds on any axis.

use std::fmt;
use std::str::FromStr;

/// One of the four pose axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Forward/back.
    X,
    /// Right/left.
    Y,
    /// Up/down.
    Z,
    /// Yaw bucket (cw/ccw).
    Heading,
}

impl Axis {
    /// All axes in component order.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::Heading];

    /// Lowercase axis name used in artifacts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Heading => "heading",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drone position and yaw bucket.
///
/// Ordering is lexicographic over `(x, y, z, heading)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pose {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub heading: i64,
}

impl Pose {
    #[must_use]
    pub const fn new(x: i64, y: i64, z: i64, heading: i64) -> Self {
        Self { x, y, z, heading }
    }

    /// The take-off pose `(0, 0, 0, 0)`.
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Read one component.
    #[must_use]
    pub const fn component(&self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::Heading => self.heading,
        }
    }

    /// Return a copy with one component replaced.
    #[must_use]
    pub fn with_component(mut self, axis: Axis, value: i64) -> Self {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
            Axis::Heading => self.heading = value,
        }
        self
    }

    /// Components in axis order.
    #[must_use]
    pub const fn components(&self) -> [i64; 4] {
        [self.x, self.y, self.z, self.heading]
    }

    /// Sum of per-axis absolute differences across all four axes.
    ///
    /// Saturates at `u64::MAX`; poses near opposite `i64` extremes would
    /// otherwise overflow.
    #[must_use]
    pub fn manhattan_distance(&self, other: &Pose) -> u64 {
        Axis::ALL.iter().fold(0u64, |acc, &axis| {
            acc.saturating_add(self.component(axis).abs_diff(other.component(axis)))
        })
    }

    /// Fixed-width identity bytes: four little-endian `i64`s.
    #[must_use]
    pub fn identity_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, value) in out.chunks_exact_mut(8).zip(self.components()) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// `[x, y, z, heading]` as a JSON array.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!(self.components())
    }
}

impl From<[i64; 4]> for Pose {
    fn from([x, y, z, heading]: [i64; 4]) -> Self {
        Self::new(x, y, z, heading)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.heading)
    }
}

/// Malformed pose text. Rejected before any search begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseParseError {
    /// Text did not contain exactly four comma-separated components.
    WrongArity { found: usize },
    /// A component is not an integer in `i64` range.
    NotInteger { index: usize, raw: String },
}

impl fmt::Display for PoseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongArity { found } => {
                write!(f, "pose needs 4 components (x,y,z,heading), found {found}")
            }
            Self::NotInteger { index, raw } => {
                let axis = Axis::ALL.get(*index).map_or("?", |a| a.name());
                write!(f, "pose component {axis} is not an integer: {raw:?}")
            }
        }
    }
}

impl std::error::Error for PoseParseError {}

impl FromStr for Pose {
    type Err = PoseParseError;

    /// Parse `"x,y,z,heading"`. Surrounding parentheses and whitespace are
    /// tolerated so that `Display` output parses back.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(PoseParseError::WrongArity { found: parts.len() });
        }
        let mut components = [0i64; 4];
        for (index, (slot, raw)) in components.iter_mut().zip(&parts).enumerate() {
            *slot = raw.parse::<i64>().map_err(|_| PoseParseError::NotInteger {
                index,
                raw: (*raw).to_string(),
            })?;
        }
        Ok(Self::from(components))
    }
}
