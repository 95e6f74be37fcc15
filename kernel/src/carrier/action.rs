//! `Action` and `MissionCommand`: the closed command vocabulary.
//!
//! Nine routing actions are composable path edges. `takeoff` and `land`
//! bookend a mission and only appear in telemetry and replay, never as
//! search edges; [`MissionCommand`] carries all eleven.

use std::fmt;
use std::str::FromStr;

/// One atomic routing maneuver.
///
/// Declaration order is the canonical expansion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Up,
    Down,
    Forward,
    Back,
    Left,
    Right,
    Cw,
    Ccw,
    /// Zero displacement, positive energy cost.
    Flip,
}

impl Action {
    /// Number of routing actions.
    pub const COUNT: usize = 9;

    /// All routing actions in canonical order.
    pub const ALL: [Action; Self::COUNT] = [
        Action::Up,
        Action::Down,
        Action::Forward,
        Action::Back,
        Action::Left,
        Action::Right,
        Action::Cw,
        Action::Ccw,
        Action::Flip,
    ];

    /// Position in [`Action::ALL`]. Used to index per-action tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Forward => 2,
            Self::Back => 3,
            Self::Left => 4,
            Self::Right => 5,
            Self::Cw => 6,
            Self::Ccw => 7,
            Self::Flip => 8,
        }
    }

    /// Wire name as it appears in telemetry and artifacts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Cw => "cw",
            Self::Ccw => "ccw",
            Self::Flip => "flip",
        }
    }

    /// Look up an action by wire name. Exact, case-sensitive match.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command name outside the recognized vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParseError {
    pub name: String,
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: {:?}", self.name)
    }
}

impl std::error::Error for CommandParseError {}

impl FromStr for Action {
    type Err = CommandParseError;

    /// Rejects `takeoff`/`land` as well as unknown names: neither is a
    /// routing action.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim()).ok_or_else(|| CommandParseError {
            name: s.trim().to_string(),
        })
    }
}

/// Anything the drone can be told to do, including mission bookends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MissionCommand {
    Takeoff,
    Land,
    Route(Action),
}

impl MissionCommand {
    /// All eleven commands: takeoff, land, then the routing actions.
    #[must_use]
    pub fn all() -> Vec<MissionCommand> {
        let mut out = vec![Self::Takeoff, Self::Land];
        out.extend(Action::ALL.into_iter().map(Self::Route));
        out
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Takeoff => "takeoff",
            Self::Land => "land",
            Self::Route(action) => action.name(),
        }
    }

    /// The routing action, if this command is a path edge.
    #[must_use]
    pub const fn as_action(self) -> Option<Action> {
        match self {
            Self::Route(action) => Some(action),
            Self::Takeoff | Self::Land => None,
        }
    }
}

impl From<Action> for MissionCommand {
    fn from(action: Action) -> Self {
        Self::Route(action)
    }
}

impl fmt::Display for MissionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MissionCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "takeoff" => Ok(Self::Takeoff),
            "land" => Ok(Self::Land),
            other => other.parse::<Action>().map(Self::Route),
        }
    }
}
