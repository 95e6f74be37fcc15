//! `CostTable`: measured per-command energy, validated once at construction.
//!
//! The table is a total mapping from every routing action except `up` to a
//! non-negative energy cost. `up` may be present (it is kept for reporting)
//! but the energy model never reads it. `takeoff` and `land` are optional
//! mission-overhead entries and are never path edges.
//!
//! Any table that exists has passed validation: a missing entry is a
//! construction error, not something the search can hit.

use std::collections::BTreeSet;
use std::fmt;

use crate::carrier::action::{Action, MissionCommand};
use crate::cost::units::CostUnits;
use crate::proof::canon::CanonError;
use crate::proof::hash::{canonical_json_hash, ContentHash};
use crate::proof::hash_domain::HashDomain;

/// Cost table construction error. Surfaced before any search begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostTableError {
    /// A required routing action has no entry.
    MissingEntry { action: Action },
    /// An entry names something outside the command vocabulary.
    UnknownCommand { name: String },
    /// The same command appears twice.
    DuplicateEntry { name: String },
    /// Negative, NaN, infinite, or unrepresentably large cost.
    InvalidCost { name: String, detail: String },
}

impl fmt::Display for CostTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntry { action } => {
                write!(f, "cost table has no entry for required action {action}")
            }
            Self::UnknownCommand { name } => write!(f, "cost table names unknown command {name:?}"),
            Self::DuplicateEntry { name } => write!(f, "cost table lists {name} more than once"),
            Self::InvalidCost { name, detail } => write!(f, "invalid cost for {name}: {detail}"),
        }
    }
}

impl std::error::Error for CostTableError {}

/// Validated per-command energy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostTable {
    energy: [Option<CostUnits>; Action::COUNT],
    takeoff: Option<CostUnits>,
    land: Option<CostUnits>,
}

impl CostTable {
    /// Build from `(command name, percent)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError`] if a name is unknown or repeated, a cost is
    /// invalid, or a routing action other than `up` has no entry.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, CostTableError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = Self {
            energy: [None; Action::COUNT],
            takeoff: None,
            land: None,
        };
        let mut seen = BTreeSet::new();

        for (name, percent) in entries {
            let name = name.as_ref().trim();
            let command: MissionCommand =
                name.parse().map_err(|_| CostTableError::UnknownCommand {
                    name: name.to_string(),
                })?;
            if !seen.insert(command) {
                return Err(CostTableError::DuplicateEntry {
                    name: name.to_string(),
                });
            }
            let units = to_units(command, percent)?;
            match command {
                MissionCommand::Takeoff => table.takeoff = Some(units),
                MissionCommand::Land => table.land = Some(units),
                MissionCommand::Route(action) => table.energy[action.index()] = Some(units),
            }
        }

        table.check_complete()?;
        Ok(table)
    }

    /// Build from a function over every routing action (including `up`).
    /// No mission-overhead entries.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError::InvalidCost`] if any returned cost is invalid.
    pub fn from_fn(mut energy: impl FnMut(Action) -> f64) -> Result<Self, CostTableError> {
        Self::from_entries(Action::ALL.into_iter().map(|a| (a.name(), energy(a))))
    }

    /// Every routing action costs `percent`.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError::InvalidCost`] if `percent` is invalid.
    pub fn uniform(percent: f64) -> Result<Self, CostTableError> {
        Self::from_fn(|_| percent)
    }

    /// Attach mission-overhead entries.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError::InvalidCost`] if either cost is invalid.
    pub fn with_mission_overhead(mut self, takeoff: f64, land: f64) -> Result<Self, CostTableError> {
        self.takeoff = Some(to_units(MissionCommand::Takeoff, takeoff)?);
        self.land = Some(to_units(MissionCommand::Land, land)?);
        Ok(self)
    }

    fn check_complete(&self) -> Result<(), CostTableError> {
        for action in Action::ALL {
            if action != Action::Up && self.energy[action.index()].is_none() {
                return Err(CostTableError::MissingEntry { action });
            }
        }
        Ok(())
    }

    /// Measured energy for `action`. Always `Some` except possibly for `up`.
    #[must_use]
    pub fn energy(&self, action: Action) -> Option<CostUnits> {
        self.energy[action.index()]
    }

    /// Measured energy for any command, including mission bookends.
    #[must_use]
    pub fn command_energy(&self, command: MissionCommand) -> Option<CostUnits> {
        match command {
            MissionCommand::Takeoff => self.takeoff,
            MissionCommand::Land => self.land,
            MissionCommand::Route(action) => self.energy(action),
        }
    }

    /// Canonical JSON projection. Costs are integer [`CostUnits`]; absent
    /// entries are `null`.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut energy = serde_json::Map::new();
        for action in Action::ALL {
            energy.insert(
                action.name().to_string(),
                units_json(self.energy(action)),
            );
        }
        serde_json::json!({
            "schema_version": "cost_table.v1",
            "units_per_percent": CostUnits::UNITS_PER_PERCENT,
            "energy": energy,
            "takeoff": units_json(self.takeoff),
            "land": units_json(self.land),
        })
    }
}

impl CostTable {
    /// Content hash of the canonical projection.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if canonicalization fails (it cannot for an
    /// integer-only table).
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        canonical_json_hash(HashDomain::CostTable, &self.to_json_value())
    }
}

fn units_json(units: Option<CostUnits>) -> serde_json::Value {
    units.map_or(serde_json::Value::Null, |u| serde_json::json!(u.units()))
}

fn to_units(command: MissionCommand, percent: f64) -> Result<CostUnits, CostTableError> {
    CostUnits::from_percent(percent).ok_or_else(|| CostTableError::InvalidCost {
        name: command.name().to_string(),
        detail: format!("{percent} is not a finite non-negative percentage"),
    })
}
