//! Mission configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "start": [0, 0, 0, 0],
//!   "goal": [3, -1, 2, 0],
//!   "telemetry_dir": "battery_consumption",
//!   "max_expansions": 50000,
//!   "bounds": { "min": [-5, -5, 0, -4], "max": [5, 5, 5, 4] }
//! }
//! ```
//!
//! `start` and `goal` may also be written as `"x,y,z,heading"` strings.
//! Every field is optional and unknown fields are ignored. The cost table
//! comes from the first source that is set: inline `cost_entries`, then
//! `averages_csv`, then `telemetry_dir`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::units::CostUnits;
use skyroute_search::policy::{PoseBounds, SearchPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, detail: String },
    Parse { detail: String },
    Invalid { field: &'static str, detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, detail } => write!(f, "cannot read config {path}: {detail}"),
            Self::Parse { detail } => write!(f, "config parse error: {detail}"),
            Self::Invalid { field, detail } => write!(f, "invalid config field {field}: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Inclusive pose box, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsConfig {
    pub min: [i64; 4],
    pub max: [i64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// `[x, y, z, heading]`.
    #[serde(deserialize_with = "pose_components")]
    pub start: [i64; 4],
    #[serde(deserialize_with = "pose_components")]
    pub goal: [i64; 4],
    /// Directory of flight-log CSVs to average.
    pub telemetry_dir: Option<PathBuf>,
    /// Pre-computed averages CSV.
    pub averages_csv: Option<PathBuf>,
    /// Command name to percent.
    pub cost_entries: BTreeMap<String, f64>,
    pub max_expansions: u64,
    pub max_depth: Option<u32>,
    /// Ceiling on `f`, in percent.
    pub max_f_cost: Option<f64>,
    pub bounds: Option<BoundsConfig>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            start: [0; 4],
            goal: [0; 4],
            telemetry_dir: None,
            averages_csv: None,
            cost_entries: BTreeMap::new(),
            max_expansions: SearchPolicy::DEFAULT_MAX_EXPANSIONS,
            max_depth: None,
            max_f_cost: None,
            bounds: None,
        }
    }
}

/// A pose as written in a config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum PoseField {
    Components([i64; 4]),
    Text(String),
}

fn pose_components<'de, D>(deserializer: D) -> Result<[i64; 4], D::Error>
where
    D: Deserializer<'de>,
{
    match PoseField::deserialize(deserializer)? {
        PoseField::Components(components) => Ok(components),
        PoseField::Text(text) => text
            .parse::<Pose>()
            .map(|pose| pose.components())
            .map_err(serde::de::Error::custom),
    }
}

/// Where the cost table comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CostSource {
    Inline(Vec<(String, f64)>),
    AveragesCsv(PathBuf),
    TelemetryDir(PathBuf),
}

impl MissionConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON or mistyped fields.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            detail: e.to_string(),
        })
    }

    /// Read a config file. Relative data paths are taken relative to the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let mut config = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        for path in [&mut self.telemetry_dir, &mut self.averages_csv]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    #[must_use]
    pub fn start_pose(&self) -> Pose {
        Pose::from(self.start)
    }

    #[must_use]
    pub fn goal_pose(&self) -> Pose {
        Pose::from(self.goal)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if no cost source is configured.
    pub fn cost_source(&self) -> Result<CostSource, ConfigError> {
        if !self.cost_entries.is_empty() {
            return Ok(CostSource::Inline(
                self.cost_entries
                    .iter()
                    .map(|(name, percent)| (name.clone(), *percent))
                    .collect(),
            ));
        }
        if let Some(path) = &self.averages_csv {
            return Ok(CostSource::AveragesCsv(path.clone()));
        }
        if let Some(dir) = &self.telemetry_dir {
            return Ok(CostSource::TelemetryDir(dir.clone()));
        }
        Err(ConfigError::Invalid {
            field: "cost_entries",
            detail: "no cost source: set cost_entries, averages_csv or telemetry_dir".into(),
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero expansion budget or a
    /// ceiling that is not a finite non-negative percentage.
    pub fn search_policy(&self) -> Result<SearchPolicy, ConfigError> {
        if self.max_expansions == 0 {
            return Err(ConfigError::Invalid {
                field: "max_expansions",
                detail: "must be at least 1".into(),
            });
        }
        let max_f_cost = self
            .max_f_cost
            .map(|percent| {
                CostUnits::from_percent(percent).ok_or_else(|| ConfigError::Invalid {
                    field: "max_f_cost",
                    detail: format!("{percent} is not a finite non-negative percentage"),
                })
            })
            .transpose()?;
        Ok(SearchPolicy {
            max_expansions: self.max_expansions,
            max_depth: self.max_depth,
            max_f_cost,
            bounds: self
                .bounds
                .map(|b| PoseBounds::new(Pose::from(b.min), Pose::from(b.max))),
        })
    }
}
