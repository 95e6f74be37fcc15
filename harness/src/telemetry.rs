//! Flight telemetry: per-command battery consumption logs and their averages.
//!
//! # Log format
//!
//! ```text
//! Command,Battery Consumption (%)
//! takeoff,5
//! forward,0.97
//! ...
//! land,3
//! ```
//!
//! One row per executed command. The averages file produced by
//! [`render_average_csv`] uses the same two columns, one row per command.
//!
//! Aggregation pools every row of every flight: the mean for a command is
//! the mean over all its samples, not the mean of per-flight means.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use skyroute_kernel::carrier::action::MissionCommand;
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::table::{CostTable, CostTableError};
use skyroute_kernel::proof::hash::{canonical_hash, ContentHash};
use skyroute_kernel::proof::hash_domain::HashDomain;
use skyroute_kernel::proof::replay::{replay_trajectory, ReplayError};

/// Header line of every telemetry and averages CSV.
pub const CSV_HEADER: &str = "Command,Battery Consumption (%)";

/// Error reading telemetry. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryError {
    Io { path: String, detail: String },
    /// The input has no header line.
    Empty,
    BadHeader { found: String },
    MalformedRow { line: usize, detail: String },
    UnknownCommand { line: usize, name: String },
    InvalidConsumption { line: usize, raw: String },
    /// A parse error inside a specific file.
    InFile { path: String, error: Box<TelemetryError> },
    /// The directory holds no `*.csv` files.
    NoLogs { dir: String },
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, detail } => write!(f, "I/O error on {path}: {detail}"),
            Self::Empty => write!(f, "telemetry input is empty"),
            Self::BadHeader { found } => {
                write!(f, "expected header {CSV_HEADER:?}, found {found:?}")
            }
            Self::MalformedRow { line, detail } => write!(f, "line {line}: {detail}"),
            Self::UnknownCommand { line, name } => {
                write!(f, "line {line}: unknown command {name:?}")
            }
            Self::InvalidConsumption { line, raw } => {
                write!(f, "line {line}: invalid battery consumption {raw:?}")
            }
            Self::InFile { path, error } => write!(f, "{path}: {error}"),
            Self::NoLogs { dir } => write!(f, "no flight logs (*.csv) in {dir}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// One executed command and the battery percentage it consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightRecord {
    pub command: MissionCommand,
    pub consumption: f64,
}

/// One sortie, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightLog {
    pub records: Vec<FlightRecord>,
}

impl FlightLog {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all consumption in the log, in percent.
    #[must_use]
    pub fn total_consumption(&self) -> f64 {
        self.records.iter().map(|r| r.consumption).sum()
    }

    /// Render back to CSV text (header plus one row per record).
    #[must_use]
    pub fn to_csv(&self) -> String {
        render_rows(self.records.iter().map(|r| (r.command, r.consumption)))
    }

    /// Content hash of the rendered CSV.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        canonical_hash(HashDomain::FlightLog, self.to_csv().as_bytes())
    }
}

/// Parse one flight log.
///
/// Blank lines are skipped. Consumption must be a finite, non-negative number.
///
/// # Errors
///
/// Returns [`TelemetryError`] on a missing or wrong header, a row without
/// exactly two fields, an unknown command, or a bad consumption value.
pub fn parse_flight_log(text: &str) -> Result<FlightLog, TelemetryError> {
    let records = parse_rows(text)?
        .into_iter()
        .map(|(_, command, consumption)| FlightRecord {
            command,
            consumption,
        })
        .collect();
    Ok(FlightLog { records })
}

/// Read every `*.csv` file in `dir`, in file-name order.
///
/// # Errors
///
/// Returns [`TelemetryError::NoLogs`] if there are none, or the first read or
/// parse error (wrapped in [`TelemetryError::InFile`]).
pub fn load_flight_logs(dir: &Path) -> Result<Vec<FlightLog>, TelemetryError> {
    let io_err = |e: std::io::Error| TelemetryError::Io {
        path: dir.display().to_string(),
        detail: e.to_string(),
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(TelemetryError::NoLogs {
            dir: dir.display().to_string(),
        });
    }

    let mut logs = Vec::with_capacity(paths.len());
    for path in &paths {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| TelemetryError::Io {
            path: shown.clone(),
            detail: e.to_string(),
        })?;
        let log = parse_flight_log(&text).map_err(|error| TelemetryError::InFile {
            path: shown.clone(),
            error: Box::new(error),
        })?;
        log::debug!("loaded {} ({} records, {})", shown, log.len(), log.content_hash());
        logs.push(log);
    }
    Ok(logs)
}

/// Sample count and running total for one command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommandStats {
    pub samples: u64,
    pub total: f64,
}

impl CommandStats {
    fn record(&mut self, consumption: f64) {
        self.samples += 1;
        self.total += consumption;
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total / self.samples as f64
        }
    }
}

/// Per-command averages over a set of flights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionSummary {
    pooled: BTreeMap<MissionCommand, CommandStats>,
    per_flight: Vec<BTreeMap<MissionCommand, CommandStats>>,
}

impl ConsumptionSummary {
    #[must_use]
    pub fn from_logs(logs: &[FlightLog]) -> Self {
        let mut summary = Self::default();
        for log in logs {
            let mut flight: BTreeMap<MissionCommand, CommandStats> = BTreeMap::new();
            for record in &log.records {
                summary
                    .pooled
                    .entry(record.command)
                    .or_default()
                    .record(record.consumption);
                flight.entry(record.command).or_default().record(record.consumption);
            }
            summary.per_flight.push(flight);
        }
        summary
    }

    /// Number of flights aggregated.
    #[must_use]
    pub fn flight_count(&self) -> usize {
        self.per_flight.len()
    }

    #[must_use]
    pub fn stats(&self, command: MissionCommand) -> Option<CommandStats> {
        self.pooled.get(&command).copied()
    }

    /// Mean over every sample of `command` across all flights.
    #[must_use]
    pub fn mean(&self, command: MissionCommand) -> Option<f64> {
        self.stats(command).map(|s| s.mean())
    }

    /// Mean of `command` within flight `flight` (0-based), if it was flown.
    #[must_use]
    pub fn flight_mean(&self, flight: usize, command: MissionCommand) -> Option<f64> {
        self.per_flight
            .get(flight)?
            .get(&command)
            .map(CommandStats::mean)
    }

    /// `(command, mean)` in command-name order.
    #[must_use]
    pub fn means(&self) -> Vec<(MissionCommand, f64)> {
        let mut out: Vec<_> = self.pooled.iter().map(|(c, s)| (*c, s.mean())).collect();
        out.sort_by_key(|(c, _)| c.name());
        out
    }

    /// Build a cost table from the pooled means.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError::MissingEntry`] if a routing action other than
    /// `up` was never flown.
    pub fn to_cost_table(&self) -> Result<CostTable, CostTableError> {
        CostTable::from_entries(self.means().into_iter().map(|(c, m)| (c.name(), m)))
    }
}

/// Render the averages CSV (one row per command, sorted by name).
#[must_use]
pub fn render_average_csv(summary: &ConsumptionSummary) -> String {
    render_rows(summary.means())
}

/// Parse an averages CSV back into `(command, mean)` pairs.
///
/// # Errors
///
/// Returns [`TelemetryError`] on format errors or a repeated command.
pub fn parse_average_csv(text: &str) -> Result<Vec<(MissionCommand, f64)>, TelemetryError> {
    let rows = parse_rows(text)?;
    let mut seen = BTreeMap::new();
    for (line, command, _) in &rows {
        if let Some(first) = seen.insert(*command, *line) {
            return Err(TelemetryError::MalformedRow {
                line: *line,
                detail: format!("{command} already listed on line {first}"),
            });
        }
    }
    Ok(rows.into_iter().map(|(_, c, v)| (c, v)).collect())
}

/// Poses visited by a flight, replaying routing commands from the origin.
///
/// `takeoff` and `land` do not move the pose. The origin is included.
///
/// # Errors
///
/// Returns [`ReplayError`] if a step overflows.
pub fn flight_trajectory(log: &FlightLog) -> Result<Vec<Pose>, ReplayError> {
    let actions: Vec<_> = log
        .records
        .iter()
        .filter_map(|r| r.command.as_action())
        .collect();
    replay_trajectory(Pose::origin(), &actions)
}

fn render_rows(rows: impl IntoIterator<Item = (MissionCommand, f64)>) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for (command, value) in rows {
        out.push_str(command.name());
        out.push(',');
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

fn parse_rows(text: &str) -> Result<Vec<(usize, MissionCommand, f64)>, TelemetryError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (_, header) = lines.next().ok_or(TelemetryError::Empty)?;
    if header.trim_start_matches('\u{feff}') != CSV_HEADER {
        return Err(TelemetryError::BadHeader {
            found: header.to_string(),
        });
    }

    let mut rows = Vec::new();
    for (line, text) in lines {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        let [name, raw] = fields.as_slice() else {
            return Err(TelemetryError::MalformedRow {
                line,
                detail: format!("expected 2 fields, found {}", fields.len()),
            });
        };
        let command: MissionCommand =
            name.parse().map_err(|_| TelemetryError::UnknownCommand {
                line,
                name: (*name).to_string(),
            })?;
        let consumption = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| TelemetryError::InvalidConsumption {
                line,
                raw: (*raw).to_string(),
            })?;
        rows.push((line, command, consumption));
    }
    Ok(rows)
}
