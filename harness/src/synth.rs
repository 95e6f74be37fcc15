//! Synthetic telemetry: seeded random sorties in the flight-log format.
//!
//! A sortie is `takeoff`, then routing commands drawn uniformly from the
//! profile until the battery is depleted, then `land`. `up` is never drawn,
//! so synthetic logs never carry an `up` sample.

use std::path::{Path, PathBuf};

use skyroute_kernel::carrier::action::{Action, MissionCommand};

use crate::telemetry::{FlightLog, FlightRecord, TelemetryError};

/// Battery percentage at takeoff.
pub const FULL_BATTERY: f64 = 100.0;

/// Cap on routing commands per sortie, for profiles with zero-cost ranges.
pub const MAX_ROUTING_COMMANDS: usize = 10_000;

/// How a command's consumption is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsumptionRange {
    /// Uniform real in `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// Uniform integer in `[min, max]`. Inverted bounds are swapped.
    Whole { min: u32, max: u32 },
}

impl ConsumptionRange {
    fn sample(self, rng: &mut fastrand::Rng) -> f64 {
        match self {
            Self::Uniform { low, high } => low + rng.f64() * (high - low),
            Self::Whole { min, max } => f64::from(rng.u32(min.min(max)..=min.max(max))),
        }
    }
}

/// Per-command consumption ranges for synthetic sorties.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryProfile {
    pub takeoff: ConsumptionRange,
    pub land: ConsumptionRange,
    /// Routing actions and their ranges. Only these are drawn mid-flight.
    pub routing: Vec<(Action, ConsumptionRange)>,
}

impl Default for TelemetryProfile {
    fn default() -> Self {
        let uniform = |low, high| ConsumptionRange::Uniform { low, high };
        Self {
            takeoff: ConsumptionRange::Whole { min: 4, max: 5 },
            land: ConsumptionRange::Whole { min: 2, max: 3 },
            routing: vec![
                (Action::Down, uniform(1.0, 1.4)),
                (Action::Left, uniform(0.8, 1.2)),
                (Action::Right, uniform(0.8, 1.2)),
                (Action::Forward, uniform(0.8, 1.2)),
                (Action::Back, uniform(0.8, 1.2)),
                (Action::Cw, uniform(1.3, 1.7)),
                (Action::Ccw, uniform(1.3, 1.7)),
                (Action::Flip, uniform(1.5, 2.5)),
            ],
        }
    }
}

/// Generate one sortie.
///
/// The battery is debited with every recorded value, takeoff included. The
/// last routing command is the one that takes it to zero or below.
#[must_use]
pub fn generate_flight(profile: &TelemetryProfile, rng: &mut fastrand::Rng) -> FlightLog {
    let mut records = Vec::new();
    let mut battery = FULL_BATTERY;

    let takeoff = profile.takeoff.sample(rng);
    records.push(FlightRecord {
        command: MissionCommand::Takeoff,
        consumption: takeoff,
    });
    battery -= takeoff;

    let drawable: Vec<_> = profile
        .routing
        .iter()
        .filter(|(action, _)| *action != Action::Up)
        .copied()
        .collect();

    let mut flown = 0;
    while battery > 0.0 && !drawable.is_empty() && flown < MAX_ROUTING_COMMANDS {
        let (action, range) = drawable[rng.usize(..drawable.len())];
        let consumption = range.sample(rng);
        records.push(FlightRecord {
            command: MissionCommand::Route(action),
            consumption,
        });
        battery -= consumption;
        flown += 1;
    }

    records.push(FlightRecord {
        command: MissionCommand::Land,
        consumption: profile.land.sample(rng),
    });
    FlightLog { records }
}

/// File name of the `n`th synthetic log (1-based).
#[must_use]
pub fn log_file_name(n: usize) -> String {
    format!("battery_consumption_data_{n}.csv")
}

/// Write `count` sorties with the default profile into `dir`.
///
/// Creates `dir` if needed. The same seed always yields the same files.
///
/// # Errors
///
/// Returns [`TelemetryError::Io`] on write failure.
pub fn write_synthetic_logs(
    dir: &Path,
    count: usize,
    seed: u64,
) -> Result<Vec<PathBuf>, TelemetryError> {
    let io_err = |path: &Path, e: std::io::Error| TelemetryError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    };

    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let profile = TelemetryProfile::default();
    let mut rng = fastrand::Rng::with_seed(seed);

    let mut written = Vec::with_capacity(count);
    for n in 1..=count {
        let path = dir.join(log_file_name(n));
        let log = generate_flight(&profile, &mut rng);
        std::fs::write(&path, log.to_csv()).map_err(|e| io_err(&path, e))?;
        written.push(path);
    }
    log::info!("wrote {count} synthetic flight logs to {} (seed {seed})", dir.display());
    Ok(written)
}
