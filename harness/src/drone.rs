//! Simulated drone: replays mission commands against a cost table.
//!
//! Poses move through the kernel transform. Energy is accounted in integer
//! [`CostUnits`] so a replayed flight is exact and reproducible. The state
//! machine matches the hardware: takeoff only from the ground, everything
//! else only in the air, and landing returns the drone to the origin.
//!
//! [`SimulatedDrone::predict_next_move`] gives one-step greedy advice toward
//! a destination and lands the drone once it is there.

use std::fmt;

use skyroute_kernel::carrier::action::{Action, MissionCommand};
use skyroute_kernel::carrier::pose::Pose;
use skyroute_kernel::cost::model::EnergyCostModel;
use skyroute_kernel::cost::table::{CostTable, CostTableError};
use skyroute_kernel::cost::units::CostUnits;
use skyroute_kernel::operators::apply::{apply, ApplyFailure};
use skyroute_search::route::Route;

use crate::telemetry::{FlightLog, FlightRecord};

/// Full charge, in cost units.
pub const FULL_CHARGE: CostUnits = CostUnits::from_steps(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightState {
    Landed,
    Airborne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroneError {
    /// `takeoff` while already in the air.
    AlreadyAirborne,
    /// A command that needs the drone in the air was sent on the ground.
    NotAirborne { command: MissionCommand },
    /// The pose transform overflowed.
    Transform(ApplyFailure),
}

impl fmt::Display for DroneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAirborne => write!(f, "takeoff rejected: already airborne"),
            Self::NotAirborne { command } => write!(f, "{command} rejected: drone is landed"),
            Self::Transform(failure) => write!(f, "pose transform failed: {failure}"),
        }
    }
}

impl std::error::Error for DroneError {}

impl From<ApplyFailure> for DroneError {
    fn from(failure: ApplyFailure) -> Self {
        Self::Transform(failure)
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedDrone {
    model: EnergyCostModel,
    takeoff: CostUnits,
    land: CostUnits,
    state: FlightState,
    pose: Pose,
    energy_used: CostUnits,
    history: Vec<(MissionCommand, CostUnits)>,
}

impl SimulatedDrone {
    /// A landed drone at the origin with a full battery.
    ///
    /// Missing takeoff/land entries cost nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CostTableError`] if the table cannot back an energy model.
    pub fn new(table: &CostTable) -> Result<Self, CostTableError> {
        Ok(Self {
            model: EnergyCostModel::new(table)?,
            takeoff: table
                .command_energy(MissionCommand::Takeoff)
                .unwrap_or(CostUnits::ZERO),
            land: table
                .command_energy(MissionCommand::Land)
                .unwrap_or(CostUnits::ZERO),
            state: FlightState::Landed,
            pose: Pose::origin(),
            energy_used: CostUnits::ZERO,
            history: Vec::new(),
        })
    }

    #[must_use]
    pub fn state(&self) -> FlightState {
        self.state
    }

    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    #[must_use]
    pub fn energy_used(&self) -> CostUnits {
        self.energy_used
    }

    /// Remaining charge, floored at zero.
    #[must_use]
    pub fn battery(&self) -> CostUnits {
        FULL_CHARGE.saturating_sub(self.energy_used)
    }

    /// Energy `command` would draw.
    #[must_use]
    pub fn command_energy(&self, command: MissionCommand) -> CostUnits {
        match command {
            MissionCommand::Takeoff => self.takeoff,
            MissionCommand::Land => self.land,
            MissionCommand::Route(action) => self.model.energy(action),
        }
    }

    /// Execute one command. On error the drone is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DroneError`] if the command is not valid in the current
    /// flight state or the pose overflows.
    pub fn execute(&mut self, command: MissionCommand) -> Result<Pose, DroneError> {
        match (command, self.state) {
            (MissionCommand::Takeoff, FlightState::Landed) => {
                self.state = FlightState::Airborne;
            }
            (MissionCommand::Takeoff, FlightState::Airborne) => {
                return Err(DroneError::AlreadyAirborne);
            }
            (_, FlightState::Landed) => return Err(DroneError::NotAirborne { command }),
            (MissionCommand::Land, FlightState::Airborne) => {
                self.state = FlightState::Landed;
                self.pose = Pose::origin();
            }
            (MissionCommand::Route(action), FlightState::Airborne) => {
                self.pose = apply(self.pose, action)?;
            }
        }
        let energy = self.command_energy(command);
        self.energy_used = self.energy_used.saturating_add(energy);
        self.history.push((command, energy));
        Ok(self.pose)
    }

    /// Fly `route`: place the landed drone at the route start, take off,
    /// fly every action, land.
    ///
    /// # Errors
    ///
    /// Returns [`DroneError`] if the drone is airborne or a step fails.
    pub fn fly_route(&mut self, route: &Route) -> Result<FlightReport, DroneError> {
        if self.state == FlightState::Airborne {
            return Err(DroneError::AlreadyAirborne);
        }
        self.pose = route.start;
        let energy_before = self.energy_used;

        self.execute(MissionCommand::Takeoff)?;
        for &action in &route.actions {
            self.execute(MissionCommand::Route(action))?;
        }
        let final_pose = self.pose;
        self.execute(MissionCommand::Land)?;

        let energy_used = self.energy_used.saturating_sub(energy_before);
        log::debug!(
            "flew {} actions to {final_pose}, energy {energy_used}%",
            route.len()
        );
        Ok(FlightReport {
            start: route.start,
            final_pose,
            actions: route.actions.clone(),
            energy_used,
            battery_remaining: self.battery(),
            depleted: self.energy_used > FULL_CHARGE,
        })
    }

    /// One-step greedy advice toward `destination`.
    ///
    /// Picks the action whose resulting pose is nearest `destination` in
    /// Euclidean distance over all four axes; ties go to the earlier action
    /// in `Action::ALL`. Poses are integral, so the drone has arrived exactly
    /// when it sits on `destination`: an airborne drone then lands.
    ///
    /// # Errors
    ///
    /// Returns [`DroneError`] if the arrival landing fails.
    pub fn predict_next_move(&mut self, destination: Pose) -> Result<NextMove, DroneError> {
        if self.pose == destination {
            if self.state == FlightState::Airborne {
                self.execute(MissionCommand::Land)?;
            }
            return Ok(NextMove::Arrived);
        }

        let mut best: Option<(Action, u128)> = None;
        for action in Action::ALL {
            let Ok(next) = apply(self.pose, action) else {
                continue;
            };
            let distance = squared_distance(&next, &destination);
            match best {
                Some((_, nearest)) if nearest <= distance => {}
                _ => best = Some((action, distance)),
            }
        }
        // `flip` never moves, so at least one candidate applies.
        Ok(NextMove::Advance(best.map_or(Action::Flip, |(action, _)| action)))
    }

    /// Everything executed so far, as a telemetry log.
    #[must_use]
    pub fn flight_log(&self) -> FlightLog {
        FlightLog {
            records: self
                .history
                .iter()
                .map(|&(command, energy)| FlightRecord {
                    command,
                    consumption: energy.as_percent(),
                })
                .collect(),
        }
    }
}

/// Advice from [`SimulatedDrone::predict_next_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextMove {
    /// Fly this action next.
    Advance(Action),
    /// The drone is on the destination, and is now landed.
    Arrived,
}

/// Squared Euclidean distance, saturating at `u128::MAX`.
fn squared_distance(a: &Pose, b: &Pose) -> u128 {
    a.components()
        .iter()
        .zip(b.components())
        .map(|(&p, q)| {
            let d = (i128::from(p) - i128::from(q)).unsigned_abs();
            d.saturating_mul(d)
        })
        .fold(0, u128::saturating_add)
}

/// Outcome of flying one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightReport {
    pub start: Pose,
    /// Pose just before landing.
    pub final_pose: Pose,
    pub actions: Vec<Action>,
    /// Energy drawn by this flight, takeoff and land included.
    pub energy_used: CostUnits,
    pub battery_remaining: CostUnits,
    /// More energy was drawn than a full charge holds.
    pub depleted: bool,
}

impl FlightReport {
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "actions": self.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            "battery_remaining": self.battery_remaining.units(),
            "depleted": self.depleted,
            "energy_used": self.energy_used.units(),
            "final_pose": self.final_pose.to_json_value(),
            "schema_version": "flight_report.v1",
            "start": self.start.to_json_value(),
        })
    }
}
