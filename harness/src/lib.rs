//! Skyroute Harness: telemetry, simulated flight and mission orchestration.
//!
//! The harness turns flight logs into a cost table, runs the search, replays
//! the route on a simulated drone and packages the evidence as a
//! self-contained artifact bundle. Route planning itself lives in
//! `skyroute_search`; pose and cost semantics live in `skyroute_kernel`.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bundle;
pub mod bundle_dir;
pub mod config;
pub mod drone;
pub mod runner;
pub mod synth;
pub mod telemetry;
