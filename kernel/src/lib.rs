//! Skyroute Kernel: the deterministic core shared by search and replay.
//!
//! # API Surface
//!
//! - [`carrier`] -- `Pose`, `Action`, `MissionCommand` value types
//! - [`operators::apply::apply`] -- the single pose transform for every action
//! - [`cost`] -- `CostTable` and the `EdgeCostModel` implementations
//! - [`proof`] -- canonical JSON, domain-separated hashing, route replay
//!
//! # Module Dependency Direction
//!
//! `carrier` ← `operators` ← `cost` ← `proof`
//!
//! One-way only. `cost` reads `carrier` types only; `proof` may use all of them.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod carrier;
pub mod cost;
pub mod operators;
pub mod proof;
