//! Skyroute Search: deterministic best-first route search over drone poses.
//!
//! Depends only on `skyroute_kernel`; it does NOT depend on
//! `skyroute_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! skyroute_kernel  ←  skyroute_search  ←  skyroute_harness
//! (pose, cost)        (frontier, nodes)    (telemetry, bundles, CLI)
//! ```
//!
//! # Key types
//!
//! - [`search::search`] — the entry point
//! - [`node::SearchNode`] — arena node with `f = g + h + c`
//! - [`policy::SearchPolicy`] — expansion budget, depth/cost cutoffs, bounds
//! - [`graph::SearchGraph`] — expansion-event audit log
//! - [`route::Route`] — the returned action sequence

#![forbid(unsafe_code)]

pub mod error;
pub mod frontier;
pub mod graph;
pub mod node;
pub mod policy;
pub mod route;
pub mod search;
