//! Cost module: the static per-action energy table and edge-cost models.
//!
//! The search engine only ever sees an [`model::EdgeCostModel`]. How the
//! table behind it was measured is a harness concern.

pub mod model;
pub mod table;
pub mod units;
