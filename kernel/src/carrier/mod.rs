//! Carrier module: pose and action value types.
//!
//! This is the foundational layer. No other kernel module is imported here.

pub mod action;
pub mod pose;
