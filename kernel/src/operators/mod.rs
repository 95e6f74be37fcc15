//! Operators module: the `apply()` entry point mapping actions to pose deltas.
//!
//! Depends on `carrier`. Does not import from `cost` or `proof`.

pub mod apply;
