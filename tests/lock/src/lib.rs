//! Shared support for the workspace lock tests.

pub mod bundle_test_helpers;
pub mod missions;
