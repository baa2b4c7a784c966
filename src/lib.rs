//! Venue discovery engine
//!
//! Location-aware filtering of a venue catalog with a list and a map kept in
//! sync. Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
