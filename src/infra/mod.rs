//! Infrastructure - configuration and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `metrics` - Lock-free counters for pipeline, tracker and camera activity

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::{Config, GeocoderKind};
pub use metrics::Metrics;
