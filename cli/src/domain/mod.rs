//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod error;
pub mod pattern;

pub use error::ConfigError;
pub use pattern::{
    HostPattern, PatternEntry, decode_service_names, encode_service_names, select_most_specific,
};
