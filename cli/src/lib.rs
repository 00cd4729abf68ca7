//! Daybook CLI library.
//!
//! Layers, innermost first:
//! - `domain`: pattern matching and service-set encoding, no I/O
//! - `application`: port traits and the registry, store and pull services
//! - `infra`: Consul, S3, tar, filesystem and config adapters
//! - `commands` / `output`: clap handlers and rendering

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod output;
