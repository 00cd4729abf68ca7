//! Infrastructure layer: adapters implementing the application ports.

pub mod archive;
pub mod config;
pub mod consul;
pub mod fs;
pub mod host;
pub mod memory;
pub mod s3;
