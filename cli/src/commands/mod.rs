//! Command implementations
//!
//! Backends are blocking, so handlers run them with
//! `tokio::task::block_in_place` on the multi-threaded runtime.

pub mod map;
pub mod pull;
pub mod push;
pub mod versions;
