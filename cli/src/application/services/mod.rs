//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod artifact_store;
pub mod pull;
pub mod registry;

pub use artifact_store::ArtifactStore;
pub use pull::{PullOptions, PullSummary, PulledArtifact, pull_host};
pub use registry::{DEFAULT_CAS_ATTEMPTS, PatternRegistry};
