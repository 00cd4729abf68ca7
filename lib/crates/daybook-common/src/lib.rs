pub mod artifact;
pub mod config;
pub mod error;
pub mod registry_keys;
pub mod types;

pub use artifact::{ArtifactFormat, ArtifactFormats, Compression, artifact_key};
pub use config::DaybookConfig;
pub use error::{BoxError, DaybookError, Result};
pub use registry_keys::{DEFAULT_PREFIX, RegistryKeys};
pub use types::{Service, validate_service};
