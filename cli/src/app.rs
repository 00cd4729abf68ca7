//! Application context: state shared by every command handler.
//!
//! Holds the loaded configuration and output settings, and builds the
//! backend adapters on demand so commands that never touch S3 do not need
//! AWS credentials.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use daybook_common::{ArtifactFormats, DaybookConfig, RegistryKeys};

use crate::application::ports::ConfigStore;
use crate::application::services::{ArtifactStore, PatternRegistry};
use crate::infra::archive::{ExtractOptions, TarArchiveExtractor};
use crate::infra::config::FileConfigStore;
use crate::infra::consul::{ConsulKv, DEFAULT_CONSUL_ADDR};
use crate::infra::s3::{Credentials, S3ObjectStore, S3Settings};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    /// `--config-file`, if given.
    pub config_file: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration after environment fallbacks and validation.
    pub config: DaybookConfig,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed or validated.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let store = FileConfigStore::resolve(flags.config_file.clone());
        let config = store.load()?;
        tracing::debug!(path = %store.path().display(), "configuration loaded");

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        // Progress lines would corrupt JSON on stdout.
        let quiet = flags.output.quiet || flags.output.json;

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config,
        })
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.http_timeout_secs)
    }

    /// Pattern registry over the configured Consul agent.
    #[must_use]
    pub fn registry(&self) -> PatternRegistry<ConsulKv> {
        let addr = self
            .config
            .consul_addr
            .as_deref()
            .unwrap_or(DEFAULT_CONSUL_ADDR);
        tracing::debug!(addr, prefix = %self.config.registry_prefix, "using consul registry");
        let kv = ConsulKv::new(addr, self.config.consul_token.clone(), self.timeout());
        PatternRegistry::new(kv, RegistryKeys::new(self.config.registry_prefix.clone()))
    }

    /// Artifact store over the configured bucket.
    ///
    /// Async because the SDK client is configured on the running runtime;
    /// the returned store itself is blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if AWS credentials are missing or the endpoint is malformed.
    pub async fn artifact_store(&self) -> Result<ArtifactStore<S3ObjectStore>> {
        let access_key = self.config.aws_access_key.clone().context(
            "AWS access key missing. Set 'aws_access_key' in the config or AWS_ACCESS_KEY_ID",
        )?;
        let secret_key = self.config.aws_secret_key.clone().context(
            "AWS secret key missing. Set 'aws_secret_key' in the config or AWS_SECRET_ACCESS_KEY",
        )?;
        tracing::debug!(
            endpoint = self.config.s3_endpoint.as_deref().unwrap_or("aws"),
            bucket = %self.config.bucket_name,
            "using s3 artifact store"
        );
        let objects = S3ObjectStore::connect(S3Settings {
            endpoint: self.config.s3_endpoint.clone(),
            bucket: self.config.bucket_name.clone(),
            region: self.config.aws_region.clone(),
            credentials: Credentials {
                access_key,
                secret_key,
                session_token: self.config.aws_session_token.clone(),
            },
            timeout: self.timeout(),
        })
        .await?;
        Ok(ArtifactStore::new(objects, ArtifactFormats::default()))
    }

    /// Archive extractor honouring the configured layout.
    #[must_use]
    pub fn extractor(&self) -> TarArchiveExtractor {
        TarArchiveExtractor::new(ExtractOptions {
            flatten_directories: self.config.flatten_directories,
        })
    }
}
