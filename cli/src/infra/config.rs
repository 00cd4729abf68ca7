//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::Result;
use daybook_common::DaybookConfig;

use crate::application::ports::ConfigStore;
use crate::domain::ConfigError;

/// Location used when neither `--config-file` nor `DAYBOOK_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/daybook.json";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "DAYBOOK_CONFIG";

/// Reads `DaybookConfig` from a JSON or YAML file, chosen by extension.
pub struct FileConfigStore {
    path: PathBuf,
    env: fn(&str) -> Option<String>,
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: process_env,
        }
    }

    /// Pick the path from the flag, then `DAYBOOK_CONFIG`, then the default.
    #[must_use]
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let path = flag
            .or_else(|| process_env(CONFIG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::new(path)
    }

    /// Replace the environment lookup used for credential fallbacks.
    #[must_use]
    pub fn with_env(mut self, env: fn(&str) -> Option<String>) -> Self {
        self.env = env;
        self
    }

    fn parse(&self, content: &str) -> Result<DaybookConfig, ConfigError> {
        let path = self.path.display().to_string();
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                path,
                reason: e.to_string(),
            }),
            Some("yaml" | "yml") => {
                serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                    path,
                    reason: e.to_string(),
                })
            }
            _ => Err(ConfigError::UnsupportedExtension { path }),
        }
    }

    /// Fill credentials and addresses left unset in the file.
    fn apply_env(&self, config: &mut DaybookConfig) {
        let env = self.env;
        let fill = |field: &mut Option<String>, var: &str| {
            if field.as_deref().is_none_or(str::is_empty) {
                *field = env(var);
            }
        };
        fill(&mut config.aws_access_key, "AWS_ACCESS_KEY_ID");
        fill(&mut config.aws_secret_key, "AWS_SECRET_ACCESS_KEY");
        fill(&mut config.aws_session_token, "AWS_SESSION_TOKEN");
        fill(&mut config.consul_addr, "CONSUL_HTTP_ADDR");
        fill(&mut config.consul_token, "CONSUL_HTTP_TOKEN");
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<DaybookConfig> {
        let mut config = if self.path.exists() {
            let content =
                std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
                    path: self.path.display().to_string(),
                    source,
                })?;
            self.parse(&content)?
        } else {
            tracing::debug!(path = %self.path.display(), "config file absent, using defaults");
            DaybookConfig::default()
        };
        config.fill_blank_defaults();
        self.apply_env(&mut config);
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
