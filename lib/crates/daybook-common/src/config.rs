use serde::{Deserialize, Serialize};

use crate::registry_keys::DEFAULT_PREFIX;

/// Daybook configuration, read from `/etc/daybook.json` by default.
///
/// Every field is optional in the file. Credentials and backend addresses
/// left unset are filled from the usual `AWS_*` / `CONSUL_HTTP_*`
/// environment variables by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaybookConfig {
    /// Host identity used for resolution. Defaults to the system hostname.
    pub hostname: Option<String>,

    /// Root under which artifacts are extracted as `{name}/{version}`.
    pub install_dir: String,

    pub bucket_name: String,

    pub aws_region: String,

    pub aws_access_key: Option<String>,

    pub aws_secret_key: Option<String>,

    pub aws_session_token: Option<String>,

    /// Object store endpoint for S3-compatible servers. Unset means AWS.
    pub s3_endpoint: Option<String>,

    pub consul_addr: Option<String>,

    pub consul_token: Option<String>,

    /// KV namespace for pattern entries. Must end with `/`.
    pub registry_prefix: String,

    /// Place directory entries at `root/<basename>` as older releases did.
    pub flatten_directories: bool,

    /// Extract into a staging directory and rename it into place on success.
    pub staged_install: bool,

    pub http_timeout_secs: u64,
}

impl Default for DaybookConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            install_dir: "/tmp".to_string(),
            bucket_name: "daybook".to_string(),
            aws_region: "us-east-1".to_string(),
            aws_access_key: None,
            aws_secret_key: None,
            aws_session_token: None,
            s3_endpoint: None,
            consul_addr: None,
            consul_token: None,
            registry_prefix: DEFAULT_PREFIX.to_string(),
            flatten_directories: false,
            staged_install: false,
            http_timeout_secs: 30,
        }
    }
}

impl DaybookConfig {
    /// Treat blank strings in the file as if the field were absent.
    ///
    /// Older config files carry `""` for settings they do not use.
    pub fn fill_blank_defaults(&mut self) {
        let defaults = Self::default();
        let reset = |field: &mut String, default: String| {
            if field.trim().is_empty() {
                *field = default;
            }
        };
        reset(&mut self.install_dir, defaults.install_dir);
        reset(&mut self.bucket_name, defaults.bucket_name);
        reset(&mut self.aws_region, defaults.aws_region);
        reset(&mut self.registry_prefix, defaults.registry_prefix);

        for field in [
            &mut self.hostname,
            &mut self.aws_access_key,
            &mut self.aws_secret_key,
            &mut self.aws_session_token,
            &mut self.s3_endpoint,
            &mut self.consul_addr,
            &mut self.consul_token,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
    }

    /// Check values that would otherwise fail far from where they were set.
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket_name.trim().is_empty() {
            return Err("bucket_name must not be empty".to_string());
        }
        if self.install_dir.trim().is_empty() {
            return Err("install_dir must not be empty".to_string());
        }
        if self.registry_prefix.is_empty() || !self.registry_prefix.ends_with('/') {
            return Err(format!(
                "registry_prefix '{}' must be non-empty and end with '/'",
                self.registry_prefix
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err("http_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}
