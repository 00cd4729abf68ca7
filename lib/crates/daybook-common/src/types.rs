use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DaybookError, Result};

/// A deployable unit. Hosts resolve to unversioned services; the artifact
/// store fills in versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Opaque version token. Never ordered or compared beyond equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Validate that a service can be turned into an object key.
///
/// Names are `[A-Za-z0-9._-]+`, versions `[A-Za-z0-9._+-]+`. Neither may
/// start with a dot. A `-` inside a name is accepted but makes version
/// listing ambiguous for services sharing a prefix, so callers should avoid it.
pub fn validate_service(service: &Service) -> Result<()> {
    check_token("name", &service.name, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
    })?;
    if let Some(version) = &service.version {
        check_token("version", version, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+')
        })?;
    }
    Ok(())
}

fn check_token(field: &str, value: &str, allowed: impl Fn(char) -> bool) -> Result<()> {
    if value.is_empty() {
        return Err(DaybookError::InvalidService(format!("{field} must not be empty")));
    }
    if value.starts_with('.') {
        return Err(DaybookError::InvalidService(format!(
            "{field} '{value}' must not start with '.'"
        )));
    }
    if let Some(bad) = value.chars().find(|&c| !allowed(c)) {
        return Err(DaybookError::InvalidService(format!(
            "{field} '{value}' contains '{bad}'"
        )));
    }
    Ok(())
}
