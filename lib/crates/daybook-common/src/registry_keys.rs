/// Namespace under which pattern entries live in the KV store.
///
/// Format: `{prefix}{pattern}`, e.g. `daybook/hosts/web-prod-*`
/// Value: comma-joined service names, e.g. `api,worker`
pub const DEFAULT_PREFIX: &str = "daybook/hosts/";

/// Maps patterns to KV keys and back for one registry namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryKeys {
    prefix: String,
}

impl Default for RegistryKeys {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl RegistryKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// KV key holding the entry for `pattern`.
    #[must_use]
    pub fn pattern_key(&self, pattern: &str) -> String {
        format!("{}{pattern}", self.prefix)
    }

    /// Pattern stored under `key`, or `None` for keys outside the namespace
    /// and for the bare prefix itself.
    #[must_use]
    pub fn pattern_of<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.prefix.as_str())
            .filter(|pattern| !pattern.is_empty())
    }
}
