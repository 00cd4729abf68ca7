//! Host pattern registry service.
//!
//! Maps hosts to services through glob patterns stored in the KV backend.
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeSet;

use daybook_common::{DaybookError, RegistryKeys, Result, Service, validate_service};
use tracing::{debug, warn};

use crate::application::ports::KvStore;
use crate::domain::{
    HostPattern, PatternEntry, decode_service_names, encode_service_names, select_most_specific,
};

/// Compare-and-swap attempts before a mutation gives up.
pub const DEFAULT_CAS_ATTEMPTS: u32 = 5;

/// Pattern registry over a KV backend.
pub struct PatternRegistry<K> {
    kv: K,
    keys: RegistryKeys,
    cas_attempts: u32,
}

impl<K: KvStore> PatternRegistry<K> {
    pub fn new(kv: K, keys: RegistryKeys) -> Self {
        Self {
            kv,
            keys,
            cas_attempts: DEFAULT_CAS_ATTEMPTS,
        }
    }

    /// Override the number of compare-and-swap attempts (at least one).
    #[must_use]
    pub fn with_cas_attempts(mut self, attempts: u32) -> Self {
        self.cas_attempts = attempts.max(1);
        self
    }

    /// Services mapped to `host` by the most specific matching pattern.
    ///
    /// Returns an empty list when nothing matches. Malformed patterns are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the namespace cannot be listed.
    pub fn resolve_services_for_host(&self, host: &str) -> Result<Vec<Service>> {
        let entries = self.kv.list(self.keys.prefix())?;
        let candidates = entries
            .into_iter()
            .filter_map(|entry| {
                let raw = self.keys.pattern_of(&entry.key)?;
                match HostPattern::parse(raw) {
                    Ok(pattern) => Some((pattern, entry.value)),
                    Err(err) => {
                        warn!(key = %entry.key, error = %err, "skipping malformed pattern");
                        None
                    }
                }
            })
            .filter(|(pattern, _)| pattern.matches(host))
            .collect();

        let Some((winner, value)) = select_most_specific(candidates) else {
            debug!(host, "no pattern matches host");
            return Ok(Vec::new());
        };
        debug!(host, pattern = winner.as_str(), "host resolved");
        Ok(decode_service_names(&value)
            .into_iter()
            .map(Service::new)
            .collect())
    }

    /// Add `names` to the set stored under `pattern`, creating the entry if
    /// needed. Returns the resulting set.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPattern` or `InvalidService` before anything is
    /// written, `ConcurrentModification` when retries run out, and
    /// `Transport` on backend failure.
    pub fn add_services<S: AsRef<str>>(&self, pattern: &str, names: &[S]) -> Result<Vec<String>> {
        HostPattern::parse(pattern)?;
        for name in names {
            validate_service(&Service::new(name.as_ref()))?;
        }
        let updated = self.update_entry(pattern, true, |set| {
            set.extend(names.iter().map(|n| n.as_ref().to_string()));
        })?;
        Ok(updated.unwrap_or_default())
    }

    /// Remove `names` from the set stored under `pattern`.
    ///
    /// Returns `None` without writing when the pattern has no entry. An entry
    /// emptied by removal is kept.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` when retries run out and `Transport`
    /// on backend failure.
    pub fn remove_services<S: AsRef<str>>(
        &self,
        pattern: &str,
        names: &[S],
    ) -> Result<Option<Vec<String>>> {
        self.update_entry(pattern, false, |set| {
            for name in names {
                set.remove(name.as_ref());
            }
        })
    }

    /// Service names stored under `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the pattern has no entry; an existing empty
    /// entry yields an empty list.
    pub fn list_services(&self, pattern: &str) -> Result<Vec<String>> {
        match self.kv.get(&self.keys.pattern_key(pattern))? {
            Some(entry) => Ok(decode_service_names(&entry.value)),
            None => Err(DaybookError::not_found(format!("pattern '{pattern}'"))),
        }
    }

    /// Every stored entry, sorted by pattern.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the namespace cannot be listed.
    pub fn entries(&self) -> Result<Vec<PatternEntry>> {
        let mut entries: Vec<PatternEntry> = self
            .kv
            .list(self.keys.prefix())?
            .into_iter()
            .filter_map(|entry| {
                let pattern = self.keys.pattern_of(&entry.key)?.to_string();
                Some(PatternEntry {
                    pattern,
                    services: decode_service_names(&entry.value),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.pattern.cmp(&b.pattern));
        Ok(entries)
    }

    /// Read-modify-write loop guarded by the entry's revision.
    fn update_entry(
        &self,
        pattern: &str,
        create_if_absent: bool,
        apply: impl Fn(&mut BTreeSet<String>),
    ) -> Result<Option<Vec<String>>> {
        let key = self.keys.pattern_key(pattern);
        for attempt in 1..=self.cas_attempts {
            let current = self.kv.get(&key)?;
            if current.is_none() && !create_if_absent {
                debug!(pattern, "no entry to update");
                return Ok(None);
            }
            let revision = current.as_ref().map(|entry| entry.revision);
            let mut set: BTreeSet<String> = current
                .map(|entry| decode_service_names(&entry.value))
                .unwrap_or_default()
                .into_iter()
                .collect();
            apply(&mut set);

            if self
                .kv
                .put_if_revision(&key, &encode_service_names(&set), revision)?
            {
                debug!(pattern, services = set.len(), "entry written");
                return Ok(Some(set.into_iter().collect()));
            }
            debug!(pattern, attempt, "entry changed concurrently, retrying");
        }
        Err(DaybookError::ConcurrentModification {
            pattern: pattern.to_string(),
            attempts: self.cas_attempts,
        })
    }
}
