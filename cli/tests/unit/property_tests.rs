//! Property-based tests for registry mutations and artifact naming.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeSet;

use proptest::prelude::*;

use daybook_cli::application::services::{ArtifactStore, PatternRegistry};
use daybook_cli::domain::{decode_service_names, encode_service_names};
use daybook_cli::infra::memory::{MemoryKv, MemoryObjectStore};
use daybook_common::{ArtifactFormats, RegistryKeys, Service};

fn service_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(service_name(), 1..6)
}

fn registry() -> PatternRegistry<MemoryKv> {
    PatternRegistry::new(MemoryKv::new(), RegistryKeys::default())
}

// ============================================================================
// Registry mutations
// ============================================================================

proptest! {
    /// After any two adds, the entry holds exactly the union, sorted.
    #[test]
    fn prop_add_accumulates_union(first in names(), second in names()) {
        let reg = registry();
        reg.add_services("web-*", &first).unwrap();
        reg.add_services("web-*", &second).unwrap();

        let expected: Vec<String> = first
            .iter()
            .chain(&second)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(reg.list_services("web-*").unwrap(), expected);
    }

    /// Removed names are gone and everything else survives.
    #[test]
    fn prop_remove_excludes_only_removed(initial in names(), removed in names()) {
        let reg = registry();
        reg.add_services("db-?", &initial).unwrap();
        let remaining = reg.remove_services("db-?", &removed).unwrap().unwrap();

        for name in &removed {
            prop_assert!(!remaining.contains(name), "{} still present", name);
        }
        for name in initial.iter().filter(|n| !removed.contains(n)) {
            prop_assert!(remaining.contains(name), "{} was lost", name);
        }
        prop_assert_eq!(reg.list_services("db-?").unwrap(), remaining);
    }

    /// A literal hostname pattern always beats a wildcard that also matches.
    #[test]
    fn prop_literal_pattern_beats_wildcard(host in "[a-z]{1,6}-[0-9]{1,3}") {
        let reg = registry();
        let prefix = &host[..1];
        reg.add_services(&format!("{prefix}*"), &["broad"]).unwrap();
        reg.add_services(&host, &["exact"]).unwrap();

        let resolved = reg.resolve_services_for_host(&host).unwrap();
        prop_assert_eq!(resolved, vec![Service::new("exact")]);
    }
}

// ============================================================================
// Service set encoding
// ============================================================================

proptest! {
    /// Encoded values are sorted, deduplicated and decode to the same set.
    #[test]
    fn prop_encoded_sets_are_canonical(input in names()) {
        let set: BTreeSet<String> = input.iter().cloned().collect();
        let encoded = encode_service_names(&set);
        let decoded = decode_service_names(&encoded);

        let mut sorted = decoded.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(&decoded, &sorted);
        prop_assert_eq!(decoded.len(), set.len());
    }
}

// ============================================================================
// Artifact naming
// ============================================================================

proptest! {
    /// Every stored version is listed back under its own name.
    #[test]
    fn prop_stored_versions_are_listed(
        name in service_name(),
        versions in prop::collection::btree_set("[0-9][0-9a-z.+]{0,6}", 1..5),
    ) {
        let objects = MemoryObjectStore::new();
        for version in &versions {
            objects.insert(format!("{name}-{version}.tar.gz"), b"x".to_vec(), "application/x-gtar");
        }
        let store = ArtifactStore::new(objects, ArtifactFormats::default());

        let listed: BTreeSet<String> = store
            .list_versions(&name)
            .unwrap()
            .into_iter()
            .filter_map(|s| s.version)
            .collect();
        prop_assert_eq!(listed, versions);
    }
}
