//! Tests for the `PatternRegistry` service over the in-memory KV backend.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use daybook_cli::application::ports::KvStore;
use daybook_cli::application::services::PatternRegistry;
use daybook_cli::infra::memory::MemoryKv;
use daybook_common::{DaybookError, RegistryKeys, Service};

fn registry() -> (MemoryKv, PatternRegistry<MemoryKv>) {
    let kv = MemoryKv::new();
    (kv.clone(), PatternRegistry::new(kv, RegistryKeys::default()))
}

fn names(services: &[Service]) -> Vec<&str> {
    services.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn test_more_specific_pattern_wins_for_matching_host() {
    let (_, reg) = registry();
    reg.add_services("web-*", &["nginx", "api"]).unwrap();
    reg.add_services("web-prod-*", &["api"]).unwrap();

    let resolved = reg.resolve_services_for_host("web-prod-1").unwrap();
    assert_eq!(names(&resolved), vec!["api"]);

    let resolved = reg.resolve_services_for_host("web-staging").unwrap();
    assert_eq!(names(&resolved), vec!["api", "nginx"]);
}

#[test]
fn test_resolved_services_are_unversioned() {
    let (_, reg) = registry();
    reg.add_services("db-?", &["postgres"]).unwrap();
    let resolved = reg.resolve_services_for_host("db-1").unwrap();
    assert_eq!(resolved, vec![Service::new("postgres")]);
}

#[test]
fn test_equal_length_patterns_pick_lexicographically_smallest() {
    let (_, reg) = registry();
    reg.add_services("web-?", &["a"]).unwrap();
    reg.add_services("we?-1", &["b"]).unwrap();
    let resolved = reg.resolve_services_for_host("web-1").unwrap();
    assert_eq!(names(&resolved), vec!["b"]);
}

#[test]
fn test_unmatched_host_resolves_to_nothing() {
    let (_, reg) = registry();
    reg.add_services("web-*", &["nginx"]).unwrap();
    assert!(reg.resolve_services_for_host("db-1").unwrap().is_empty());
}

#[test]
fn test_empty_winning_entry_shadows_broader_pattern() {
    let (_, reg) = registry();
    reg.add_services("web-*", &["nginx"]).unwrap();
    reg.add_services("web-canary", &["nginx"]).unwrap();
    reg.remove_services("web-canary", &["nginx"]).unwrap();
    assert!(reg.resolve_services_for_host("web-canary").unwrap().is_empty());
}

#[test]
fn test_add_is_idempotent_and_sorted() {
    let (kv, reg) = registry();
    reg.add_services("web-*", &["worker", "api"]).unwrap();
    let updated = reg.add_services("web-*", &["api"]).unwrap();
    assert_eq!(updated, vec!["api", "worker"]);
    assert_eq!(kv.raw("daybook/hosts/web-*"), Some(b"api,worker".to_vec()));
}

#[test]
fn test_remove_reports_remaining_set() {
    let (_, reg) = registry();
    reg.add_services("web-*", &["api", "nginx", "worker"]).unwrap();
    let remaining = reg.remove_services("web-*", &["nginx", "absent"]).unwrap();
    assert_eq!(remaining, Some(vec!["api".to_string(), "worker".to_string()]));
    assert_eq!(reg.list_services("web-*").unwrap(), vec!["api", "worker"]);
}

#[test]
fn test_remove_from_absent_pattern_creates_nothing() {
    let (kv, reg) = registry();
    assert_eq!(reg.remove_services("ghost-*", &["api"]).unwrap(), None);
    assert!(kv.raw("daybook/hosts/ghost-*").is_none());
}

#[test]
fn test_list_of_absent_pattern_is_not_found() {
    let (_, reg) = registry();
    let err = reg.list_services("ghost-*").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_values_written_by_other_tools_are_normalized_on_read() {
    let (kv, reg) = registry();
    kv.put("daybook/hosts/app-*", b" api , ,worker,api ").unwrap();
    assert_eq!(reg.list_services("app-*").unwrap(), vec!["api", "worker"]);
    let resolved = reg.resolve_services_for_host("app-1").unwrap();
    assert_eq!(names(&resolved), vec!["api", "worker"]);
}

#[test]
fn test_custom_prefix_scopes_every_operation() {
    let kv = MemoryKv::new();
    kv.put("daybook/hosts/web-*", b"legacy").unwrap();
    let reg = PatternRegistry::new(kv.clone(), RegistryKeys::new("fleet/eu/"));

    reg.add_services("web-*", &["api"]).unwrap();
    assert_eq!(kv.raw("fleet/eu/web-*"), Some(b"api".to_vec()));

    let entries = reg.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].pattern, "web-*");
    assert_eq!(entries[0].services, vec!["api"]);
}

#[test]
fn test_backend_failure_propagates_as_transport() {
    let (kv, reg) = registry();
    kv.inject_failure("daybook/hosts/");
    let err = reg.resolve_services_for_host("web-1").unwrap_err();
    assert!(matches!(err, DaybookError::Transport { .. }));
    let err = reg.add_services("web-*", &["api"]).unwrap_err();
    assert!(matches!(err, DaybookError::Transport { .. }));
}

#[test]
fn test_malformed_pattern_is_rejected_before_write() {
    let (kv, reg) = registry();
    let err = reg.add_services("web-[", &["api"]).unwrap_err();
    assert!(matches!(err, DaybookError::MalformedPattern { .. }));
    assert!(kv.list("daybook/hosts/").unwrap().is_empty());
}

#[test]
fn test_concurrent_adds_lose_no_names() {
    let (_, reg) = registry();
    let reg = reg.with_cas_attempts(100);
    let services = ["api", "nginx", "worker", "cron"];

    std::thread::scope(|scope| {
        for name in services {
            let reg = &reg;
            scope.spawn(move || reg.add_services("web-*", &[name]).unwrap());
        }
    });

    assert_eq!(
        reg.list_services("web-*").unwrap(),
        vec!["api", "cron", "nginx", "worker"]
    );
}
