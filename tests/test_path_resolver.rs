use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use sguard::SGuardError;
use sguard::security::SecurePathResolver;

#[test]
fn resolves_nested_relative_paths_inside_base_directory() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("rules.json");
    let resolver = SecurePathResolver::new(100, 100);

    let resolved = resolver.resolve("config/./prod/../prod.json", &base).unwrap();
    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("config/prod.json"));
    assert!(!resolved.to_string_lossy().contains(".."));
}

#[test]
fn denies_traversal_out_of_base_directory() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("app").join("rules.json");
    let err = SecurePathResolver::new(100, 100)
        .resolve("../../etc/passwd", &base)
        .unwrap_err();
    assert!(matches!(err, SGuardError::UnauthorizedAccess { .. }));
}

#[test]
fn concurrent_resolution_respects_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let base = Arc::new(dir.path().join("rules.json"));
    let resolver = Arc::new(SecurePathResolver::new(32, 100));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let resolver = Arc::clone(&resolver);
            let base = Arc::clone(&base);
            thread::spawn(move || {
                for i in 0..200 {
                    let path = format!("settings/{worker}/{i}.json");
                    let resolved = resolver.resolve(&path, &base).unwrap();
                    assert!(resolved.ends_with(format!("{worker}/{i}.json")));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // The last sweep starts after the last insert.
    assert!(resolver.cache_len() <= 32, "cache grew to {}", resolver.cache_len());
}

#[test]
fn repeated_resolution_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("rules.json");
    let resolver = SecurePathResolver::new(4, 50);
    let first = resolver.resolve("a.json", &base).unwrap();
    for _ in 0..10 {
        assert_eq!(resolver.resolve("a.json", &base).unwrap(), first);
    }
    resolver.clear_cache();
    assert_eq!(resolver.cache_len(), 0);
    assert_eq!(resolver.resolve("a.json", &base).unwrap(), first);
}

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,6}",
        1 => Just("..".to_string()),
        1 => Just(".".to_string()),
    ]
}

proptest! {
    #[test]
    fn resolution_is_contained_and_idempotent(segments in prop::collection::vec(segment(), 1..8)) {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("rules.json");
        let resolver = SecurePathResolver::new(16, 100);
        let path = segments.join("/");

        match resolver.resolve(&path, &base) {
            Ok(resolved) => {
                prop_assert!(resolved.starts_with(dir.path()));
                prop_assert_eq!(resolver.resolve(&path, &base).unwrap(), resolved);
            }
            Err(err) => prop_assert!(matches!(err, SGuardError::UnauthorizedAccess { .. }), "unexpected error: {:?}", err),
        }
    }
}
