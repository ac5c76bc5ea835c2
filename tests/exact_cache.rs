//! End-to-end behaviour of the exact-match cache.

use ai_lib_cache::{ContentHash, ExactCache, Record, Verbosity};

#[test]
fn test_hello_world_scenario() {
    let cache: ExactCache<String> = ExactCache::default();

    let miss = cache.lookup("m1", "hello").unwrap();
    assert!(miss.result().is_none());

    cache
        .insert(Record::miss("m1", ContentHash::of("hello")).with_result("A".to_string()))
        .unwrap();

    let hit = cache.lookup("m1", "hello").unwrap();
    assert_eq!(hit.result().map(String::as_str), Some("A"));

    let other = cache.lookup("m1", "world").unwrap();
    assert!(other.result().is_none());
}

#[test]
fn test_repeated_queries_are_idempotent() {
    let cache: ExactCache<u64> = ExactCache::default();
    for (i, input) in ["alpha", "beta", "gamma"].iter().enumerate() {
        let mut record = cache.lookup("m1", input).unwrap();
        record.set_result(i as u64);
        cache.insert(record).unwrap();
    }

    let queries = ["alpha", "delta", "gamma", "beta", "epsilon"];
    let first: Vec<Option<u64>> = queries
        .iter()
        .map(|q| cache.lookup("m1", q).unwrap().into_result())
        .collect();
    for _ in 0..5 {
        let again: Vec<Option<u64>> = queries
            .iter()
            .map(|q| cache.lookup("m1", q).unwrap().into_result())
            .collect();
        assert_eq!(again, first);
    }
    assert_eq!(first, vec![Some(0), None, Some(2), Some(1), None]);
}

#[test]
fn test_duplicate_entries_resolve_to_first() {
    let cache: ExactCache<&'static str> = ExactCache::default();
    cache
        .insert(Record::miss("m1", ContentHash::of("q")).with_result("first"))
        .unwrap();
    cache
        .insert(Record::miss("m1", ContentHash::of("q")).with_result("second"))
        .unwrap();
    let hit = cache.call("m1", "q", Verbosity::Detailed, 1.0).unwrap();
    assert_eq!(hit.result(), Some(&"first"));
}

#[test]
fn test_unknown_partition_is_a_miss_not_an_error() {
    let cache: ExactCache<u8> = ExactCache::default();
    let record = cache.lookup("never-seen", "anything").unwrap();
    assert!(!record.is_valid());
    assert!(cache.store().positions("never-seen").is_err());
    assert!(cache.store().positions_or_empty("never-seen").unwrap().is_empty());
}
