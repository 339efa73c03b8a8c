//! Tests for cache stores
//!
//! Both stores must behave the same; the file store additionally persists
//! across instances and writes atomically.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use livefeed_core::{CacheEntry, CacheError, CacheStore, FileCacheStore, MemoryCacheStore};

fn entry(key: &str, tag: &str) -> CacheEntry {
    CacheEntry::new(key, tag, json!({"key": key, "tag": tag}))
}

fn check_basic_contract(store: &dyn CacheStore) {
    assert!(store.get("graph_stats").unwrap().is_none());

    let first = entry("graph_stats", "\"v1\"");
    store.put(&first).unwrap();
    assert_eq!(store.get("graph_stats").unwrap(), Some(first));

    let second = entry("graph_stats", "\"v2\"");
    store.put(&second).unwrap();
    assert_eq!(store.get("graph_stats").unwrap(), Some(second));

    store.put(&entry("alerts", "\"a\"")).unwrap();
    assert_eq!(
        store.keys().unwrap(),
        vec!["alerts".to_string(), "graph_stats".to_string()]
    );

    store.remove("graph_stats").unwrap();
    assert!(store.get("graph_stats").unwrap().is_none());
    // Removing again is fine.
    store.remove("graph_stats").unwrap();
    assert_eq!(store.keys().unwrap(), vec!["alerts".to_string()]);
}

#[test]
fn test_memory_store_contract() {
    check_basic_contract(&MemoryCacheStore::new());
}

#[test]
fn test_file_store_contract() {
    let temp = TempDir::new().unwrap();
    check_basic_contract(&FileCacheStore::open(temp.path()).unwrap());
}

#[test]
fn test_file_store_creates_directory() {
    let temp = TempDir::new().unwrap();
    let store = FileCacheStore::open(temp.path()).unwrap();

    assert!(temp.path().join("responses").is_dir());
    assert_eq!(store.dir(), temp.path().join("responses"));
}

#[test]
fn test_file_store_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let stored = entry("metrics_summary", "W/\"abc\"");
    FileCacheStore::open(temp.path())
        .unwrap()
        .put(&stored)
        .unwrap();

    let reopened = FileCacheStore::open(temp.path()).unwrap();
    let loaded = reopened.get("metrics_summary").unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.stored_at, stored.stored_at);
}

#[test]
fn test_file_store_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let store = FileCacheStore::open(temp.path()).unwrap();
    store.put(&entry("interventions", "\"1\"")).unwrap();
    store.put(&entry("interventions", "\"2\"")).unwrap();

    let names: Vec<_> = fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["interventions.json".to_string()]);
}

#[test]
fn test_file_store_keys_ignore_other_files() {
    let temp = TempDir::new().unwrap();
    let store = FileCacheStore::open(temp.path()).unwrap();
    store.put(&entry("alerts", "\"a\"")).unwrap();
    fs::write(store.dir().join("stray.tmp"), b"partial").unwrap();
    fs::write(store.dir().join("README"), b"hello").unwrap();

    assert_eq!(store.keys().unwrap(), vec!["alerts".to_string()]);
}

#[test]
fn test_file_store_rejects_path_keys() {
    let temp = TempDir::new().unwrap();
    let store = FileCacheStore::open(temp.path()).unwrap();

    assert!(matches!(
        store.get("../outside"),
        Err(CacheError::InvalidKey(_))
    ));
    assert!(matches!(
        store.put(&entry("a/b", "\"x\"")),
        Err(CacheError::InvalidKey(_))
    ));
    assert!(!temp.path().join("outside.json").exists());
}

#[test]
fn test_file_store_corrupt_entry_is_error() {
    let temp = TempDir::new().unwrap();
    let store = FileCacheStore::open(temp.path()).unwrap();
    fs::write(store.dir().join("graph_stats.json"), b"{ truncated").unwrap();

    assert!(matches!(
        store.get("graph_stats"),
        Err(CacheError::Json(_))
    ));
}
