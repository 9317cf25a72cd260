//! Tests for Engine
//!
//! These tests verify:
//! - Basic get/put/delete operations
//! - Not-found vs empty value
//! - Checkpoint cycles through the engine
//! - Concurrent access patterns
//! - Engine lifecycle (open/close, background checkpointer)

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use emberkv::checkpoint::CheckpointOutcome;
use emberkv::config::{Config, WalSyncStrategy};
use emberkv::engine::Engine;
use emberkv::storage::SnapshotStore;
use emberkv::EmberError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn manual_config(dir: &std::path::Path) -> Config {
    Config::builder()
        .data_dir(dir)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .background_checkpoint(false)
        .build()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(manual_config(temp_dir.path())).unwrap();
    (temp_dir, engine)
}

fn snapshot_entries(engine: &Engine) -> Vec<(String, String)> {
    SnapshotStore::new(&engine.config().snapshot_path)
        .load()
        .unwrap()
        .into_iter()
        .collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("nested").join("db");

    let engine = Engine::open(manual_config(&data_dir)).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("wal.log").exists());
    engine.close().unwrap();
}

#[test]
fn test_engine_put_get() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("hello", "world").unwrap();

    assert_eq!(engine.get("hello"), Some("world".to_string()));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.get("nonexistent"), None);
}

#[test]
fn test_engine_put_overwrite() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("key", "value1").unwrap();
    engine.put("key", "value2").unwrap();

    assert_eq!(engine.get("key"), Some("value2".to_string()));
}

#[test]
fn test_engine_delete() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("key", "value").unwrap();
    engine.delete("key").unwrap();

    assert_eq!(engine.get("key"), None);
}

#[test]
fn test_engine_delete_nonexistent_key() {
    let (_temp, engine) = setup_temp_engine();

    engine.delete("nonexistent").unwrap();

    assert_eq!(engine.get("nonexistent"), None);
    assert!(engine.is_empty());
}

#[test]
fn test_engine_empty_value_is_found() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("key", "").unwrap();

    assert_eq!(engine.get("key"), Some(String::new()));
    assert_eq!(engine.get("other"), None);
}

#[test]
fn test_engine_rejects_unencodable_input() {
    let (_temp, engine) = setup_temp_engine();

    assert!(matches!(
        engine.put("two words", "v"),
        Err(EmberError::InvalidKey(_))
    ));
    assert!(matches!(
        engine.put("k", "line\nbreak"),
        Err(EmberError::InvalidValue(_))
    ));

    // Nothing reached the log or the index
    assert_eq!(engine.last_sequence(), None);
    assert!(engine.is_empty());
}

#[test]
fn test_engine_sequences_follow_mutations() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("a", "1").unwrap();
    engine.delete("a").unwrap();
    engine.delete("never").unwrap();

    assert_eq!(engine.last_sequence(), Some(2));
    let records = engine.log_records().unwrap();
    let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
    assert_eq!(lines, vec!["0 PUT a 1", "1 DELETE a", "2 DELETE never"]);
}

// =============================================================================
// Checkpoint Tests
// =============================================================================

#[test]
fn test_engine_checkpoint_scenario() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("k1", "x").unwrap();
    engine.put("k2", "y").unwrap();
    engine.delete("k1").unwrap();

    assert!(engine.checkpoint().unwrap().is_completed());

    assert_eq!(snapshot_entries(&engine), vec![("k2".to_string(), "y".to_string())]);
    assert_eq!(engine.get("k1"), None);
    assert_eq!(engine.get("k2"), Some("y".to_string()));
    assert_eq!(engine.checkpoint_marker(), Some(2));
}

#[test]
fn test_engine_last_write_wins() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("k", "x").unwrap();
    engine.delete("k").unwrap();
    engine.put("k", "y").unwrap();
    engine.checkpoint().unwrap();

    assert_eq!(snapshot_entries(&engine), vec![("k".to_string(), "y".to_string())]);
    assert_eq!(engine.get("k"), Some("y".to_string()));
}

#[test]
fn test_engine_delete_absent_key_after_checkpoint() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("5", "a").unwrap();
    engine.checkpoint().unwrap();
    engine.put("5", "b").unwrap();
    engine.delete("4").unwrap();

    assert_eq!(engine.get("4"), None);
    assert_eq!(engine.get("5"), Some("b".to_string()));

    engine.checkpoint().unwrap();
    assert_eq!(snapshot_entries(&engine), vec![("5".to_string(), "b".to_string())]);
}

#[test]
fn test_engine_checkpoint_twice_skips() {
    let (_temp, engine) = setup_temp_engine();

    engine.put("a", "1").unwrap();
    engine.checkpoint().unwrap();

    assert!(matches!(
        engine.checkpoint().unwrap(),
        CheckpointOutcome::Skipped { .. }
    ));
}

#[test]
fn test_engine_reads_unaffected_by_checkpoint() {
    let (_temp, engine) = setup_temp_engine();

    for i in 0..50 {
        engine.put(&format!("key{}", i), &format!("value{}", i)).unwrap();
    }
    let before = engine.entries();

    engine.checkpoint().unwrap();

    assert_eq!(engine.entries(), before);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_engine_concurrent_writes() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(Engine::open(manual_config(temp_dir.path())).unwrap());

    let mut handles = vec![];
    for t in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let key = format!("thread{}_key{}", t, i);
                let value = format!("thread{}_value{}", t, i);
                engine.put(&key, &value).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4 {
        for i in 0..25 {
            let key = format!("thread{}_key{}", t, i);
            assert_eq!(engine.get(&key), Some(format!("thread{}_value{}", t, i)));
        }
    }
    assert_eq!(engine.last_sequence(), Some(99));
}

#[test]
fn test_engine_same_key_writers_match_log_order() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(Engine::open(manual_config(temp_dir.path())).unwrap());

    let mut handles = vec![];
    for t in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                engine.put("shared", &format!("t{}_{}", t, i)).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // The index holds whatever the highest-sequence record says
    let records = engine.log_records().unwrap();
    let last = records.last().unwrap();
    match &last.operation {
        emberkv::wal::Operation::Put { value, .. } => {
            assert_eq!(engine.get("shared").as_deref(), Some(value.as_str()))
        }
        other => panic!("unexpected operation {:?}", other),
    }
}

#[test]
fn test_engine_checkpoint_during_writes() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(Engine::open(manual_config(temp_dir.path())).unwrap());

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..200 {
                engine.put(&format!("key{}", i % 20), &format!("v{}", i)).unwrap();
            }
        })
    };

    for _ in 0..10 {
        engine.checkpoint().unwrap();
        assert!(engine.checkpoint_marker() <= engine.last_sequence());
    }
    writer.join().unwrap();
    engine.checkpoint().unwrap();

    let expected: Vec<(String, String)> = engine.entries();
    assert_eq!(snapshot_entries(&engine), expected);
    assert_eq!(engine.checkpoint_marker(), engine.last_sequence());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_background_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .checkpoint_interval(Duration::from_millis(20))
        .build();
    let engine = Engine::open(config).unwrap();
    assert!(engine.is_checkpointer_running());

    engine.put("a", "1").unwrap();
    engine.put("b", "2").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.checkpoint_marker() != Some(1) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(engine.checkpoint_marker(), Some(1));
    assert_eq!(snapshot_entries(&engine).len(), 2);
    engine.close().unwrap();
}

#[test]
fn test_engine_close_is_prompt() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .checkpoint_interval(Duration::from_secs(3600))
        .build();
    let engine = Engine::open(config).unwrap();
    engine.put("a", "1").unwrap();

    let started = Instant::now();
    engine.close().unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_engine_manual_mode_has_no_thread() {
    let (_temp, engine) = setup_temp_engine();

    assert!(!engine.is_checkpointer_running());
}

#[test]
fn test_engine_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();

    let zero_interval = Config::builder()
        .data_dir(temp_dir.path())
        .checkpoint_interval(Duration::ZERO)
        .build();
    assert!(matches!(Engine::open(zero_interval), Err(EmberError::Config(_))));

    let same_file = Config::builder()
        .data_dir(temp_dir.path())
        .snapshot_path(temp_dir.path().join("wal.log"))
        .build();
    assert!(matches!(Engine::open(same_file), Err(EmberError::Config(_))));

    let zero_batch = Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 0 })
        .build();
    assert!(matches!(Engine::open(zero_batch), Err(EmberError::Config(_))));
}

#[test]
fn test_engine_open_path_convenience() {
    let temp_dir = TempDir::new().unwrap();

    let engine = Engine::open_path(temp_dir.path()).unwrap();
    engine.put("key", "value").unwrap();

    assert_eq!(engine.get("key"), Some("value".to_string()));
    assert_eq!(engine.config().log_path, temp_dir.path().join("wal.log"));
    engine.close().unwrap();
}
