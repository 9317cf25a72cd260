//! Tests for the background checkpoint loop
//!
//! These tests verify:
//! - The loop checkpoints on its own at the configured interval
//! - Shutdown interrupts the wait instead of sleeping it out

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use emberkv::checkpoint::Checkpointer;
use emberkv::config::WalSyncStrategy;
use emberkv::storage::{MarkerStore, SnapshotStore};
use emberkv::wal::{Operation, WalWriter};
use parking_lot::Mutex;
use tempfile::TempDir;

fn setup() -> (TempDir, Arc<Mutex<WalWriter>>, Arc<Checkpointer>) {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("wal.log");
    let wal = Arc::new(Mutex::new(
        WalWriter::open(&log_path, WalSyncStrategy::EveryWrite).unwrap(),
    ));
    let checkpointer = Arc::new(Checkpointer::new(
        Arc::clone(&wal),
        &log_path,
        SnapshotStore::new(temp.path().join("snapshot.db")),
        MarkerStore::new(temp.path().join("checkpoint.meta")),
        None,
    ));
    (temp, wal, checkpointer)
}

#[test]
fn test_background_loop_advances_marker() {
    let (_temp, wal, checkpointer) = setup();
    let mut handle = Arc::clone(&checkpointer)
        .spawn(Duration::from_millis(20))
        .unwrap();
    assert!(handle.is_running());

    let last = {
        let mut wal = wal.lock();
        for i in 0..10 {
            wal.append(Operation::Put {
                key: format!("k{}", i),
                value: "v".into(),
            })
            .unwrap();
        }
        wal.last_sequence()
    };

    let deadline = Instant::now() + Duration::from_secs(10);
    while checkpointer.marker() != last && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(checkpointer.marker(), last);

    handle.shutdown();
    assert!(!handle.is_running());
}

#[test]
fn test_shutdown_does_not_wait_for_interval() {
    let (_temp, _wal, checkpointer) = setup();
    let mut handle = checkpointer.spawn(Duration::from_secs(3600)).unwrap();

    let started = Instant::now();
    handle.shutdown();

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_drop_stops_loop() {
    let (_temp, _wal, checkpointer) = setup();
    let handle = Arc::clone(&checkpointer)
        .spawn(Duration::from_secs(3600))
        .unwrap();

    let started = Instant::now();
    drop(handle);

    assert!(started.elapsed() < Duration::from_secs(5));
    // The loop's clone of the checkpointer is gone
    assert_eq!(Arc::strong_count(&checkpointer), 1);
}
