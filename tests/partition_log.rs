use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use fluxmq::core::{new_message, BrokerError, Message, PartitionLog};

fn msg(topic: &str, queue: &str, payload: &str) -> Message {
    new_message(topic, queue, payload.as_bytes().to_vec(), None, Default::default())
}

#[test]
fn sequential_appends_get_contiguous_offsets() {
    let log = PartitionLog::new();
    for i in 0..5 {
        let stored = log.append(msg("t", "0", &format!("m{i}")));
        assert_eq!(stored.offset, i);
    }
    assert_eq!(log.len("t", "0"), 5);

    let out = log.read("t", "0", 0, 10);
    let offsets: Vec<i64> = out.iter().map(|m| m.offset).collect();
    assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
}

#[test]
fn concurrent_appends_have_no_gaps_or_duplicates() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let log = Arc::new(PartitionLog::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|_| log.append(msg("t", "0", "x")).offset)
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut offsets = HashSet::new();
    for handle in handles {
        for offset in handle.join().expect("publisher thread panicked") {
            assert!(offsets.insert(offset), "duplicate offset {offset}");
        }
    }
    let total = (THREADS * PER_THREAD) as i64;
    assert_eq!(offsets.len() as i64, total);
    assert_eq!(*offsets.iter().min().expect("empty"), 0);
    assert_eq!(*offsets.iter().max().expect("empty"), total - 1);
    assert_eq!(log.len("t", "0") as i64, total);
}

#[test]
fn partitions_assign_offsets_independently() {
    let log = PartitionLog::new();
    assert_eq!(log.append(msg("t", "0", "a")).offset, 0);
    assert_eq!(log.append(msg("t", "1", "b")).offset, 0);
    assert_eq!(log.append(msg("u", "0", "c")).offset, 0);
    assert_eq!(log.append(msg("t", "0", "d")).offset, 1);
}

#[test]
fn read_past_end_returns_empty() {
    let log = PartitionLog::new();
    assert!(log.read("t", "0", 0, 10).is_empty());

    log.append(msg("t", "0", "m1"));
    assert!(log.read("t", "0", 1, 10).is_empty());
    assert!(log.read("t", "0", 99, 10).is_empty());
}

#[test]
fn read_clamps_limit_to_partition_end() {
    let log = PartitionLog::new();
    for i in 0..4 {
        log.append(msg("t", "0", &format!("m{i}")));
    }
    assert_eq!(log.read("t", "0", 2, 10).len(), 2);
    assert_eq!(log.read("t", "0", 0, 3).len(), 3);
}

#[test]
fn get_by_id_finds_stored_message() {
    let log = PartitionLog::new();
    log.append(msg("t", "0", "m1"));
    let stored = log.append(msg("t", "0", "m2"));

    let found = log.get_by_id("t", "0", &stored.id).expect("lookup failed");
    assert_eq!(found.offset, stored.offset);
    assert_eq!(found.payload, stored.payload);

    let err = log.get_by_id("t", "0", "missing").unwrap_err();
    assert!(matches!(err, BrokerError::NotFound { kind: "message", .. }));
}
