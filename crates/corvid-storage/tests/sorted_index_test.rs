//! Sorted index integration tests.
//!
//! Exercises the sorted index engine over both store kinds:
//! - File-backed indexes survive close and reopen
//! - Duplicate keys keep insertion order across thousands of inserts
//! - Cursor removal over a file store
//! - Randomized inserts and removals against a sorted model
//!
//! Throughput figures are printed for inspection only.

use rand::Rng;
use std::cmp::Ordering;
use std::time::Instant;
use tempfile::tempdir;

use corvid_common::CorvidError;
use corvid_storage::{
    ByteStore, FileStore, I64Codec, MemoryStore, RowId, RowIdCodec, SearchRange, SearchResult,
    SortedIndex,
};

// =============================================================================
// Helpers
// =============================================================================

fn by_value(a: &i64, b: &i64) -> Ordering {
    a.cmp(b)
}

/// Formats a number with comma separators for readability.
fn format_with_commas(n: f64) -> String {
    let digits = format!("{:.0}", n);
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn report(name: &str, ops: usize, started: Instant) {
    let secs = started.elapsed().as_secs_f64().max(f64::EPSILON);
    println!(
        "  {}: {} ops in {:.2}ms ({} ops/sec)",
        name,
        format_with_commas(ops as f64),
        secs * 1000.0,
        format_with_commas(ops as f64 / secs)
    );
}

// =============================================================================
// File-backed persistence
// =============================================================================

#[test]
fn test_file_index_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("values.idx");

    {
        let mut index = SortedIndex::open(I64Codec, FileStore::open(&path).unwrap()).unwrap();
        for v in [5i64, -3, 5, 1, 0, -40] {
            index.insert(&v, &v, by_value).unwrap();
        }
        index.sync().unwrap();
    }

    let mut index = SortedIndex::open(I64Codec, FileStore::open(&path).unwrap()).unwrap();
    assert_eq!(index.to_vec().unwrap(), vec![-40, -3, 0, 1, 5, 5]);
    assert_eq!(
        index.search_first_and_last(&5, by_value).unwrap(),
        SearchRange::Found { first: 4, last: 5 }
    );
    assert_eq!(
        index.search_first(&2, by_value).unwrap(),
        SearchResult::NotFound(4)
    );
}

#[test]
fn test_read_only_file_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ro.idx");
    {
        let mut index = SortedIndex::open(I64Codec, FileStore::open(&path).unwrap()).unwrap();
        index.insert(&1, &1, by_value).unwrap();
        index.sync().unwrap();
    }

    let mut index =
        SortedIndex::open(I64Codec, FileStore::open_read_only(&path).unwrap()).unwrap();
    assert!(index.is_read_only());
    assert!(matches!(
        index.insert(&2, &2, by_value),
        Err(CorvidError::ReadOnly)
    ));
    assert_eq!(index.to_vec().unwrap(), vec![1]);
}

#[test]
fn test_truncated_store_is_rejected() {
    let store = MemoryStore::from_bytes(&[0u8; 12]);
    assert!(matches!(
        SortedIndex::open(RowIdCodec, store),
        Err(CorvidError::CorruptStore { length: 12, width: 8 })
    ));
}

// =============================================================================
// Duplicate stability
// =============================================================================

/// Row ids ordered by a bucket derived from the id, many ids per bucket.
#[test]
fn test_duplicates_keep_insertion_order_at_scale() {
    const ROWS: u64 = 5_000;
    const BUCKETS: u64 = 7;
    let bucket = |id: &RowId, key: &u64| (id.get() * 31 % BUCKETS).cmp(key);

    println!("\n=== Duplicate Key Insert ===");
    let mut index = SortedIndex::open(RowIdCodec, FileStore::temporary(None).unwrap()).unwrap();
    let started = Instant::now();
    for id in 0..ROWS {
        let key = id * 31 % BUCKETS;
        index.insert(&key, &RowId(id), bucket).unwrap();
    }
    report("insert", ROWS as usize, started);

    for key in 0..BUCKETS {
        let run = index.search_first_and_last(&key, bucket).unwrap();
        let mut cursor = index.cursor_range(run.as_range()).unwrap();
        let mut previous = None;
        while let Some(id) = cursor.next_item().unwrap() {
            assert_eq!(id.get() * 31 % BUCKETS, key);
            assert!(previous < Some(id), "bucket {key} out of insertion order");
            previous = Some(id);
        }
    }
}

// =============================================================================
// Cursor removal
// =============================================================================

#[test]
fn test_cursor_removes_run_from_file_store() {
    let mut index = SortedIndex::open(I64Codec, FileStore::temporary(None).unwrap()).unwrap();
    for v in [3i64, 9, 3, 1, 3, 7] {
        index.insert(&v, &v, by_value).unwrap();
    }

    let run = index.search_first_and_last(&3, by_value).unwrap();
    assert_eq!(run.len(), 3);
    {
        let mut cursor = index.cursor_range(run.as_range()).unwrap();
        while cursor.move_next() {
            assert_eq!(cursor.remove().unwrap(), 3);
        }
        assert!(cursor.is_empty());
    }
    assert_eq!(index.to_vec().unwrap(), vec![1, 7, 9]);
    assert_eq!(index.store().len(), 3 * 8);
}

// =============================================================================
// Randomized
// =============================================================================

#[test]
fn test_random_operations_match_model() {
    const OPS: usize = 4_000;
    let mut rng = rand::thread_rng();
    let mut index = SortedIndex::in_memory(I64Codec);
    let mut model: Vec<i64> = Vec::new();

    println!("\n=== Randomized Insert/Remove ===");
    let started = Instant::now();
    for _ in 0..OPS {
        let v: i64 = rng.gen_range(-50..50);
        if rng.gen_bool(0.6) || model.is_empty() {
            index.insert(&v, &v, by_value).unwrap();
            let at = model.partition_point(|x| *x <= v);
            model.insert(at, v);
        } else {
            match model.binary_search(&v) {
                Ok(_) => {
                    index.remove(&v, &v, by_value).unwrap();
                    let at = model.partition_point(|x| *x < v);
                    model.remove(at);
                }
                Err(_) => {
                    assert!(matches!(
                        index.remove(&v, &v, by_value),
                        Err(CorvidError::NotFound)
                    ));
                }
            }
        }
    }
    report("mixed", OPS, started);

    assert_eq!(index.count(), model.len());
    assert_eq!(index.to_vec().unwrap(), model);
    for probe in -55..55i64 {
        let first = model.partition_point(|x| *x < probe);
        let end = model.partition_point(|x| *x <= probe);
        let expected = if first == end {
            SearchRange::NotFound(first)
        } else {
            SearchRange::Found {
                first,
                last: end - 1,
            }
        };
        assert_eq!(
            index.search_first_and_last(&probe, by_value).unwrap(),
            expected,
            "probe {probe}"
        );
    }
}
