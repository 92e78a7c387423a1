//! External merge sort
//!
//! Phase 1 (chunk sort): each filtered spool is loaded whole, sorted in
//! memory by the composite key, and written back as one sorted run. Phase 2
//! (k-way merge): all runs are open simultaneously and merged through a
//! binary heap keyed by (sort key, run index); the run index breaks ties so
//! merge order is deterministic. Descending order reverses the key
//! comparison inside the heap entry, so composite descending sorts work for
//! any comparable values, not just numeric ones.
//!
//! Memory bound: one run's records during its own chunk sort, plus one
//! resident record per run during the merge.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::query::SortDirection;
use crate::storage::Record;

use super::errors::ExecResult;
use super::spool::{SpoolManager, SpoolReader};

/// Cross-type value ordering: null < bool < number < string < array < object.
/// Numbers compare as f64; arrays and objects only order by type rank.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn type_rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Extracts the sort-key tuple; a missing field sorts as null.
fn key_of(record: &Record, keys: &[String]) -> Vec<Value> {
    keys.iter()
        .map(|k| record.get(k).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Lexicographic tuple comparison in declared key order.
fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    for (a, b) in a.iter().zip(b.iter()) {
        let ordering = compare_values(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// One heap entry during the k-way merge. Ordering is direction-aware on
/// the key, then ascending on run index for a deterministic tie-break.
struct MergeEntry {
    key: Vec<Value>,
    run: usize,
    record: Record,
    descending: bool,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut ordering = compare_keys(&self.key, &other.key);
        if self.descending {
            ordering = ordering.reverse();
        }
        ordering.then(self.run.cmp(&other.run))
    }
}

/// External merge sort over spool files
pub struct ExternalSorter;

impl ExternalSorter {
    /// Sorts the given spools into one fully ordered spool. Inputs are
    /// consumed; the returned path is the merged output.
    pub fn run(
        spools: &mut SpoolManager,
        inputs: &[PathBuf],
        keys: &[String],
        direction: SortDirection,
    ) -> ExecResult<PathBuf> {
        let mut runs = Vec::with_capacity(inputs.len());
        for input in inputs {
            runs.push(Self::sort_chunk(spools, input, keys, direction)?);
        }
        Self::merge_runs(spools, &runs, keys, direction)
    }

    /// Phase 1: load one spool fully, sort, write back as a sorted run.
    fn sort_chunk(
        spools: &mut SpoolManager,
        input: &Path,
        keys: &[String],
        direction: SortDirection,
    ) -> ExecResult<PathBuf> {
        let mut records = SpoolReader::open(input)?.read_all()?;
        Self::sort_rows(&mut records, keys, direction);

        let mut writer = spools.create()?;
        for record in &records {
            writer.write(record)?;
        }
        let run = writer.finish()?;
        spools.release(input)?;
        Ok(run)
    }

    /// Phase 2: k-way merge of sorted runs through a min-heap.
    fn merge_runs(
        spools: &mut SpoolManager,
        runs: &[PathBuf],
        keys: &[String],
        direction: SortDirection,
    ) -> ExecResult<PathBuf> {
        let descending = direction == SortDirection::Desc;
        let mut readers = Vec::with_capacity(runs.len());
        for run in runs {
            readers.push(SpoolReader::open(run)?);
        }

        let mut heap: BinaryHeap<Reverse<MergeEntry>> = BinaryHeap::new();
        for (run, reader) in readers.iter_mut().enumerate() {
            if let Some(record) = reader.next_record()? {
                heap.push(Reverse(MergeEntry {
                    key: key_of(&record, keys),
                    run,
                    record,
                    descending,
                }));
            }
        }

        let mut writer = spools.create()?;
        while let Some(Reverse(entry)) = heap.pop() {
            writer.write(&entry.record)?;
            if let Some(record) = readers[entry.run].next_record()? {
                heap.push(Reverse(MergeEntry {
                    key: key_of(&record, keys),
                    run: entry.run,
                    record,
                    descending,
                }));
            }
        }
        let merged = writer.finish()?;

        drop(readers);
        for run in runs {
            spools.release(run)?;
        }
        Ok(merged)
    }

    /// In-memory sort used for chunk runs and for post-aggregation SORT.
    pub fn sort_rows(rows: &mut [Record], keys: &[String], direction: SortDirection) {
        rows.sort_by(|a, b| {
            let ordering = compare_keys(&key_of(a, keys), &key_of(b, keys));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}
