//! Two-phase grouped aggregation
//!
//! Partial phase: each partition's filtered spool is grouped by the
//! group-key tuple, accumulating per-target state. Final phase: partials
//! merge by identical key tuple and one output row is emitted per group,
//! carrying `_key` plus a `{target}_{aggregation}` field per request.
//!
//! The accumulators are chosen so partial-then-final composition equals a
//! single pass over the unpartitioned data: count and sum add, avg carries
//! a (sum, count) pair until the end, max/min take extrema of extrema.
//!
//! `count` counts every record where the target field is present (null
//! included); sum/avg/max/min fold numeric values only.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::query::AggregateFn;
use crate::storage::Record;

use super::errors::{ExecError, ExecResult};
use super::sort::compare_values;
use super::spool::SpoolReader;

/// Mergeable per-target accumulator state
#[derive(Debug, Clone, Default)]
struct Accumulator {
    /// Values seen (field present, null included)
    count: u64,
    /// Numeric values seen
    numeric_count: u64,
    /// Numeric sum as f64
    sum: f64,
    /// Integer sum, valid while every value was an integer
    int_sum: i64,
    /// False once any non-integer numeric value arrived
    all_int: bool,
    /// Running numeric extrema
    max: Option<Value>,
    min: Option<Value>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            all_int: true,
            ..Default::default()
        }
    }

    fn observe(&mut self, value: &Value) {
        self.count += 1;
        let Value::Number(number) = value else { return };

        self.numeric_count += 1;
        let as_f64 = number.as_f64().unwrap_or(0.0);
        self.sum += as_f64;
        match number.as_i64() {
            Some(int) if self.all_int => self.int_sum += int,
            _ => self.all_int = false,
        }

        let is_new_max = self
            .max
            .as_ref()
            .map_or(true, |current| compare_values(value, current).is_gt());
        if is_new_max {
            self.max = Some(value.clone());
        }
        let is_new_min = self
            .min
            .as_ref()
            .map_or(true, |current| compare_values(value, current).is_lt());
        if is_new_min {
            self.min = Some(value.clone());
        }
    }

    fn merge(&mut self, other: &Accumulator) {
        self.count += other.count;
        self.numeric_count += other.numeric_count;
        self.sum += other.sum;
        self.int_sum += other.int_sum;
        self.all_int = self.all_int && other.all_int;

        if let Some(value) = &other.max {
            let take = self
                .max
                .as_ref()
                .map_or(true, |current| compare_values(value, current).is_gt());
            if take {
                self.max = Some(value.clone());
            }
        }
        if let Some(value) = &other.min {
            let take = self
                .min
                .as_ref()
                .map_or(true, |current| compare_values(value, current).is_lt());
            if take {
                self.min = Some(value.clone());
            }
        }
    }

    fn finalize(&self, func: AggregateFn) -> Value {
        match func {
            AggregateFn::Count => Value::from(self.count),
            AggregateFn::Sum => {
                if self.all_int {
                    Value::from(self.int_sum)
                } else {
                    serde_json::Number::from_f64(self.sum)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            AggregateFn::Avg => {
                if self.numeric_count == 0 {
                    return Value::from(0);
                }
                let avg = self.sum / self.numeric_count as f64;
                // Round to 4 decimal places
                let rounded = (avg * 10_000.0).round() / 10_000.0;
                serde_json::Number::from_f64(rounded)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            AggregateFn::Max => self.max.clone().unwrap_or(Value::Null),
            AggregateFn::Min => self.min.clone().unwrap_or(Value::Null),
        }
    }
}

/// One group's state: its key tuple and one accumulator per target
#[derive(Debug, Clone)]
struct GroupState {
    key: Vec<Value>,
    accumulators: Vec<Accumulator>,
}

/// Per-partition partial aggregation result, mergeable by key tuple
pub struct PartialAggregate {
    /// Canonical JSON of the key tuple -> group state; BTreeMap keeps the
    /// final output order deterministic
    groups: BTreeMap<String, GroupState>,
}

impl PartialAggregate {
    fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Number of distinct groups in this partial
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Two-phase aggregation over spool files
pub struct AggregationStage;

impl AggregationStage {
    /// Partial phase: fold one partition's spool into per-group state.
    pub fn partial(
        input: &Path,
        group_keys: &[String],
        targets: &[(String, AggregateFn)],
    ) -> ExecResult<PartialAggregate> {
        let mut partial = PartialAggregate::new();
        let mut reader = SpoolReader::open(input)?;

        while let Some(record) = reader.next_record()? {
            let key: Vec<Value> = group_keys
                .iter()
                .map(|k| record.get(k).cloned().unwrap_or(Value::Null))
                .collect();
            let canonical = serde_json::to_string(&key)
                .map_err(|e| ExecError::execution_failed(format!("bad group key: {}", e)))?;

            let state = partial.groups.entry(canonical).or_insert_with(|| GroupState {
                key,
                accumulators: vec![Accumulator::new(); targets.len()],
            });
            for (i, (target, _)) in targets.iter().enumerate() {
                if let Some(value) = record.get(target) {
                    state.accumulators[i].observe(value);
                }
            }
        }
        Ok(partial)
    }

    /// Final phase: merge partials keyed by identical group tuple and emit
    /// one row per group.
    pub fn merge(
        partials: Vec<PartialAggregate>,
        targets: &[(String, AggregateFn)],
    ) -> Vec<Record> {
        let mut merged: BTreeMap<String, GroupState> = BTreeMap::new();
        for partial in partials {
            for (canonical, state) in partial.groups {
                match merged.get_mut(&canonical) {
                    Some(existing) => {
                        for (mine, theirs) in
                            existing.accumulators.iter_mut().zip(state.accumulators.iter())
                        {
                            mine.merge(theirs);
                        }
                    }
                    None => {
                        merged.insert(canonical, state);
                    }
                }
            }
        }

        merged
            .into_values()
            .map(|state| {
                let mut row = Record::new();
                let key_value = if state.key.len() == 1 {
                    state.key.into_iter().next().expect("single key")
                } else {
                    Value::Array(state.key)
                };
                row.insert("_key".to_string(), key_value);
                for ((target, func), accumulator) in
                    targets.iter().zip(state.accumulators.iter())
                {
                    row.insert(
                        format!("{}_{}", target, func.name()),
                        accumulator.finalize(*func),
                    );
                }
                row
            })
            .collect()
    }
}
