//! Pipeline executor
//!
//! Drives one compiled query to completion:
//! 1. Resolve the FROM target to its partition files via the catalog
//! 2. Spool each partition into a line-delimited intermediate file
//! 3. Filter per partition (streaming, no cross-partition state)
//! 4. GROUP present: partial aggregation per partition, final merge across
//!    partitions, then an in-memory SORT of the finalized grouped rows.
//!    Otherwise SORT present: external merge sort across the filtered
//!    spools. Aggregation and general sorting are mutually exclusive paths.
//! 5. Project and emit rows until LIMIT
//!
//! Every spool file is removed before this module returns, on success and
//! on every error path: the manager's cleanup runs unconditionally after
//! the staged work, and its Drop impl backstops panics.

use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::StrataResult;
use crate::observability::Logger;
use crate::query::CompiledQuery;
use crate::storage::{partition_path, read_records, table_path, Record};

use super::aggregate::AggregationStage;
use super::filter::FilterStage;
use super::project::ProjectionStage;
use super::sort::ExternalSorter;
use super::spool::{SpoolManager, SpoolReader};

/// Consumes projected output rows. Returning false stops the pipeline.
pub trait RowSink {
    fn push(&mut self, record: Record) -> bool;
}

/// Collects rows into memory
#[derive(Default)]
pub struct CollectSink {
    pub rows: Vec<Record>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowSink for CollectSink {
    fn push(&mut self, record: Record) -> bool {
        self.rows.push(record);
        true
    }
}

/// Execution counters
#[derive(Debug, Clone, Copy)]
pub struct ExecutionStats {
    /// Records read from partition files, before filtering
    pub scanned_count: usize,
    /// Rows handed to the sink
    pub emitted_count: usize,
    /// True when LIMIT cut the result short
    pub limit_applied: bool,
}

/// A completed query's rows plus counters
#[derive(Debug)]
pub struct QueryOutput {
    pub rows: Vec<Record>,
    pub scanned_count: usize,
    pub limit_applied: bool,
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Applies projection and LIMIT at the point of emission
struct Emitter<'a> {
    sink: &'a mut dyn RowSink,
    fields: Option<Vec<String>>,
    limit: Option<usize>,
    emitted: usize,
    limit_applied: bool,
}

impl<'a> Emitter<'a> {
    fn new(sink: &'a mut dyn RowSink, fields: Option<Vec<String>>, limit: Option<usize>) -> Self {
        Self {
            sink,
            fields,
            limit,
            emitted: 0,
            limit_applied: false,
        }
    }

    /// Emits one row; false means the pipeline should stop.
    fn emit(&mut self, record: Record) -> bool {
        if let Some(limit) = self.limit {
            if self.emitted >= limit {
                self.limit_applied = true;
                return false;
            }
        }
        let projected = ProjectionStage::apply(record, self.fields.as_deref());
        self.emitted += 1;
        self.sink.push(projected)
    }
}

/// Executes compiled queries against one catalog + data directory
pub struct PipelineExecutor<'a> {
    catalog: &'a Catalog,
    config: &'a Config,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    /// Executes a query and collects the result rows.
    pub fn execute(&self, database: &str, query: &CompiledQuery) -> StrataResult<QueryOutput> {
        let mut sink = CollectSink::new();
        let stats = self.execute_into(database, query, &mut sink)?;
        Ok(QueryOutput {
            rows: sink.rows,
            scanned_count: stats.scanned_count,
            limit_applied: stats.limit_applied,
        })
    }

    /// Executes a query, streaming projected rows into `sink`.
    pub fn execute_into(
        &self,
        database: &str,
        query: &CompiledQuery,
        sink: &mut dyn RowSink,
    ) -> StrataResult<ExecutionStats> {
        let entry = self.catalog.collection(database, &query.table)?;
        Logger::trace(
            "QUERY_START",
            &[("database", database), ("table", &query.table)],
        );
        let data_dir = self.config.data_path();
        let partitions: Vec<PathBuf> = if entry.is_table() {
            vec![table_path(&data_dir, database, &query.table)]
        } else {
            (1..=entry.partition_count)
                .map(|n| partition_path(&data_dir, database, &query.table, n))
                .collect()
        };

        let mut spools = SpoolManager::new(&self.config.tmp_path())?;
        let result = self.run_stages(&mut spools, partitions, database, query, sink);
        // Cleanup runs on success and on failure alike
        spools.cleanup();
        result
    }

    fn run_stages(
        &self,
        spools: &mut SpoolManager,
        partitions: Vec<PathBuf>,
        database: &str,
        query: &CompiledQuery,
        sink: &mut dyn RowSink,
    ) -> StrataResult<ExecutionStats> {
        // Stage 0: spool partitions into the initial working set
        let mut scanned = 0usize;
        let mut working: Vec<PathBuf> = Vec::with_capacity(partitions.len());
        for path in &partitions {
            let records = read_records(path)?;
            scanned += records.len();
            let mut writer = spools.create()?;
            for record in &records {
                writer.write(record)?;
            }
            working.push(writer.finish()?);
        }

        // Stage 1: filter each partition's spool
        if let Some(condition) = &query.filter {
            let mut filtered = Vec::with_capacity(working.len());
            for path in working {
                filtered.push(FilterStage::run(spools, &path, condition)?);
            }
            working = filtered;
        }

        // Aggregation rows carry synthetic field names, so projection only
        // applies on the non-grouped paths
        let fields = if query.group_by.is_empty() {
            query.output_fields()
        } else {
            None
        };
        let mut emitter = Emitter::new(sink, fields, query.limit);

        if !query.group_by.is_empty() {
            // Stage 2a: partial aggregation per partition, then final merge
            let targets = query.aggregates();
            let mut partials = Vec::with_capacity(working.len());
            for path in &working {
                partials.push(AggregationStage::partial(path, &query.group_by, &targets)?);
            }
            let mut rows = AggregationStage::merge(partials, &targets);

            // Post-aggregation SORT applies to the finalized grouped rows
            if let Some(sort) = &query.sort {
                ExternalSorter::sort_rows(&mut rows, &sort.keys, sort.direction);
            }
            for row in rows {
                if !emitter.emit(row) {
                    break;
                }
            }
        } else if let Some(sort) = &query.sort {
            // Stage 2b: external merge sort across all filtered spools
            let merged = ExternalSorter::run(spools, &working, &sort.keys, sort.direction)?;
            let mut reader = SpoolReader::open(&merged)?;
            while let Some(record) = reader.next_record()? {
                if !emitter.emit(record) {
                    break;
                }
            }
        } else {
            // Stage 2c: stream spools in partition order
            'partitions: for path in &working {
                let mut reader = SpoolReader::open(path)?;
                while let Some(record) = reader.next_record()? {
                    if !emitter.emit(record) {
                        break 'partitions;
                    }
                }
            }
        }

        let stats = ExecutionStats {
            scanned_count: scanned,
            emitted_count: emitter.emitted,
            limit_applied: emitter.limit_applied,
        };
        Logger::info(
            "QUERY_COMPLETE",
            &[
                ("database", database),
                ("table", &query.table),
                ("rows", &stats.emitted_count.to_string()),
                ("scanned", &stats.scanned_count.to_string()),
            ],
        );
        Ok(stats)
    }
}
