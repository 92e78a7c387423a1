//! Query execution
//!
//! Pipeline order is fixed:
//! 1. Resolve the FROM target to its partition files via the catalog
//! 2. Spool each partition to a line-delimited intermediate file
//! 3. Filter each spool through the compiled condition tree (streaming)
//! 4. Either aggregate (partial per partition, then final merge) or
//!    external-sort across the filtered spools; the two are exclusive
//! 5. Project and emit rows, honoring LIMIT
//! 6. Remove every intermediate file, on success and on every error path

mod aggregate;
mod condition;
mod errors;
mod filter;
mod pipeline;
mod project;
mod sort;
mod spool;

pub use aggregate::{AggregationStage, PartialAggregate};
pub use condition::ConditionEvaluator;
pub use errors::{ExecError, ExecErrorCode, ExecResult};
pub use filter::FilterStage;
pub use pipeline::{CollectSink, ExecutionStats, PipelineExecutor, QueryOutput, RowSink};
pub use project::ProjectionStage;
pub use sort::{compare_values, ExternalSorter};
pub use spool::{SpoolManager, SpoolReader, SpoolWriter};
