//! Filter stage
//!
//! Streams one spool through the compiled condition tree and writes the
//! survivors to a fresh spool. Pure per-partition pass: no cross-partition
//! state, one record resident at a time. The input spool is consumed.

use std::path::{Path, PathBuf};

use crate::query::Condition;

use super::condition::ConditionEvaluator;
use super::errors::ExecResult;
use super::spool::{SpoolManager, SpoolReader};

/// Streaming filter over spool files
pub struct FilterStage;

impl FilterStage {
    /// Filters `input` through `condition`, returning the surviving spool.
    pub fn run(
        spools: &mut SpoolManager,
        input: &Path,
        condition: &Condition,
    ) -> ExecResult<PathBuf> {
        let mut reader = SpoolReader::open(input)?;
        let mut writer = spools.create()?;

        while let Some(record) = reader.next_record()? {
            if ConditionEvaluator::matches(&record, condition) {
                writer.write(&record)?;
            }
        }

        let output = writer.finish()?;
        drop(reader);
        spools.release(input)?;
        Ok(output)
    }
}
