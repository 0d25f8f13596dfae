//! Sink module for worker-private output
//!
//! This module provides:
//! - The [`Sink`] and [`SinkFactory`] traits
//! - An in-memory sink for small runs and tests
//! - A TSV file sink that keeps memory flat for long date ranges

mod file;
mod memory;
mod traits;

pub use file::{TsvFileSink, TsvSinkFactory};
pub use memory::{MemorySink, MemorySinkFactory};
pub use traits::{Sink, SinkError, SinkFactory, SinkResult};

use crate::config::OutputConfig;
use crate::partition::WorkAssignment;
use std::sync::Arc;

/// Builds the sink key for an assignment: zero-padded index plus label
///
/// Characters outside `[A-Za-z0-9.-]` in the label are replaced by `_` so
/// the key is safe to use as a file name.
pub fn sink_key(assignment: &WorkAssignment) -> String {
    let label: String = assignment
        .label()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{:05}-{}", assignment.index(), label)
}

/// Chooses the sink factory for an output configuration
///
/// Returns file sinks in `sink-dir` when it is set, memory sinks otherwise.
pub fn factory_for(config: &OutputConfig) -> SinkResult<Arc<dyn SinkFactory>> {
    match &config.sink_dir {
        Some(dir) => Ok(Arc::new(TsvSinkFactory::new(dir)?)),
        None => Ok(Arc::new(MemorySinkFactory)),
    }
}
