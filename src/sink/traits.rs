//! Sink traits and error types
//!
//! A sink is the private, append-only output buffer of one worker. The
//! scheduler creates it, the worker appends to it, and the merger consumes it
//! exactly once with [`Sink::drain`] (or throws it away with
//! [`Sink::discard`]). Both consume the sink, so it cannot be read twice.

use crate::output::Record;
use crate::partition::WorkAssignment;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed row {line} in sink {key}")]
    Malformed { key: String, line: usize },

    #[error("Sink {key} rejected record: {reason}")]
    Rejected { key: String, reason: String },

    #[error("Sink {0} is already closed")]
    Closed(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Worker-private record store
pub trait Sink: fmt::Debug + Send {
    /// Identity of the sink, derived from the range it belongs to
    fn key(&self) -> &str;

    /// Appends one record
    fn append(&mut self, record: &Record) -> SinkResult<()>;

    /// Number of records appended so far
    fn len(&self) -> usize;

    /// Returns true if nothing has been appended
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads back every record in append order, then deletes the sink
    fn drain(self: Box<Self>) -> SinkResult<Vec<Record>>;

    /// Deletes the sink without reading it
    fn discard(self: Box<Self>) -> SinkResult<()>;
}

/// Creates one sink per work assignment
pub trait SinkFactory: Send + Sync {
    /// Creates an empty sink for `assignment`
    ///
    /// # Arguments
    ///
    /// * `assignment` - The work the sink will collect records for
    fn create(&self, assignment: &WorkAssignment) -> SinkResult<Box<dyn Sink>>;
}
