//! In-memory sink

use crate::output::Record;
use crate::partition::WorkAssignment;
use crate::sink::{Sink, SinkFactory, SinkResult};

/// Sink that keeps records in a vector
#[derive(Debug, Default)]
pub struct MemorySink {
    key: String,
    records: Vec<Record>,
}

impl MemorySink {
    /// Creates an empty sink with the given key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            records: Vec::new(),
        }
    }
}

impl Sink for MemorySink {
    fn key(&self) -> &str {
        &self.key
    }

    fn append(&mut self, record: &Record) -> SinkResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn drain(self: Box<Self>) -> SinkResult<Vec<Record>> {
        Ok(self.records)
    }

    fn discard(self: Box<Self>) -> SinkResult<()> {
        Ok(())
    }
}

/// Factory for [`MemorySink`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct MemorySinkFactory;

impl SinkFactory for MemorySinkFactory {
    fn create(&self, assignment: &WorkAssignment) -> SinkResult<Box<dyn Sink>> {
        Ok(Box::new(MemorySink::new(super::sink_key(assignment))))
    }
}
