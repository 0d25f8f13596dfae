//! On-disk TSV sink
//!
//! Each worker writes to its own file inside the sink directory. File names
//! are derived from the partition index and label, and files are opened with
//! `create_new`, so two workers can never share a file. The file is removed
//! when the sink is drained, discarded or dropped.

use crate::output::Record;
use crate::partition::WorkAssignment;
use crate::sink::{Sink, SinkError, SinkFactory, SinkResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink backed by a TSV file
#[derive(Debug)]
pub struct TsvFileSink {
    key: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    count: usize,
}

impl TsvFileSink {
    /// Creates a new sink file at `dir/<key>.tsv`
    ///
    /// # Errors
    ///
    /// Fails if the file already exists or cannot be created.
    pub fn create(dir: &Path, key: impl Into<String>) -> SinkResult<Self> {
        let key = key.into();
        let path = dir.join(format!("{}.tsv", key));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;

        tracing::trace!("Created sink file {}", path.display());

        Ok(Self {
            key,
            path,
            writer: Some(BufWriter::new(file)),
            count: 0,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remove_file(&mut self) -> SinkResult<()> {
        self.writer = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Sink for TsvFileSink {
    fn key(&self) -> &str {
        &self.key
    }

    fn append(&mut self, record: &Record) -> SinkResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SinkError::Closed(self.key.clone()))?;
        writer.write_all(record.to_tsv_row().as_bytes())?;
        self.count += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.count
    }

    fn drain(mut self: Box<Self>) -> SinkResult<Vec<Record>> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let content = std::fs::read_to_string(&self.path)?;
        self.remove_file()?;

        let mut records = Vec::with_capacity(self.count);
        for (line_number, line) in content.lines().enumerate() {
            let record = Record::from_tsv_row(line).ok_or_else(|| SinkError::Malformed {
                key: self.key.clone(),
                line: line_number + 1,
            })?;
            records.push(record);
        }

        Ok(records)
    }

    fn discard(mut self: Box<Self>) -> SinkResult<()> {
        self.remove_file()
    }
}

impl Drop for TsvFileSink {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = self.remove_file() {
                tracing::warn!("Failed to remove sink file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Factory for [`TsvFileSink`]s in a fixed directory
#[derive(Debug, Clone)]
pub struct TsvSinkFactory {
    dir: PathBuf,
}

impl TsvSinkFactory {
    /// Creates a factory writing into `dir`, creating the directory if needed
    ///
    /// Sink files left behind by an interrupted run are removed first, so
    /// their keys can be created again. Other files in `dir` are kept.
    pub fn new(dir: impl Into<PathBuf>) -> SinkResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let removed = sweep_stale_sinks(&dir)?;
        if removed > 0 {
            tracing::warn!(
                "Removed {} stale sink files from {}",
                removed,
                dir.display()
            );
        }

        Ok(Self { dir })
    }
}

/// Returns true for names of the form `<5 digits>-<label>.tsv`
fn is_sink_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".tsv") else {
        return false;
    };
    let bytes = stem.as_bytes();
    bytes.len() > 6 && bytes[..5].iter().all(u8::is_ascii_digit) && bytes[5] == b'-'
}

/// Deletes sink files in `dir`, returning how many were removed
fn sweep_stale_sinks(dir: &Path) -> SinkResult<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(is_sink_file_name) {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl SinkFactory for TsvSinkFactory {
    fn create(&self, assignment: &WorkAssignment) -> SinkResult<Box<dyn Sink>> {
        let sink = TsvFileSink::create(&self.dir, super::sink_key(assignment))?;
        Ok(Box::new(sink))
    }
}
