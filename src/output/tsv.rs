//! Tab-separated result file writing

use crate::output::Record;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes records as TSV rows to any writer
///
/// # Returns
///
/// The number of rows written
pub fn write_records<W: Write>(writer: &mut W, records: &[Record]) -> std::io::Result<usize> {
    for record in records {
        writer.write_all(record.to_tsv_row().as_bytes())?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Writes the merged result file, replacing any existing file
///
/// # Arguments
///
/// * `path` - Destination file
/// * `records` - Records in final (merged) order
pub fn write_tsv_file(path: &Path, records: &[Record]) -> std::io::Result<usize> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let written = write_records(&mut writer, records)?;
    tracing::info!("Wrote {} records to {}", written, path.display());
    Ok(written)
}
