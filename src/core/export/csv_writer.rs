//! CSV report writer

use crate::domain::{EmissionRecord, Result};
use csv::Writer;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Streams emission records into a CSV file
///
/// The file is created (or truncated) on [`CsvExporter::create`]. A failure
/// part-way leaves whatever was already written in place.
pub struct CsvExporter {
    writer: Writer<File>,
    path: PathBuf,
    rows: usize,
}

impl CsvExporter {
    /// Create the output file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = Writer::from_path(&path)?;
        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(EmissionRecord::HEADERS)?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &EmissionRecord) -> Result<()> {
        self.writer.write_record(record.to_row())?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows and return the number of data rows written
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        tracing::debug!(path = %self.path.display(), rows = self.rows, "CSV file closed");
        Ok(self.rows)
    }
}

/// Write a header row followed by one row per record
///
/// An empty slice produces a file holding only the header.
///
/// # Errors
///
/// Returns an error on any I/O or CSV encoding failure.
pub fn write_csv(records: &[EmissionRecord], path: impl AsRef<Path>) -> Result<usize> {
    let mut exporter = CsvExporter::create(path)?;
    exporter.write_header()?;
    for record in records {
        exporter.write_record(record)?;
    }
    exporter.finish()
}
