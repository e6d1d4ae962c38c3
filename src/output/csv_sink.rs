//! CSV record sink
//!
//! Writes a fixed six-column header once, then one row per record. Every row
//! is flushed as soon as it is written, so an interrupted crawl still leaves a
//! well-formed file behind.

use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::product::ProductRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Column header: product id, name, brand, current price, previous price, URL
pub const CSV_HEADER: [&str; 6] = [
    "ID товара",
    "Наименование",
    "Бренд",
    "Актуальная Цена",
    "Старая цена",
    "Ссылка",
];

/// Sink that appends records to a CSV stream
pub struct CsvSink<W: Write> {
    writer: Mutex<csv::Writer<W>>,
}

impl CsvSink<File> {
    /// Creates (or truncates) the CSV file at `path` and writes the header
    pub fn create(path: &Path) -> SinkResult<Self> {
        let file = File::create(path)?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps any writer and writes the header row
    pub fn from_writer(inner: W) -> SinkResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> SinkResult<W> {
        let writer = self.writer.into_inner().map_err(|_| SinkError::Poisoned)?;
        writer
            .into_inner()
            .map_err(|e| SinkError::Write(e.error().to_string()))
    }
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    /// Writes and flushes one row on the calling thread
    ///
    /// This blocks the caller (a runtime worker, when called from a crawl
    /// task) for one small buffered write plus a flush. The lock is held for
    /// that single row only.
    fn write(&self, record: ProductRecord) -> SinkResult<()> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_record(record.as_row())?;
        writer.flush()?;
        Ok(())
    }
}
