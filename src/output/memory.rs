use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::product::ProductRecord;
use std::sync::Mutex;

/// Sink that keeps records in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ProductRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records received so far
    pub fn records(&self) -> Vec<ProductRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn write(&self, record: ProductRecord) -> SinkResult<()> {
        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(record);
        Ok(())
    }
}
