use std::collections::VecDeque;

use crate::error::MergeError;
use crate::record::MergeRecord;
use crate::source::MergeBackend;

/// Backend serving records held in memory.
#[derive(Debug, Clone, Default)]
pub struct FixedBackend {
    records: Vec<MergeRecord>,
    pending: VecDeque<MergeRecord>,
}

impl FixedBackend {
    pub fn with_records(records: Vec<MergeRecord>) -> Self {
        Self {
            records,
            pending: VecDeque::new(),
        }
    }
}

impl MergeBackend for FixedBackend {
    fn open(&mut self, _locator: Option<&str>) -> Result<(), MergeError> {
        self.pending = self.records.iter().cloned().collect();
        Ok(())
    }

    fn next_record(&mut self) -> Option<MergeRecord> {
        self.pending.pop_front()
    }

    fn close(&mut self) {
        self.pending.clear();
    }

    fn key_list(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for field in self.records.iter().flat_map(|record| record.fields.iter()) {
            if !keys.contains(&field.key) {
                keys.push(field.key.clone());
            }
        }
        keys
    }

    fn primary_key(&self) -> Option<String> {
        self.records
            .first()
            .and_then(|record| record.fields.first())
            .map(|field| field.key.clone())
    }

    fn duplicate(&self) -> Box<dyn MergeBackend> {
        Box::new(Self::with_records(self.records.clone()))
    }
}
