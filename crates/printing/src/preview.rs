use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use crate::job::PrintJobId;

/// Cache key for preview bitmaps: one sheet of one job at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintPreviewKey {
    pub job_id: PrintJobId,
    /// Zero-based sheet index.
    pub sheet: u32,
    pub zoom_percent: u32,
}

/// Stored preview entry (PNG payload).
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    pub data: Vec<u8>,
}

/// 以最近使用順序淘汰的預覽快取。 / Bounded preview cache, least recently used first out.
#[derive(Debug, Default)]
pub struct PreviewCache {
    entries: HashMap<PrintPreviewKey, PreviewEntry>,
    order: VecDeque<PrintPreviewKey>,
    capacity: usize,
}

impl PreviewCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn insert(&mut self, key: PrintPreviewKey, entry: PreviewEntry) {
        if self.capacity == 0 {
            return;
        }
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
                self.touch(key);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                self.order.push_back(key);
                while self.order.len() > self.capacity {
                    if let Some(oldest) = self.order.pop_front() {
                        self.entries.remove(&oldest);
                    }
                }
            }
        }
    }

    pub fn get(&mut self, key: &PrintPreviewKey) -> Option<&PreviewEntry> {
        if self.entries.contains_key(key) {
            self.touch(*key);
        }
        self.entries.get(key)
    }

    pub fn contains(&self, key: &PrintPreviewKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops every preview of a job.
    pub fn remove_job(&mut self, job_id: PrintJobId) {
        self.retain(|key| key.job_id != job_id);
    }

    /// Drops previews of sheets `start..=end` of a job.
    pub fn invalidate_sheet_range(&mut self, job_id: PrintJobId, start: u32, end: u32) {
        self.retain(|key| !(key.job_id == job_id && (start..=end).contains(&key.sheet)));
    }

    fn retain(&mut self, keep: impl Fn(&PrintPreviewKey) -> bool) {
        self.entries.retain(|key, _| keep(key));
        self.order.retain(|key| keep(key));
    }

    fn touch(&mut self, key: PrintPreviewKey) {
        if let Some(index) = self.order.iter().position(|k| *k == key) {
            self.order.remove(index);
            self.order.push_back(key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
