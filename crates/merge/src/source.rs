use std::fmt;

use tracing::{debug, warn};

use crate::error::MergeError;
use crate::fixed::FixedBackend;
use crate::record::{count_selected, MergeRecord};
use crate::registry::{self, BackendInfo};

/// Where a backend reads its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Records come from a fixed, backend-owned place; the locator is ignored.
    Fixed,
    /// Records come from a file named by the source locator.
    File,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Fixed => f.write_str("fixed"),
            SourceType::File => f.write_str("file"),
        }
    }
}

/// Backend contract used by [`MergeSource`].
///
/// `open` prepares the backend for reading, `next_record` is pulled until it
/// returns `None`, and `close` releases whatever `open` acquired.
pub trait MergeBackend: fmt::Debug + Send {
    fn open(&mut self, locator: Option<&str>) -> Result<(), MergeError>;
    fn next_record(&mut self) -> Option<MergeRecord>;
    fn close(&mut self);
    fn key_list(&self) -> Vec<String>;
    fn primary_key(&self) -> Option<String>;
    /// Copies the backend configuration without any open reading state.
    fn duplicate(&self) -> Box<dyn MergeBackend>;
}

/// A configured merge source and the records it loaded.
///
/// Lifecycle: [`crate::create`] by backend id, [`MergeSource::set_source_locator`],
/// [`MergeSource::open`], query [`MergeSource::records`], then
/// [`MergeSource::close`].
#[derive(Debug)]
pub struct MergeSource {
    info: &'static BackendInfo,
    backend: Box<dyn MergeBackend>,
    locator: Option<String>,
    records: Vec<MergeRecord>,
    last_error: Option<MergeError>,
}

impl MergeSource {
    pub(crate) fn with_backend(info: &'static BackendInfo, backend: Box<dyn MergeBackend>) -> Self {
        Self {
            info,
            backend,
            locator: None,
            records: Vec::new(),
            last_error: None,
        }
    }

    /// Creates an opened fixed source publishing `records`.
    pub fn from_records(records: Vec<MergeRecord>) -> Self {
        let mut source = Self::with_backend(
            &registry::FIXED_RECORDS,
            Box::new(FixedBackend::with_records(records)),
        );
        source.open();
        source
    }

    pub fn id(&self) -> &'static str {
        self.info.id
    }

    pub fn description(&self) -> &'static str {
        self.info.description
    }

    pub fn source_type(&self) -> SourceType {
        self.info.src_type
    }

    pub fn set_source_locator(&mut self, locator: impl Into<String>) {
        self.locator = Some(locator.into());
    }

    pub fn source_locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Loads the record list from the backend.
    ///
    /// Failures leave the record list empty and are kept in
    /// [`MergeSource::last_error`]; they are never returned to the caller.
    pub fn open(&mut self) {
        self.records.clear();
        self.last_error = None;

        let locator = match self.info.src_type {
            SourceType::File => self.locator.as_deref(),
            SourceType::Fixed => None,
        };

        match self.backend.open(locator) {
            Ok(()) => {
                while let Some(record) = self.backend.next_record() {
                    self.records.push(record);
                }
                debug!(
                    backend = self.info.id,
                    records = self.records.len(),
                    "merge source opened"
                );
            }
            Err(err) => {
                warn!(backend = self.info.id, error = %err, "merge source failed to open");
                self.last_error = Some(err);
            }
        }
    }

    /// Releases backend resources. Configuration and loaded records stay.
    pub fn close(&mut self) {
        self.backend.close();
    }

    pub fn records(&self) -> &[MergeRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&MergeRecord> {
        self.records.get(index)
    }

    pub fn selected_count(&self) -> usize {
        count_selected(&self.records)
    }

    /// Toggles the selection flag of one record; returns `false` when the
    /// index is out of range.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.records.get_mut(index) {
            Some(record) => {
                record.select_flag = selected;
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for record in &mut self.records {
            record.select_flag = selected;
        }
    }

    pub fn key_list(&self) -> Vec<String> {
        self.backend.key_list()
    }

    pub fn primary_key(&self) -> Option<String> {
        self.backend.primary_key()
    }

    pub fn last_error(&self) -> Option<&MergeError> {
        self.last_error.as_ref()
    }
}

impl Clone for MergeSource {
    fn clone(&self) -> Self {
        Self {
            info: self.info,
            backend: self.backend.duplicate(),
            locator: self.locator.clone(),
            records: self.records.clone(),
            last_error: None,
        }
    }
}
