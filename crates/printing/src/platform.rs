use std::convert::Infallible;

use tracing::debug;

use crate::display::PrintDisplayList;
use crate::job::{PrintJobId, PrintJobOptions};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// A recorded sheet queued for spooling.
/// 待送往列印佇列的整張標籤紙。
#[derive(Debug, Clone)]
pub struct SpoolSheet {
    pub job_id: PrintJobId,
    /// Zero-based sheet index.
    pub sheet: usize,
    pub display_list: PrintDisplayList,
}

/// Handle returned when a platform adapter begins a job.
/// 平台列印介面開始作業時回傳的控制物件。
pub trait PlatformJobHandle {
    type Error;

    fn submit_sheet(&mut self, sheet: SpoolSheet) -> Result<(), Self::Error>;
    fn finish(self) -> Result<(), Self::Error>;
    fn abort(self, reason: &str);
}

/// Abstraction over platform-specific print APIs.
/// 平台列印 API 的抽象介面。
pub trait PlatformAdapter: Send + Sync {
    type Error;
    type JobHandle: PlatformJobHandle<Error = Self::Error>;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error>;
}

/// Adapter for jobs whose only output is the PDF document: sheets are
/// acknowledged and dropped.
/// 僅輸出 PDF 時使用的介面，送入的頁面不另行處理。
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOnlyAdapter;

/// Job handle of [`FileOnlyAdapter`]; counts the sheets it receives.
#[derive(Debug)]
pub struct FileOnlyJob {
    job_id: PrintJobId,
    sheets: usize,
}

impl PlatformAdapter for FileOnlyAdapter {
    type Error = Infallible;
    type JobHandle = FileOnlyJob;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(FileOnlyJob {
            job_id: options.job_id,
            sheets: 0,
        })
    }
}

impl PlatformJobHandle for FileOnlyJob {
    type Error = Infallible;

    fn submit_sheet(&mut self, _sheet: SpoolSheet) -> Result<(), Self::Error> {
        self.sheets += 1;
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        debug!(job = %self.job_id, sheets = self.sheets, "file-only job finished");
        Ok(())
    }

    fn abort(self, reason: &str) {
        debug!(job = %self.job_id, reason, "file-only job aborted");
    }
}

/// Recorded job metadata produced by the mock adapter.
/// 模擬介面所記錄的列印作業中繼資料。
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub options: PrintJobOptions,
    pub sheets: Vec<SpoolSheet>,
    pub aborted: bool,
    pub abort_reason: Option<String>,
}

/// In-memory implementation of [`PlatformAdapter`] used for tests.
/// 測試使用的記憶體內部平台介面實作。
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockPlatformAdapter {
    jobs: Arc<Mutex<Vec<RecordedJob>>>,
}

#[cfg(test)]
impl MockPlatformAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.lock().expect("lock poisoned").drain(..).collect()
    }
}

#[cfg(test)]
pub struct MockJobHandle {
    options: PrintJobOptions,
    sheets: Vec<SpoolSheet>,
    sink: Arc<Mutex<Vec<RecordedJob>>>,
}

#[cfg(test)]
impl PlatformAdapter for MockPlatformAdapter {
    type Error = String;
    type JobHandle = MockJobHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(MockJobHandle {
            options: options.clone(),
            sheets: Vec::new(),
            sink: self.jobs.clone(),
        })
    }
}

#[cfg(test)]
impl PlatformJobHandle for MockJobHandle {
    type Error = String;

    fn submit_sheet(&mut self, sheet: SpoolSheet) -> Result<(), Self::Error> {
        self.sheets.push(sheet);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            sheets: self.sheets,
            aborted: false,
            abort_reason: None,
        });
        Ok(())
    }

    fn abort(self, reason: &str) {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            sheets: Vec::new(),
            aborted: true,
            abort_reason: Some(reason.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_adapter_captures_sheets() {
        let adapter = MockPlatformAdapter::new();
        let options = PrintJobOptions::new();
        let job_id = options.job_id;

        let mut handle = adapter.begin_job(&options).unwrap();
        for sheet in 0..2 {
            handle
                .submit_sheet(SpoolSheet {
                    job_id,
                    sheet,
                    display_list: PrintDisplayList::default(),
                })
                .unwrap();
        }
        handle.finish().unwrap();

        let jobs = adapter.drain_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].sheets.len(), 2);
        assert_eq!(jobs[0].sheets[1].sheet, 1);
        assert!(!jobs[0].aborted);
        assert_eq!(jobs[0].options.job_id, job_id);
    }

    #[test]
    fn mock_adapter_records_abort_reason() {
        let adapter = MockPlatformAdapter::new();
        let handle = adapter.begin_job(&PrintJobOptions::new()).unwrap();
        handle.abort("user cancelled");

        let jobs = adapter.drain_jobs();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].aborted);
        assert_eq!(jobs[0].abort_reason.as_deref(), Some("user cancelled"));
    }

    #[test]
    fn file_only_adapter_accepts_every_sheet() {
        let options = PrintJobOptions::new();
        let mut handle = FileOnlyAdapter.begin_job(&options).unwrap();
        handle
            .submit_sheet(SpoolSheet {
                job_id: options.job_id,
                sheet: 0,
                display_list: PrintDisplayList::default(),
            })
            .unwrap();
        assert_eq!(handle.sheets, 1);
        handle.finish().unwrap();
    }
}
