use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintJobId(u64);

impl PrintJobId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PrintJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrintJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "print-job-{}", self.0)
    }
}

/// How sheets are filled.
/// 排版模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// No merge: the same label in every slot.
    Simple,
    /// All copies of a record before the next record ("AAABBBCCC").
    Collated,
    /// One pass over the records per copy ("ABCABC").
    Uncollated,
}

impl fmt::Display for PrintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrintMode::Simple => "simple",
            PrintMode::Collated => "collated",
            PrintMode::Uncollated => "uncollated",
        };
        f.write_str(name)
    }
}

/// Options supplied when requesting a print job.
///
/// `first` and `last` are 1-based slot numbers. In simple mode they bound
/// the first sheet and `n_sheets` is the sheet count; in merge mode only
/// `first` is used and the sheet count follows from the records.
#[derive(Debug, Clone)]
pub struct PrintJobOptions {
    pub job_id: PrintJobId,
    pub n_sheets: usize,
    pub first: usize,
    /// Defaults to the last slot of the sheet.
    pub last: Option<usize>,
    pub n_copies: usize,
    pub collate: bool,
    pub outline: bool,
    pub reverse: bool,
    pub crop_marks: bool,
}

impl PrintJobOptions {
    pub fn new() -> Self {
        Self {
            job_id: PrintJobId::new(),
            n_sheets: 1,
            first: 1,
            last: None,
            n_copies: 1,
            collate: false,
            outline: false,
            reverse: false,
            crop_marks: false,
        }
    }

    /// Mode for a label with or without a merge source.
    pub fn mode(&self, has_merge: bool) -> PrintMode {
        match (has_merge, self.collate) {
            (false, _) => PrintMode::Simple,
            (true, true) => PrintMode::Collated,
            (true, false) => PrintMode::Uncollated,
        }
    }
}

impl Default for PrintJobOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_unique() {
        let a = PrintJobId::new();
        let b = PrintJobId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("print-job-"));
    }

    #[test]
    fn mode_follows_merge_and_collate() {
        let mut options = PrintJobOptions::new();
        assert_eq!(options.mode(false), PrintMode::Simple);
        assert_eq!(options.mode(true), PrintMode::Uncollated);
        options.collate = true;
        assert_eq!(options.mode(true), PrintMode::Collated);
        assert_eq!(options.mode(false), PrintMode::Simple);
    }
}
