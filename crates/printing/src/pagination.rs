//! Sheet planning: which slot receives which record, sheet by sheet.
//! 分頁規劃：逐張決定每個標籤位置要列印哪一筆資料。
//!
//! The planners are driven one sheet at a time in increasing order starting
//! at sheet 0. Merge planners carry their position across calls in a
//! [`PrintState`]; the record list must not change while a job is running.

use rustlabels_merge::MergeRecord;

/// Position reached by a merge job at the end of the previous sheet.
///
/// `record_cursor` is an index into the record list and is only meaningful
/// for the list the job was started with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintState {
    pub copy_index: usize,
    pub record_cursor: usize,
}

/// One filled slot on a sheet. `record` indexes the record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSlot {
    pub slot: usize,
    pub record: Option<usize>,
}

impl SheetSlot {
    pub const fn blank(slot: usize) -> Self {
        Self { slot, record: None }
    }

    pub const fn merged(slot: usize, record: usize) -> Self {
        Self {
            slot,
            record: Some(record),
        }
    }
}

/// Zero-based index of the first slot to fill, with `first` clamped into
/// the sheet.
fn first_slot(first: usize, n_labels: usize) -> usize {
    first.clamp(1, n_labels.max(1)) - 1
}

/// Slots filled on `page` of a job without merge data.
///
/// Sheet 0 fills slots `first..=last` (1-based); every later sheet is full.
pub fn plan_simple_sheet(
    page: usize,
    n_labels: usize,
    first: usize,
    last: Option<usize>,
) -> Vec<SheetSlot> {
    if n_labels == 0 {
        return Vec::new();
    }
    let range = if page == 0 {
        let start = first_slot(first, n_labels);
        let end = last.unwrap_or(n_labels).min(n_labels);
        start..end
    } else {
        0..n_labels
    };
    range.map(SheetSlot::blank).collect()
}

/// Number of sheets a merge job needs. Zero when there is nothing to place.
pub fn merge_sheet_count(
    n_labels: usize,
    first: usize,
    n_copies: usize,
    n_selected: usize,
) -> usize {
    if n_labels == 0 || n_copies == 0 || n_selected == 0 {
        return 0;
    }
    let skipped = first_slot(first, n_labels);
    (skipped + n_copies * n_selected).div_ceil(n_labels)
}

/// Collated merge ("AAABBBCCC"): all copies of a record, then the next one.
///
/// Sheet 0 resets `state` and skips the first `first - 1` slots; later
/// sheets resume where the previous sheet stopped and start at slot 0.
/// Unselected records take no slot.
pub fn plan_collated_merge_sheet(
    records: &[MergeRecord],
    page: usize,
    n_labels: usize,
    n_copies: usize,
    first: usize,
    state: &mut PrintState,
) -> Vec<SheetSlot> {
    let mut slots = Vec::new();
    if n_labels == 0 || n_copies == 0 {
        return slots;
    }
    let mut slot = 0;
    if page == 0 {
        *state = PrintState::default();
        slot = first_slot(first, n_labels);
    }

    let mut index = state.record_cursor;
    while index < records.len() {
        if records[index].select_flag {
            for copy in state.copy_index..n_copies {
                slots.push(SheetSlot::merged(slot, index));
                slot += 1;
                if slot == n_labels {
                    state.copy_index = (copy + 1) % n_copies;
                    state.record_cursor = if state.copy_index == 0 {
                        index + 1
                    } else {
                        index
                    };
                    return slots;
                }
            }
            state.copy_index = 0;
        }
        index += 1;
    }
    state.record_cursor = records.len();
    slots
}

/// Uncollated merge ("ABCABC"): one pass over the records per copy.
///
/// Reaching the end of the list mid-sheet starts the next copy pass on the
/// same sheet. When a sheet fills on the last record, the next sheet starts
/// the following copy from the head of the list.
pub fn plan_uncollated_merge_sheet(
    records: &[MergeRecord],
    page: usize,
    n_labels: usize,
    n_copies: usize,
    first: usize,
    state: &mut PrintState,
) -> Vec<SheetSlot> {
    let mut slots = Vec::new();
    if n_labels == 0 || n_copies == 0 {
        return slots;
    }
    let mut slot = 0;
    if page == 0 {
        *state = PrintState::default();
        slot = first_slot(first, n_labels);
    }

    for copy in state.copy_index..n_copies {
        let mut index = state.record_cursor;
        while index < records.len() {
            if records[index].select_flag {
                slots.push(SheetSlot::merged(slot, index));
                slot += 1;
                if slot == n_labels {
                    let next = index + 1;
                    if next == records.len() {
                        state.record_cursor = 0;
                        state.copy_index = copy + 1;
                    } else {
                        state.record_cursor = next;
                        state.copy_index = copy;
                    }
                    return slots;
                }
            }
            index += 1;
        }
        state.record_cursor = 0;
    }
    state.copy_index = n_copies;
    slots
}
