//! Sheet-by-sheet print protocol.
//! 逐張列印的流程：先回報總張數，再依序繪製每一張。

use rustlabels_merge::count_selected;
use tracing::{debug, warn};

use crate::display::PrintDisplayList;
use crate::job::{PrintJobOptions, PrintMode};
use crate::pagination::{merge_sheet_count, PrintState};
use crate::renderer::LabelRenderer;
use crate::sheet::{print_collated_merge_sheet, print_simple_sheet, print_uncollated_merge_sheet};

/// One print job over a label.
///
/// [`PrintOperation::begin`] reports the sheet count; the host then calls
/// [`PrintOperation::draw_sheet`] once per sheet, in increasing order from
/// 0. The label, and with it the record list, is borrowed for the whole job
/// so selection cannot change between sheets.
pub struct PrintOperation<'a, L: LabelRenderer + ?Sized> {
    label: &'a L,
    options: PrintJobOptions,
    mode: PrintMode,
    n_sheets: usize,
    state: PrintState,
    next_sheet: usize,
}

impl<'a, L: LabelRenderer + ?Sized> PrintOperation<'a, L> {
    pub fn new(label: &'a L, options: PrintJobOptions) -> Self {
        let mode = options.mode(label.has_merge());
        Self {
            label,
            options,
            mode,
            n_sheets: 0,
            state: PrintState::default(),
            next_sheet: 0,
        }
    }

    /// Computes the number of sheets and resets the job position.
    pub fn begin(&mut self) -> usize {
        let n_labels = self.label.geometry().label_count_per_sheet();
        self.n_sheets = match self.mode {
            PrintMode::Simple if n_labels == 0 => 0,
            PrintMode::Simple => self.options.n_sheets,
            PrintMode::Collated | PrintMode::Uncollated => {
                let n_selected = count_selected(self.label.records());
                merge_sheet_count(n_labels, self.options.first, self.options.n_copies, n_selected)
            }
        };
        self.state = PrintState::default();
        self.next_sheet = 0;
        debug!(
            job = %self.options.job_id,
            mode = %self.mode,
            sheets = self.n_sheets,
            labels_per_sheet = n_labels,
            "print job started"
        );
        self.n_sheets
    }

    /// Draws sheet `page` and returns its display list.
    ///
    /// Calls outside the documented order give unspecified sheet contents.
    pub fn draw_sheet(&mut self, page: usize) -> PrintDisplayList {
        if page != self.next_sheet {
            warn!(
                job = %self.options.job_id,
                page,
                expected = self.next_sheet,
                "sheet requested out of order"
            );
        }
        self.next_sheet = page + 1;

        let options = &self.options;
        let mut ctx = PrintDisplayList::default();
        match self.mode {
            PrintMode::Simple => print_simple_sheet(
                self.label,
                &mut ctx,
                page,
                self.n_sheets,
                options.first,
                options.last,
                options.outline,
                options.reverse,
                options.crop_marks,
            ),
            PrintMode::Collated => print_collated_merge_sheet(
                self.label,
                &mut ctx,
                page,
                options.n_copies,
                options.first,
                options.outline,
                options.reverse,
                options.crop_marks,
                &mut self.state,
            ),
            PrintMode::Uncollated => print_uncollated_merge_sheet(
                self.label,
                &mut ctx,
                page,
                options.n_copies,
                options.first,
                options.outline,
                options.reverse,
                options.crop_marks,
                &mut self.state,
            ),
        }
        ctx
    }

    pub fn mode(&self) -> PrintMode {
        self.mode
    }

    /// Sheet count computed by the last `begin`.
    pub fn n_sheets(&self) -> usize {
        self.n_sheets
    }

    pub fn state(&self) -> PrintState {
        self.state
    }

    pub fn options(&self) -> &PrintJobOptions {
        &self.options
    }

    pub fn label(&self) -> &L {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustlabels_core::Label;
    use rustlabels_merge::{MergeRecord, MergeSource};
    use rustlabels_template::TemplateDb;

    const TEMPLATES: &str = r#"<Glabels-templates>
  <Template brand="Test" part="4up" size="US-Letter">
    <Label-rectangle id="0" width="2in" height="1in">
      <Layout nx="2" ny="2" x0="1in" y0="1in" dx="3in" dy="2in"/>
    </Label-rectangle>
  </Template>
</Glabels-templates>"#;

    fn label(records: usize) -> Label {
        let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
        let mut label = Label::from_json(
            r#"{"template": "Test 4up", "objects": [{"type": "text", "x": 0, "y": 0, "text": "${name}"}]}"#,
            &db,
        )
        .expect("label");
        if records > 0 {
            let list = (1..=records)
                .map(|n| MergeRecord::from_pairs([("name", format!("R{n}"))]))
                .collect();
            label.set_merge(Some(MergeSource::from_records(list)));
        }
        label
    }

    fn print_all(label: &Label, options: PrintJobOptions) -> Vec<Vec<String>> {
        let mut operation = PrintOperation::new(label, options);
        let sheets = operation.begin();
        (0..sheets)
            .map(|page| {
                operation
                    .draw_sheet(page)
                    .glyph_texts()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn collated_job_prints_copies_together() {
        let options = PrintJobOptions {
            n_copies: 3,
            collate: true,
            ..PrintJobOptions::new()
        };
        assert_eq!(
            print_all(&label(2), options),
            vec![vec!["R1", "R1", "R1", "R2"], vec!["R2", "R2"]]
        );
    }

    #[test]
    fn uncollated_job_repeats_the_list() {
        let options = PrintJobOptions {
            n_copies: 3,
            ..PrintJobOptions::new()
        };
        assert_eq!(
            print_all(&label(2), options),
            vec![vec!["R1", "R2", "R1", "R2"], vec!["R1", "R2"]]
        );
    }

    #[test]
    fn merge_sheet_count_is_reported_before_drawing() {
        let label = label(5);
        let options = PrintJobOptions {
            n_copies: 2,
            ..PrintJobOptions::new()
        };
        let mut operation = PrintOperation::new(&label, options);
        assert_eq!(operation.mode(), PrintMode::Uncollated);
        assert_eq!(operation.begin(), 3);
    }

    #[test]
    fn nothing_selected_means_no_sheets() {
        let mut label = label(3);
        if let Some(merge) = label.merge_mut() {
            merge.select_all(false);
        }
        let mut operation = PrintOperation::new(&label, PrintJobOptions::new());
        assert_eq!(operation.begin(), 0);
    }

    #[test]
    fn simple_job_uses_requested_sheet_count_and_range() {
        let options = PrintJobOptions {
            n_sheets: 2,
            first: 2,
            last: Some(3),
            ..PrintJobOptions::new()
        };
        let sheets = print_all(&label(0), options);
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0], vec!["${name}", "${name}"]);
        assert_eq!(sheets[1].len(), 4);
    }
}
