use std::fs;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::io::Reader as ImageReader;
use rustlabels_core::Label;
use rustlabels_printing::platform::{PlatformAdapter, PlatformJobHandle, SpoolSheet};
use rustlabels_printing::{
    run_print_job, DisplayCommand, PreviewCache, PreviewConfig, PrintJobError,
    PrintJobOptions, PrintMode, PrintPreviewKey,
};
use rustlabels_template::TemplateDb;
use tempfile::tempdir;

const TEMPLATES: &str = r#"<Glabels-templates>
  <Template brand="Test" part="Address" size="US-Letter" description="Six per sheet">
    <Label-rectangle id="0" width="3in" height="1.5in" round="0.1in" waste="2pt">
      <Layout nx="2" ny="3" x0="0.75in" y0="1in" dx="3.5in" dy="2in"/>
    </Label-rectangle>
  </Template>
</Glabels-templates>"#;

const LABEL: &str = r##"{
  "template": "Test Address",
  "merge": {"backend": "Text/Comma/Line1Keys", "source": "people.csv"},
  "objects": [
    {"type": "box", "x": 0, "y": 0, "w": 216, "h": 108, "fill_color": "#eeeeee"},
    {"type": "text", "x": 9, "y": 9, "font_size": 12, "text": "${name}\n${company}\n${city} (${zip})"}
  ]
}"##;

const PEOPLE: &str = "name,company,city,zip\n\
Ada Lovelace,,London,N1\n\
Grace Hopper,US Navy,Arlington,22201\n\
Alan Turing,,Wilmslow,SK9\n\
Edsger Dijkstra,UT Austin,Austin,78712\n";

#[derive(Clone, Default)]
struct RecordingAdapter {
    jobs: Arc<Mutex<Vec<RecordedJob>>>,
    fail_on_sheet: Option<usize>,
}

#[derive(Clone)]
struct RecordedJob {
    sheets: Vec<SpoolSheet>,
    finished: bool,
}

struct RecordingHandle {
    sheets: Vec<SpoolSheet>,
    fail_on_sheet: Option<usize>,
    sink: Arc<Mutex<Vec<RecordedJob>>>,
}

impl PlatformAdapter for RecordingAdapter {
    type Error = String;
    type JobHandle = RecordingHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        let _ = options;
        Ok(RecordingHandle {
            sheets: Vec::new(),
            fail_on_sheet: self.fail_on_sheet,
            sink: self.jobs.clone(),
        })
    }
}

impl PlatformJobHandle for RecordingHandle {
    type Error = String;

    fn submit_sheet(&mut self, sheet: SpoolSheet) -> Result<(), Self::Error> {
        if self.fail_on_sheet == Some(sheet.sheet) {
            return Err(format!("printer jammed on sheet {}", sheet.sheet));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let mut guard = self.sink.lock().unwrap();
        guard.push(RecordedJob {
            sheets: self.sheets,
            finished: true,
        });
        Ok(())
    }

    fn abort(self, _reason: &str) {
        let mut guard = self.sink.lock().unwrap();
        guard.push(RecordedJob {
            sheets: Vec::new(),
            finished: false,
        });
    }
}

fn load_label() -> (tempfile::TempDir, Label) {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("people.csv"), PEOPLE).expect("write csv");
    let label_path = temp.path().join("address.json");
    fs::write(&label_path, LABEL).expect("write label");
    let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
    let label = Label::load(&label_path, &db).expect("label");
    (temp, label)
}

#[test]
fn pipeline_generates_pdf_and_previews() {
    let (_temp, label) = load_label();
    assert_eq!(label.records().len(), 4);

    let job_options = PrintJobOptions {
        n_copies: 2,
        collate: true,
        first: 3,
        outline: true,
        crop_marks: true,
        ..PrintJobOptions::new()
    };
    let adapter = RecordingAdapter::default();
    let mut cache = PreviewCache::with_capacity(16);
    let preview = PreviewConfig {
        cache: &mut cache,
        zoom_levels: &[100, 150],
        base_dpi: 72,
    };

    let result = run_print_job(&label, &job_options, &adapter, Some(preview)).expect("print job");

    // Two slots skipped, then 4 records x 2 copies on six-up sheets.
    assert_eq!(result.mode, PrintMode::Collated);
    assert_eq!(result.n_sheets, 2);
    assert_eq!(result.sheets.len(), 2);
    assert!(result.pdf_data.starts_with(b"%PDF"));

    let jobs = adapter.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].finished);
    assert_eq!(jobs[0].sheets.len(), 2);

    let first_sheet = &jobs[0].sheets[0].display_list;
    assert_eq!(
        first_sheet.glyph_texts(),
        vec![
            "Ada Lovelace",
            "London (N1)",
            "Ada Lovelace",
            "London (N1)",
            "Grace Hopper",
            "US Navy",
            "Arlington (22201)",
            "Grace Hopper",
            "US Navy",
            "Arlington (22201)",
        ]
    );
    let outlines = first_sheet
        .commands
        .iter()
        .filter(|command| matches!(command, DisplayCommand::StrokeOutline { .. }))
        .count();
    assert_eq!(outlines, 4);
    let crop_ticks = first_sheet
        .commands
        .iter()
        .filter(|command| matches!(command, DisplayCommand::Line { .. }))
        .count();
    assert_eq!(crop_ticks, 4 * 2 + 4 * 3);

    assert_eq!(cache.len(), 4);
    for sheet in 0..2 {
        for zoom in [100, 150] {
            let key = PrintPreviewKey {
                job_id: job_options.job_id,
                sheet,
                zoom_percent: zoom,
            };
            let entry = cache
                .get(&key)
                .unwrap_or_else(|| panic!("missing preview for sheet {sheet} @ {zoom}%"));
            let image = ImageReader::new(Cursor::new(&entry.data))
                .with_guessed_format()
                .expect("is png")
                .decode()
                .expect("decode preview");
            assert_eq!(image.width(), entry.width_px);
        }
    }
}

#[test]
fn pdf_contains_expanded_text() {
    let (_temp, label) = load_label();
    let adapter = RecordingAdapter::default();

    let result = run_print_job(&label, &PrintJobOptions::new(), &adapter, None).expect("print job");

    let pdf_text = String::from_utf8_lossy(&result.pdf_data);
    assert!(pdf_text.contains("/Type /Catalog"));
    assert!(pdf_text.contains("/Type /Page "));
    assert!(pdf_text.contains("/Count 1"));
    assert!(pdf_text.contains("(Edsger Dijkstra) Tj"));
    assert!(pdf_text.contains("(Wilmslow \\(SK9\\)) Tj"));
    assert!(!pdf_text.contains("${"));
}

#[test]
fn deselected_records_are_not_printed() {
    let (_temp, mut label) = load_label();
    if let Some(merge) = label.merge_mut() {
        assert!(merge.set_selected(0, false));
        assert!(merge.set_selected(2, false));
    }
    let adapter = RecordingAdapter::default();

    let result = run_print_job(&label, &PrintJobOptions::new(), &adapter, None).expect("print job");

    assert_eq!(result.n_sheets, 1);
    let texts = result.sheets[0].glyph_texts();
    assert!(texts.contains(&"Grace Hopper"));
    assert!(texts.contains(&"Edsger Dijkstra"));
    assert!(!texts.contains(&"Ada Lovelace"));
    assert!(!texts.contains(&"Alan Turing"));
}

#[test]
fn spool_failure_aborts_the_job() {
    let (_temp, label) = load_label();
    let adapter = RecordingAdapter {
        fail_on_sheet: Some(1),
        ..RecordingAdapter::default()
    };
    let options = PrintJobOptions {
        n_copies: 3,
        ..PrintJobOptions::new()
    };

    let err = run_print_job(&label, &options, &adapter, None).expect_err("spool should fail");
    assert!(matches!(err, PrintJobError::Platform(ref message) if message.contains("jammed")));

    let jobs = adapter.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(!jobs[0].finished);
}
