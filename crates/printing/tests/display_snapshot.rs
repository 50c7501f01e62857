use std::fs;
use std::path::PathBuf;

use ron::ser::PrettyConfig;
use rustlabels_core::Label;
use rustlabels_merge::MergeRecord;
use rustlabels_printing::display::Color;
use rustlabels_printing::{print_label, DisplayCommand, PrintDisplayList};
use rustlabels_template::TemplateDb;
use serde::{Deserialize, Serialize};

const TEMPLATES: &str = r#"<Glabels-templates>
  <Template brand="Snap" part="1" size="Other" width="200pt" height="100pt">
    <Label-rectangle id="0" width="100pt" height="50pt" waste="2pt">
      <Layout nx="1" ny="1" x0="50pt" y0="25pt" dx="0" dy="0"/>
    </Label-rectangle>
  </Template>
</Glabels-templates>"#;

const LABEL: &str = r##"{
  "template": "Snap 1",
  "objects": [
    {"type": "box", "x": 0, "y": 0, "w": 10, "h": 5, "fill_color": "#ff0000"},
    {"type": "text", "x": 4, "y": 4, "font_size": 8, "text": "Hi ${name}"}
  ]
}"##;

#[test]
fn display_list_matches_snapshot() {
    let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
    let label = Label::from_json(LABEL, &db).expect("label");
    let record = MergeRecord::from_pairs([("name", "Ada")]);

    let mut display_list = PrintDisplayList::default();
    print_label(&label, &mut display_list, 50.0, 25.0, Some(&record), true, true);
    let actual = SnapshotDisplayList::from_display_list(&display_list);

    let snapshot_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/snapshots/mirrored_label.ron");
    let text = fs::read_to_string(&snapshot_path)
        .unwrap_or_else(|err| panic!("failed to read snapshot {:?}: {err}", snapshot_path));
    let expected: SnapshotDisplayList = ron::from_str(&text).expect("parse snapshot");

    if actual != expected {
        let pretty = PrettyConfig::new().separate_tuple_members(true);
        let rendered = ron::ser::to_string_pretty(&actual, pretty).expect("serialize display list");
        panic!("display list snapshot mismatch.\n--- actual ---\n{rendered}");
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SnapshotDisplayList {
    commands: Vec<SnapshotCommand>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum SnapshotCommand {
    Save,
    Restore,
    Translate {
        dx: f64,
        dy: f64,
    },
    Rotate {
        degrees: f64,
    },
    Scale {
        sx: f64,
        sy: f64,
    },
    Clip {
        shape: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Outline {
        shape: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        stroke: SnapshotStroke,
    },
    Line {
        start: SnapshotPoint,
        end: SnapshotPoint,
        stroke: SnapshotStroke,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<SnapshotColor>,
        stroke: Option<SnapshotStroke>,
    },
    GlyphRun {
        text: String,
        font_family: String,
        font_size_pt: f64,
        x: f64,
        y: f64,
        color: SnapshotColor,
    },
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SnapshotPoint {
    x: f64,
    y: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SnapshotStroke {
    width: f64,
    color: SnapshotColor,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SnapshotColor {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl SnapshotDisplayList {
    fn from_display_list(list: &PrintDisplayList) -> Self {
        let commands = list
            .commands
            .iter()
            .map(|command| match command {
                DisplayCommand::Save => SnapshotCommand::Save,
                DisplayCommand::Restore => SnapshotCommand::Restore,
                DisplayCommand::Translate { dx, dy } => SnapshotCommand::Translate {
                    dx: *dx,
                    dy: *dy,
                },
                DisplayCommand::Rotate { degrees } => SnapshotCommand::Rotate { degrees: *degrees },
                DisplayCommand::Scale { sx, sy } => SnapshotCommand::Scale { sx: *sx, sy: *sy },
                DisplayCommand::ClipOutline(outline) => SnapshotCommand::Clip {
                    shape: format!("{:?}", outline.shape),
                    x: outline.x,
                    y: outline.y,
                    width: outline.width,
                    height: outline.height,
                },
                DisplayCommand::StrokeOutline { outline, stroke } => SnapshotCommand::Outline {
                    shape: format!("{:?}", outline.shape),
                    x: outline.x,
                    y: outline.y,
                    width: outline.width,
                    height: outline.height,
                    stroke: snapshot_stroke(stroke.width, stroke.color),
                },
                DisplayCommand::Line { start, end, stroke } => SnapshotCommand::Line {
                    start: SnapshotPoint {
                        x: start.x,
                        y: start.y,
                    },
                    end: SnapshotPoint { x: end.x, y: end.y },
                    stroke: snapshot_stroke(stroke.width, stroke.color),
                },
                DisplayCommand::Rect(rect) => SnapshotCommand::Rect {
                    x: rect.origin.x,
                    y: rect.origin.y,
                    width: rect.size.width,
                    height: rect.size.height,
                    fill: rect.fill.map(snapshot_color),
                    stroke: rect
                        .stroke
                        .map(|stroke| snapshot_stroke(stroke.width, stroke.color)),
                },
                DisplayCommand::GlyphRun(run) => SnapshotCommand::GlyphRun {
                    text: run.text.clone(),
                    font_family: run.font_family.clone(),
                    font_size_pt: run.font_size_pt,
                    x: run.position.x,
                    y: run.position.y,
                    color: snapshot_color(run.color),
                },
            })
            .collect();

        Self { commands }
    }
}

fn snapshot_stroke(width: f64, color: Color) -> SnapshotStroke {
    SnapshotStroke {
        width,
        color: snapshot_color(color),
    }
}

fn snapshot_color(color: Color) -> SnapshotColor {
    SnapshotColor {
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    }
}
