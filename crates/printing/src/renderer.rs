use rustlabels_core::{expand_lines, BoxObject, Label, LabelObject, TextObject};
use rustlabels_merge::MergeRecord;
use rustlabels_template::TemplateGeometry;

use crate::display::{Color, DisplayCommand, GlyphRun, Point, PrintDisplayList, Rectangle, Size, Stroke};

/// A label that can be placed on sheets.
/// 可排版到整張紙上的標籤。
///
/// `draw` receives a context already translated to the label's top-left
/// corner (and rotated or mirrored as requested) and draws in label
/// coordinates.
pub trait LabelRenderer {
    fn geometry(&self) -> &dyn TemplateGeometry;

    /// True when the label is drawn rotated by 90 degrees on the sheet.
    fn rotate(&self) -> bool;

    /// Width and height as drawn, after rotation.
    fn size(&self) -> (f64, f64);

    /// True when the label carries a merge source.
    fn has_merge(&self) -> bool;

    /// Records available for merging; empty without a merge source.
    fn records(&self) -> &[MergeRecord];

    /// Draws the label contents. `screen` is set for on-screen previews.
    fn draw(&self, ctx: &mut PrintDisplayList, screen: bool, record: Option<&MergeRecord>);
}

impl LabelRenderer for Label {
    fn geometry(&self) -> &dyn TemplateGeometry {
        self.template()
    }

    fn rotate(&self) -> bool {
        Label::rotate(self)
    }

    fn size(&self) -> (f64, f64) {
        Label::size(self)
    }

    fn has_merge(&self) -> bool {
        self.merge().is_some()
    }

    fn records(&self) -> &[MergeRecord] {
        Label::records(self)
    }

    fn draw(&self, ctx: &mut PrintDisplayList, _screen: bool, record: Option<&MergeRecord>) {
        for object in self.objects() {
            match object {
                LabelObject::Text(text) => draw_text(ctx, text, record),
                LabelObject::Box(rect) => draw_box(ctx, rect),
            }
        }
    }
}

fn draw_text(ctx: &mut PrintDisplayList, text: &TextObject, record: Option<&MergeRecord>) {
    let advance = text.font_size * text.line_spacing;
    let color = Color::from(text.color);
    for (row, line) in expand_lines(&text.text, record).into_iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        ctx.push(DisplayCommand::GlyphRun(GlyphRun {
            text: line,
            font_family: text.font_family.clone(),
            font_size_pt: text.font_size,
            position: Point::new(text.x, text.y + advance * row as f64),
            color,
        }));
    }
}

fn draw_box(ctx: &mut PrintDisplayList, rect: &BoxObject) {
    let stroke = rect
        .line_color
        .filter(|_| rect.line_width > 0.0)
        .map(|color| Stroke {
            width: rect.line_width,
            color: Color::from(color),
        });
    let fill = rect.fill_color.map(Color::from);
    if stroke.is_none() && fill.is_none() {
        return;
    }
    ctx.push(DisplayCommand::Rect(Rectangle {
        origin: Point::new(rect.x, rect.y),
        size: Size {
            width: rect.w,
            height: rect.h,
        },
        fill,
        stroke,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustlabels_template::TemplateDb;

    const TEMPLATES: &str = r#"<Glabels-templates>
  <Template brand="Test" part="1" size="Other" width="200pt" height="100pt">
    <Label-rectangle id="0" width="180pt" height="80pt">
      <Layout nx="1" ny="1" x0="10pt" y0="10pt" dx="0" dy="0"/>
    </Label-rectangle>
  </Template>
</Glabels-templates>"#;

    fn label(json: &str) -> Label {
        let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
        Label::from_json(json, &db).expect("label")
    }

    #[test]
    fn text_lines_advance_by_font_size_and_spacing() {
        let label = label(
            r#"{"template": "Test 1", "objects": [
                {"type": "text", "x": 5, "y": 7, "font_size": 10, "line_spacing": 1.5,
                 "text": "${name}\n${street}\nend"}
            ]}"#,
        );
        let record = MergeRecord::from_pairs([("name", "Ada")]);
        let mut ctx = PrintDisplayList::default();
        label.draw(&mut ctx, false, Some(&record));

        let runs: Vec<&GlyphRun> = ctx
            .commands
            .iter()
            .filter_map(|command| match command {
                DisplayCommand::GlyphRun(run) => Some(run),
                _ => None,
            })
            .collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Ada");
        assert_eq!(runs[0].position, Point::new(5.0, 7.0));
        assert_eq!(runs[1].text, "end");
        assert_eq!(runs[1].position, Point::new(5.0, 22.0));
    }

    #[test]
    fn placeholders_are_drawn_without_a_record() {
        let label = label(
            r#"{"template": "Test 1", "objects": [
                {"type": "text", "x": 0, "y": 0, "text": "To: ${name}"}
            ]}"#,
        );
        let mut ctx = PrintDisplayList::default();
        label.draw(&mut ctx, true, None);
        assert_eq!(ctx.glyph_texts(), vec!["To: ${name}"]);
    }

    #[test]
    fn boxes_without_paint_are_skipped() {
        let label = label(
            r##"{"template": "Test 1", "objects": [
                {"type": "box", "x": 0, "y": 0, "w": 10, "h": 10},
                {"type": "box", "x": 1, "y": 2, "w": 3, "h": 4, "line_color": "#000000", "line_width": 0.5}
            ]}"##,
        );
        let mut ctx = PrintDisplayList::default();
        label.draw(&mut ctx, false, None);
        assert_eq!(ctx.commands.len(), 1);
        match &ctx.commands[0] {
            DisplayCommand::Rect(rect) => {
                assert_eq!(rect.origin, Point::new(1.0, 2.0));
                assert!(rect.fill.is_none());
                assert_eq!(rect.stroke.map(|stroke| stroke.width), Some(0.5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
