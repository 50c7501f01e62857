//! Minimal single-file PDF writer for recorded sheets.
//! 將已錄製的頁面輸出為 PDF。

use std::fmt::Write as _;

use rustlabels_template::Outline;

use crate::display::{Color, DisplayCommand, PrintDisplayList, Rectangle, Stroke};

/// Standard Type 1 fonts available to glyph runs, by resource name.
const FONTS: [(&str, &str); 3] = [("F1", "Helvetica"), ("F2", "Times-Roman"), ("F3", "Courier")];

/// Baseline offset below the top of a line box, as a fraction of the font size.
const ASCENT: f64 = 0.8;

/// Renders one PDF page per display list. Every page has the same size.
pub fn render_pdf_document(
    sheets: &[PrintDisplayList],
    page_width: f64,
    page_height: f64,
) -> Result<Vec<u8>, String> {
    if sheets.is_empty() {
        return Err("print job produced no sheets".to_string());
    }

    let mut builder = PdfBuilder::new();
    let pages_object = builder.reserve();
    let fonts: Vec<(&str, usize)> = FONTS
        .iter()
        .map(|(name, base)| {
            let object = builder.add_object(format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>"
            ));
            (*name, object)
        })
        .collect();
    let font_resources = fonts
        .iter()
        .map(|(name, object)| format!("/{name} {object} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut page_objects = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let content = render_page_stream(sheet, page_height)?;
        let content_object = builder.add_stream(&content);
        let page_object = builder.add_object(format!(
            "<< /Type /Page /Parent {pages_object} 0 R /MediaBox [0 0 {width} {height}] \
             /Resources << /Font << {font_resources} >> >> /Contents {content_object} 0 R >>",
            width = fmt_float(page_width),
            height = fmt_float(page_height),
        ));
        page_objects.push(page_object);
    }

    let kids = page_objects
        .iter()
        .map(|object| format!("{object} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    builder.set_object(
        pages_object,
        format!(
            "<< /Type /Pages /Count {count} /Kids [{kids}] >>",
            count = page_objects.len()
        ),
    );
    let catalog = builder.add_object(format!("<< /Type /Catalog /Pages {pages_object} 0 R >>"));

    Ok(builder.finish(catalog))
}

/// Content stream for one sheet. The first operator flips the y axis so the
/// display list's top-left coordinates can be written as-is.
fn render_page_stream(list: &PrintDisplayList, page_height: f64) -> Result<Vec<u8>, String> {
    let mut ops = String::new();
    let mut out = Vec::new();
    write_op(&mut ops, format_args!("1 0 0 -1 0 {} cm", fmt_float(page_height)))?;

    for command in &list.commands {
        match command {
            DisplayCommand::Save => write_op(&mut ops, format_args!("q"))?,
            DisplayCommand::Restore => write_op(&mut ops, format_args!("Q"))?,
            DisplayCommand::Translate { dx, dy } => write_op(
                &mut ops,
                format_args!("1 0 0 1 {} {} cm", fmt_float(*dx), fmt_float(*dy)),
            )?,
            DisplayCommand::Rotate { degrees } => {
                let (sin, cos) = degrees.to_radians().sin_cos();
                write_op(
                    &mut ops,
                    format_args!(
                        "{} {} {} {} 0 0 cm",
                        fmt_float(cos),
                        fmt_float(sin),
                        fmt_float(-sin),
                        fmt_float(cos)
                    ),
                )?;
            }
            DisplayCommand::Scale { sx, sy } => write_op(
                &mut ops,
                format_args!("{} 0 0 {} 0 0 cm", fmt_float(*sx), fmt_float(*sy)),
            )?,
            DisplayCommand::ClipOutline(outline) => {
                write_op(&mut ops, format_args!("{} re W n", outline_rect(outline)))?;
            }
            DisplayCommand::StrokeOutline { outline, stroke } => {
                write_stroke_state(&mut ops, stroke)?;
                write_op(&mut ops, format_args!("{} re S", outline_rect(outline)))?;
            }
            DisplayCommand::Line { start, end, stroke } => {
                write_stroke_state(&mut ops, stroke)?;
                write_op(
                    &mut ops,
                    format_args!(
                        "{} {} m {} {} l S",
                        fmt_float(start.x),
                        fmt_float(start.y),
                        fmt_float(end.x),
                        fmt_float(end.y)
                    ),
                )?;
            }
            DisplayCommand::Rect(rect) => write_rect(&mut ops, rect)?,
            DisplayCommand::GlyphRun(run) => {
                let baseline = run.position.y + run.font_size_pt * ASCENT;
                write_op(
                    &mut ops,
                    format_args!(
                        "{} rg\nBT\n/{} {} Tf\n1 0 0 -1 {} {} Tm",
                        rgb_to_pdf(run.color),
                        font_resource(&run.font_family),
                        fmt_float(run.font_size_pt),
                        fmt_float(run.position.x),
                        fmt_float(baseline)
                    ),
                )?;
                // Text bytes are not UTF-8, so flush the operators first.
                out.extend_from_slice(ops.as_bytes());
                ops.clear();
                out.push(b'(');
                out.extend_from_slice(&pdf_escape_text(&run.text));
                out.extend_from_slice(b") Tj\nET\n");
            }
        }
    }
    out.extend_from_slice(ops.as_bytes());
    Ok(out)
}

fn write_op(ops: &mut String, args: std::fmt::Arguments<'_>) -> Result<(), String> {
    ops.write_fmt(args).map_err(|err| err.to_string())?;
    ops.push('\n');
    Ok(())
}

fn write_stroke_state(ops: &mut String, stroke: &Stroke) -> Result<(), String> {
    write_op(
        ops,
        format_args!("{} RG\n{} w", rgb_to_pdf(stroke.color), fmt_float(stroke.width)),
    )
}

fn write_rect(ops: &mut String, rect: &Rectangle) -> Result<(), String> {
    let path = format!(
        "{} {} {} {} re",
        fmt_float(rect.origin.x),
        fmt_float(rect.origin.y),
        fmt_float(rect.size.width),
        fmt_float(rect.size.height)
    );
    if let Some(fill) = rect.fill {
        write_op(ops, format_args!("{} rg\n{path} f", rgb_to_pdf(fill)))?;
    }
    if let Some(stroke) = &rect.stroke {
        write_stroke_state(ops, stroke)?;
        write_op(ops, format_args!("{path} S"))?;
    }
    Ok(())
}

fn outline_rect(outline: &Outline) -> String {
    format!(
        "{} {} {} {}",
        fmt_float(outline.x),
        fmt_float(outline.y),
        fmt_float(outline.width),
        fmt_float(outline.height)
    )
}

/// Maps a font family to one of the standard PDF fonts.
fn font_resource(family: &str) -> &'static str {
    let family = family.to_ascii_lowercase();
    if family.contains("mono") || family.contains("courier") {
        "F3"
    } else if (family.contains("serif") && !family.contains("sans")) || family.contains("times") {
        "F2"
    } else {
        "F1"
    }
}

fn fmt_float(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn rgb_to_pdf(color: Color) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0)
    )
}

/// Escapes a string for a PDF literal, encoding it as Latin-1. Characters
/// outside Latin-1 become `?`.
fn pdf_escape_text(input: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '(' | ')' | '\\' => {
                output.push(b'\\');
                output.push(ch as u8);
            }
            '\n' => output.extend_from_slice(b"\\n"),
            '\r' => output.extend_from_slice(b"\\r"),
            _ => match u8::try_from(u32::from(ch)) {
                Ok(byte) => output.push(byte),
                Err(_) => output.push(b'?'),
            },
        }
    }
    output
}

struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Allocates an object number to be filled in later with `set_object`.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn add_object(&mut self, body: impl Into<String>) -> usize {
        self.objects.push(body.into().into_bytes());
        self.objects.len()
    }

    fn set_object(&mut self, number: usize, body: impl Into<String>) {
        if let Some(slot) = self.objects.get_mut(number - 1) {
            *slot = body.into().into_bytes();
        }
    }

    fn add_stream(&mut self, stream: &[u8]) -> usize {
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(stream);
        body.extend_from_slice(b"\nendstream");
        self.objects.push(body);
        self.objects.len()
    }

    fn finish(self, root: usize) -> Vec<u8> {
        let mut output = Vec::new();
        output.extend_from_slice(b"%PDF-1.4\n%\xFF\xFF\xFF\xFF\n");
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (index, body) in self.objects.iter().enumerate() {
            offsets.push(output.len());
            output.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            output.extend_from_slice(body);
            output.extend_from_slice(b"\nendobj\n");
        }

        let xref_start = output.len();
        let size = self.objects.len() + 1;
        output.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in offsets {
            output.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        output.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n")
                .as_bytes(),
        );
        output
    }
}
