//! Coarse raster previews of recorded sheets.
//!
//! Glyph runs are drawn as blocks of their estimated extent; outlines are
//! drawn as their bounding rectangles.

use image::{codecs::png::PngEncoder, ColorType, ImageBuffer, ImageEncoder, Rgba};

use crate::display::{Color, DisplayCommand, Matrix, Point, PrintDisplayList, Stroke};
use crate::preview::PreviewEntry;

type Canvas = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Largest preview canvas, in pixels (64 MiB of RGBA).
pub const MAX_PREVIEW_PIXELS: f64 = 16_000_000.0;

/// Device-space clip rectangle `[x0, x1) x [y0, y1)` in pixels.
#[derive(Debug, Clone, Copy)]
struct ClipBox {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl ClipBox {
    fn intersect(self, other: ClipBox) -> ClipBox {
        ClipBox {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    matrix: Matrix,
    clip: ClipBox,
}

/// Preview resolution: `base_dpi * zoom_percent / 100`, at least 72 dpi,
/// lowered so the page never exceeds [`MAX_PREVIEW_PIXELS`].
pub fn preview_dpi(
    page_width_pt: f64,
    page_height_pt: f64,
    zoom_percent: u32,
    base_dpi: u32,
) -> u32 {
    let requested = ((u64::from(base_dpi) * u64::from(zoom_percent)) / 100).max(72);
    let requested = u32::try_from(requested).unwrap_or(u32::MAX);
    let area_in = (page_width_pt / 72.0) * (page_height_pt / 72.0);
    if !(area_in.is_finite() && area_in > 0.0) {
        return requested;
    }
    let limit = (MAX_PREVIEW_PIXELS / area_in).sqrt().floor().max(1.0) as u32;
    requested.min(limit)
}

/// Rasterises a sheet at [`preview_dpi`] and encodes it as PNG.
pub fn render_preview_png(
    list: &PrintDisplayList,
    page_width_pt: f64,
    page_height_pt: f64,
    zoom_percent: u32,
    base_dpi: u32,
) -> Result<PreviewEntry, String> {
    let dpi = preview_dpi(page_width_pt, page_height_pt, zoom_percent, base_dpi);
    let scale = f64::from(dpi) / 72.0;
    let width_px = (page_width_pt * scale).ceil().max(1.0) as u32;
    let height_px = (page_height_pt * scale).ceil().max(1.0) as u32;

    let mut canvas = ImageBuffer::from_pixel(width_px, height_px, Rgba([255, 255, 255, 255]));
    let mut state = GraphicsState {
        matrix: Matrix::scaling(scale, scale),
        clip: ClipBox {
            x0: 0,
            y0: 0,
            x1: i64::from(width_px),
            y1: i64::from(height_px),
        },
    };
    let mut stack = Vec::new();

    for command in &list.commands {
        match command {
            DisplayCommand::Save => stack.push(state),
            DisplayCommand::Restore => {
                if let Some(saved) = stack.pop() {
                    state = saved;
                }
            }
            DisplayCommand::ClipOutline(outline) => {
                let bounds = device_box(
                    &state.matrix,
                    Point::new(outline.x, outline.y),
                    outline.width,
                    outline.height,
                );
                state.clip = state.clip.intersect(bounds);
            }
            DisplayCommand::StrokeOutline { outline, stroke } => {
                let bounds = device_box(
                    &state.matrix,
                    Point::new(outline.x, outline.y),
                    outline.width,
                    outline.height,
                );
                stroke_box(&mut canvas, bounds, stroke, state.clip);
            }
            DisplayCommand::Line { start, end, stroke } => {
                draw_line(
                    &mut canvas,
                    state.matrix.apply(*start),
                    state.matrix.apply(*end),
                    stroke,
                    state.clip,
                );
            }
            DisplayCommand::Rect(rect) => {
                let bounds = device_box(
                    &state.matrix,
                    rect.origin,
                    rect.size.width,
                    rect.size.height,
                );
                if let Some(fill) = rect.fill {
                    fill_box(&mut canvas, bounds, fill, state.clip);
                }
                if let Some(stroke) = &rect.stroke {
                    stroke_box(&mut canvas, bounds, stroke, state.clip);
                }
            }
            DisplayCommand::GlyphRun(run) => {
                let width = estimate_text_width(&run.text, run.font_size_pt);
                let bounds = device_box(&state.matrix, run.position, width, run.font_size_pt);
                fill_box(&mut canvas, bounds, run.color, state.clip);
            }
            other => {
                if let Some(matrix) = Matrix::for_command(other) {
                    state.matrix = state.matrix.then(&matrix);
                }
            }
        }
    }

    let mut data = Vec::new();
    PngEncoder::new(&mut data)
        .write_image(canvas.as_raw(), width_px, height_px, ColorType::Rgba8)
        .map_err(|err| err.to_string())?;

    Ok(PreviewEntry {
        width_px,
        height_px,
        dpi,
        data,
    })
}

/// Device-space bounding box of a user-space rectangle.
fn device_box(matrix: &Matrix, origin: Point, width: f64, height: f64) -> ClipBox {
    let corners = [
        origin,
        Point::new(origin.x + width, origin.y),
        Point::new(origin.x, origin.y + height),
        Point::new(origin.x + width, origin.y + height),
    ]
    .map(|corner| matrix.apply(corner));
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    ClipBox {
        x0: min_x.round() as i64,
        y0: min_y.round() as i64,
        x1: max_x.round() as i64,
        y1: max_y.round() as i64,
    }
}

fn fill_box(canvas: &mut Canvas, bounds: ClipBox, color: Color, clip: ClipBox) {
    let area = bounds.intersect(clip);
    let rgba = color_to_rgba(color);
    for y in area.y0..area.y1 {
        for x in area.x0..area.x1 {
            put(canvas, x, y, rgba);
        }
    }
}

fn stroke_box(canvas: &mut Canvas, bounds: ClipBox, stroke: &Stroke, clip: ClipBox) {
    let rgba = color_to_rgba(stroke.color);
    let right = bounds.x1 - 1;
    let bottom = bounds.y1 - 1;
    for x in bounds.x0..bounds.x1 {
        put_clipped(canvas, x, bounds.y0, rgba, clip);
        put_clipped(canvas, x, bottom, rgba, clip);
    }
    for y in bounds.y0..bounds.y1 {
        put_clipped(canvas, bounds.x0, y, rgba, clip);
        put_clipped(canvas, right, y, rgba, clip);
    }
}

/// One-pixel line, stepped along its longer axis.
fn draw_line(canvas: &mut Canvas, start: Point, end: Point, stroke: &Stroke, clip: ClipBox) {
    let rgba = color_to_rgba(stroke.color);
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = (start.x + dx * t).round() as i64;
        let y = (start.y + dy * t).round() as i64;
        put_clipped(canvas, x, y, rgba, clip);
    }
}

fn put_clipped(canvas: &mut Canvas, x: i64, y: i64, rgba: Rgba<u8>, clip: ClipBox) {
    if x >= clip.x0 && x < clip.x1 && y >= clip.y0 && y < clip.y1 {
        put(canvas, x, y, rgba);
    }
}

fn put(canvas: &mut Canvas, x: i64, y: i64, rgba: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, rgba);
}

fn color_to_rgba(color: Color) -> Rgba<u8> {
    Rgba([
        clamp_to_u8(color.r),
        clamp_to_u8(color.g),
        clamp_to_u8(color.b),
        clamp_to_u8(color.a),
    ])
}

fn clamp_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    (text.chars().count() as f64) * font_size.max(1.0) * 0.6
}
