use std::fmt;

use rustlabels_template::Outline;

/// Recorded drawing commands for one sheet. Coordinates are points with the
/// origin at the top-left corner of the page and y growing downwards.
#[derive(Debug, Clone, Default)]
pub struct PrintDisplayList {
    pub commands: Vec<DisplayCommand>,
}

impl PrintDisplayList {
    /// Append a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Returns true if the display list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn save(&mut self) {
        self.push(DisplayCommand::Save);
    }

    pub fn restore(&mut self) {
        self.push(DisplayCommand::Restore);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.push(DisplayCommand::Translate { dx, dy });
    }

    pub fn rotate(&mut self, degrees: f64) {
        self.push(DisplayCommand::Rotate { degrees });
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.push(DisplayCommand::Scale { sx, sy });
    }

    /// Text of every glyph run, in drawing order.
    pub fn glyph_texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DisplayCommand::GlyphRun(run) => Some(run.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Low-level drawing commands emitted while printing a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    /// Pushes the transform and clip state.
    Save,
    /// Pops the state pushed by the matching `Save`.
    Restore,
    Translate {
        dx: f64,
        dy: f64,
    },
    /// Clockwise rotation on the page (y grows downwards).
    Rotate {
        degrees: f64,
    },
    Scale {
        sx: f64,
        sy: f64,
    },
    /// Intersects the clip region with a label outline.
    ClipOutline(Outline),
    StrokeOutline {
        outline: Outline,
        stroke: Stroke,
    },
    Line {
        start: Point,
        end: Point,
        stroke: Stroke,
    },
    Rect(Rectangle),
    GlyphRun(GlyphRun),
}

/// Describes an individual glyph run; `position` is the top-left of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub font_family: String,
    pub font_size_pt: f64,
    pub position: Point,
    pub color: Color,
}

/// Rectangle with an optional fill and outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub origin: Point,
    pub size: Size,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

/// 2D size representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// RGBA color stored in normalized floating-point form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl From<rustlabels_core::Color> for Color {
    fn from(color: rustlabels_core::Color) -> Self {
        let channel = |value: u8| f32::from(value) / 255.0;
        Self::new(
            channel(color.r),
            channel(color.g),
            channel(color.b),
            channel(color.a),
        )
    }
}

/// Stroke descriptor for simple line drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Color,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({:.3}, {:.3}, {:.3}, {:.3})",
            self.r, self.g, self.b, self.a
        )
    }
}

/// 2D affine transform `[a b c d e f]`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Applies `other` in the local coordinate system of `self`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Matrix {
        Matrix {
            e: dx,
            f: dy,
            ..Matrix::IDENTITY
        }
    }

    pub fn rotation(degrees: f64) -> Matrix {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Matrix {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn scaling(sx: f64, sy: f64) -> Matrix {
        Matrix {
            a: sx,
            d: sy,
            ..Matrix::IDENTITY
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }

    /// Transform for one command, if it is a transform command.
    pub fn for_command(command: &DisplayCommand) -> Option<Matrix> {
        match command {
            DisplayCommand::Translate { dx, dy } => Some(Matrix::translation(*dx, *dy)),
            DisplayCommand::Rotate { degrees } => Some(Matrix::rotation(*degrees)),
            DisplayCommand::Scale { sx, sy } => Some(Matrix::scaling(*sx, *sy)),
            _ => None,
        }
    }
}

/// Page-space positions of glyph runs after applying the transform stack.
pub fn glyph_positions(list: &PrintDisplayList) -> Vec<(String, Point)> {
    let mut stack = Vec::new();
    let mut current = Matrix::IDENTITY;
    let mut output = Vec::new();
    for command in &list.commands {
        match command {
            DisplayCommand::Save => stack.push(current),
            DisplayCommand::Restore => current = stack.pop().unwrap_or(Matrix::IDENTITY),
            DisplayCommand::GlyphRun(run) => {
                output.push((run.text.clone(), current.apply(run.position)));
            }
            other => {
                if let Some(matrix) = Matrix::for_command(other) {
                    current = current.then(&matrix);
                }
            }
        }
    }
    output
}
