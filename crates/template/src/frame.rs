//! Label frames: the shape of one label and the grids that repeat it on a sheet.
//! 標籤框架：單一標籤的外形，以及在整張紙上重複排列的網格。

/// Upper-left corner of one label slot on the sheet, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

/// A regular `nx` by `ny` grid of labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub nx: u32,
    pub ny: u32,
    pub x0: f64,
    pub y0: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Layout {
    pub fn label_count(&self) -> usize {
        self.nx as usize * self.ny as usize
    }
}

/// Shape of a single label. Lengths in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameShape {
    Rect {
        width: f64,
        height: f64,
        round: f64,
        x_waste: f64,
        y_waste: f64,
    },
    Round {
        radius: f64,
        waste: f64,
    },
    Ellipse {
        width: f64,
        height: f64,
        waste: f64,
    },
    /// CD/DVD label; `width`/`height` clip the disc when non-zero.
    Cd {
        radius: f64,
        hole: f64,
        width: f64,
        height: f64,
        waste: f64,
    },
}

/// Outline of a label in label coordinates.
///
/// 外框以標籤的邊界矩形表示，並標示原始形狀；裁切用外框包含出血 (waste)。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub shape: OutlineKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    Rect,
    Round,
    Ellipse,
    Cd,
}

/// One label shape and its layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: String,
    pub shape: FrameShape,
    pub layouts: Vec<Layout>,
}

// Rows closer than this (in points) count as the same row.
const ROW_EPSILON: f64 = 0.01;

impl Frame {
    pub fn new(id: impl Into<String>, shape: FrameShape) -> Self {
        Self {
            id: id.into(),
            shape,
            layouts: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layouts.push(layout);
        self
    }

    /// Width and height of the label, unrotated.
    pub fn size(&self) -> (f64, f64) {
        match self.shape {
            FrameShape::Rect { width, height, .. } => (width, height),
            FrameShape::Round { radius, .. } => (2.0 * radius, 2.0 * radius),
            FrameShape::Ellipse { width, height, .. } => (width, height),
            FrameShape::Cd {
                radius,
                width,
                height,
                ..
            } => {
                let w = if width > 0.0 { width } else { 2.0 * radius };
                let h = if height > 0.0 { height } else { 2.0 * radius };
                (w, h)
            }
        }
    }

    fn waste(&self) -> (f64, f64) {
        match self.shape {
            FrameShape::Rect {
                x_waste, y_waste, ..
            } => (x_waste, y_waste),
            FrameShape::Round { waste, .. }
            | FrameShape::Ellipse { waste, .. }
            | FrameShape::Cd { waste, .. } => (waste, waste),
        }
    }

    pub fn label_count(&self) -> usize {
        self.layouts.iter().map(Layout::label_count).sum()
    }

    /// Slot origins sorted top to bottom, then left to right.
    pub fn origins(&self) -> Vec<Origin> {
        let mut origins = Vec::with_capacity(self.label_count());
        for layout in &self.layouts {
            for iy in 0..layout.ny {
                for ix in 0..layout.nx {
                    origins.push(Origin {
                        x: f64::from(ix) * layout.dx + layout.x0,
                        y: f64::from(iy) * layout.dy + layout.y0,
                    });
                }
            }
        }
        origins.sort_by(|a, b| {
            row_key(a.y)
                .cmp(&row_key(b.y))
                .then_with(|| a.x.total_cmp(&b.x))
        });
        origins
    }

    /// Bounding outline of the label. `rotate` swaps the axes; clipping
    /// outlines are grown by the waste margin.
    pub fn outline(&self, rotate: bool, for_clipping: bool) -> Outline {
        let (mut width, mut height) = self.size();
        let (mut x_waste, mut y_waste) = if for_clipping {
            self.waste()
        } else {
            (0.0, 0.0)
        };
        if rotate {
            std::mem::swap(&mut width, &mut height);
            std::mem::swap(&mut x_waste, &mut y_waste);
        }
        let shape = match self.shape {
            FrameShape::Rect { .. } => OutlineKind::Rect,
            FrameShape::Round { .. } => OutlineKind::Round,
            FrameShape::Ellipse { .. } => OutlineKind::Ellipse,
            FrameShape::Cd { .. } => OutlineKind::Cd,
        };
        Outline {
            shape,
            x: -x_waste,
            y: -y_waste,
            width: width + 2.0 * x_waste,
            height: height + 2.0 * y_waste,
        }
    }
}

fn row_key(y: f64) -> i64 {
    (y / ROW_EPSILON).round() as i64
}
