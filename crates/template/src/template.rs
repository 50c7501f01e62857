use crate::frame::{Frame, Layout, Origin, Outline};

/// Read-only sheet geometry consumed by the print engine.
/// 列印引擎所需的唯讀紙張幾何資訊。
pub trait TemplateGeometry {
    /// Page width and height in points.
    fn page_size(&self) -> (f64, f64);
    /// Label width and height in points, before any label rotation.
    fn frame_size(&self) -> (f64, f64);
    fn label_count_per_sheet(&self) -> usize;
    /// Slot origins in printing order.
    fn label_origins(&self) -> Vec<Origin>;
    fn layouts(&self) -> &[Layout];
    fn outline(&self, rotate: bool, for_clipping: bool) -> Outline;
}

/// A product template: page size plus the label frame printed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub brand: String,
    pub part: String,
    pub description: String,
    pub paper_id: String,
    pub page_width: f64,
    pub page_height: f64,
    /// Always at least one frame once loaded from the database.
    pub frames: Vec<Frame>,
}

impl Template {
    pub fn new(
        brand: impl Into<String>,
        part: impl Into<String>,
        paper_id: impl Into<String>,
        page_width: f64,
        page_height: f64,
        frame: Frame,
    ) -> Self {
        Self {
            brand: brand.into(),
            part: part.into(),
            description: String::new(),
            paper_id: paper_id.into(),
            page_width,
            page_height,
            frames: vec![frame],
        }
    }

    /// `"brand part"`, the name templates are looked up by.
    pub fn name(&self) -> String {
        format!("{} {}", self.brand, self.part)
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frames.first()
    }
}

impl TemplateGeometry for Template {
    fn page_size(&self) -> (f64, f64) {
        (self.page_width, self.page_height)
    }

    fn frame_size(&self) -> (f64, f64) {
        self.frame().map(Frame::size).unwrap_or((0.0, 0.0))
    }

    fn label_count_per_sheet(&self) -> usize {
        self.frame().map(Frame::label_count).unwrap_or(0)
    }

    fn label_origins(&self) -> Vec<Origin> {
        self.frame().map(Frame::origins).unwrap_or_default()
    }

    fn layouts(&self) -> &[Layout] {
        self.frame()
            .map(|frame| frame.layouts.as_slice())
            .unwrap_or(&[])
    }

    fn outline(&self, rotate: bool, for_clipping: bool) -> Outline {
        match self.frame() {
            Some(frame) => frame.outline(rotate, for_clipping),
            None => Outline {
                shape: crate::frame::OutlineKind::Rect,
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            },
        }
    }
}
