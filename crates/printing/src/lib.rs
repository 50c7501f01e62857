//! Label printing: sheet pagination, decoration and output back ends.

pub mod controller;
pub mod display;
pub mod job;
pub mod pagination;
pub mod pdf;
pub mod platform;
pub mod preview;
pub mod print_op;
pub mod raster;
pub mod renderer;
pub mod sheet;

pub use controller::{run_print_job, PreviewConfig, PrintJobError, PrintJobResult};
pub use display::{
    glyph_positions, Color, DisplayCommand, GlyphRun, Matrix, Point, PrintDisplayList, Rectangle,
    Size, Stroke,
};
pub use job::{PrintJobId, PrintJobOptions, PrintMode};
pub use pagination::{
    merge_sheet_count, plan_collated_merge_sheet, plan_simple_sheet,
    plan_uncollated_merge_sheet, PrintState, SheetSlot,
};
pub use pdf::render_pdf_document;
pub use platform::{FileOnlyAdapter, PlatformAdapter, PlatformJobHandle, SpoolSheet};
pub use preview::{PreviewCache, PreviewEntry, PrintPreviewKey};
pub use print_op::PrintOperation;
pub use raster::{preview_dpi, render_preview_png, MAX_PREVIEW_PIXELS};
pub use renderer::LabelRenderer;
pub use sheet::{
    print_collated_merge_sheet, print_crop_marks, print_label, print_simple_sheet,
    print_uncollated_merge_sheet, TICK_LENGTH, TICK_OFFSET,
};
