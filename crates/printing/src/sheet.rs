//! Sheet drawing: places labels into slots and decorates the sheet.
//! 整張紙的繪製：將標籤放入各位置並加上裁切標記與外框。

use rustlabels_merge::MergeRecord;
use rustlabels_template::TemplateGeometry;
use tracing::debug;

use crate::display::{Color, DisplayCommand, Point, PrintDisplayList, Stroke};
use crate::pagination::{
    plan_collated_merge_sheet, plan_simple_sheet, plan_uncollated_merge_sheet, PrintState,
    SheetSlot,
};
use crate::renderer::LabelRenderer;

/// Gap between the label grid and the start of a crop mark, in points.
pub const TICK_OFFSET: f64 = 2.25;
/// Length of a crop mark, in points.
pub const TICK_LENGTH: f64 = 18.0;

const OUTLINE_STROKE: Stroke = Stroke {
    width: 0.25,
    color: Color::BLACK,
};
const CROP_MARK_STROKE: Stroke = Stroke {
    width: 0.25,
    color: Color::BLACK,
};

/// Prints sheet `page` of a job without merge data.
///
/// Sheet 0 holds slots `first..=last`; later sheets are full.
#[allow(clippy::too_many_arguments)]
pub fn print_simple_sheet<L: LabelRenderer + ?Sized>(
    label: &L,
    ctx: &mut PrintDisplayList,
    page: usize,
    n_sheets: usize,
    first: usize,
    last: Option<usize>,
    outline: bool,
    reverse: bool,
    crop_marks: bool,
) {
    debug!(page, n_sheets, "printing simple sheet");
    let geometry = label.geometry();
    if crop_marks {
        print_crop_marks(geometry, ctx);
    }
    let slots = plan_simple_sheet(page, geometry.label_count_per_sheet(), first, last);
    print_slots(label, ctx, &slots, outline, reverse);
}

/// Prints sheet `page` of a collated merge job, advancing `state`.
///
/// `state` is reset on sheet 0 and must be left untouched between calls.
#[allow(clippy::too_many_arguments)]
pub fn print_collated_merge_sheet<L: LabelRenderer + ?Sized>(
    label: &L,
    ctx: &mut PrintDisplayList,
    page: usize,
    n_copies: usize,
    first: usize,
    outline: bool,
    reverse: bool,
    crop_marks: bool,
    state: &mut PrintState,
) {
    let geometry = label.geometry();
    if crop_marks {
        print_crop_marks(geometry, ctx);
    }
    let slots = plan_collated_merge_sheet(
        label.records(),
        page,
        geometry.label_count_per_sheet(),
        n_copies,
        first,
        state,
    );
    debug!(page, labels = slots.len(), ?state, "printed collated merge sheet");
    print_slots(label, ctx, &slots, outline, reverse);
}

/// Prints sheet `page` of an uncollated merge job, advancing `state`.
///
/// `state` is reset on sheet 0 and must be left untouched between calls.
#[allow(clippy::too_many_arguments)]
pub fn print_uncollated_merge_sheet<L: LabelRenderer + ?Sized>(
    label: &L,
    ctx: &mut PrintDisplayList,
    page: usize,
    n_copies: usize,
    first: usize,
    outline: bool,
    reverse: bool,
    crop_marks: bool,
    state: &mut PrintState,
) {
    let geometry = label.geometry();
    if crop_marks {
        print_crop_marks(geometry, ctx);
    }
    let slots = plan_uncollated_merge_sheet(
        label.records(),
        page,
        geometry.label_count_per_sheet(),
        n_copies,
        first,
        state,
    );
    debug!(page, labels = slots.len(), ?state, "printed uncollated merge sheet");
    print_slots(label, ctx, &slots, outline, reverse);
}

fn print_slots<L: LabelRenderer + ?Sized>(
    label: &L,
    ctx: &mut PrintDisplayList,
    slots: &[SheetSlot],
    outline: bool,
    reverse: bool,
) {
    let origins = label.geometry().label_origins();
    let records = label.records();
    for slot in slots {
        let Some(origin) = origins.get(slot.slot) else {
            continue;
        };
        let record = slot.record.and_then(|index| records.get(index));
        print_label(label, ctx, origin.x, origin.y, record, outline, reverse);
    }
}

/// Draws one label with its top-left corner at `(x, y)` on the sheet.
///
/// The label is clipped to its outline including waste. Rotation is applied
/// before mirroring; the optional outline is stroked unrotated on top.
pub fn print_label<L: LabelRenderer + ?Sized>(
    label: &L,
    ctx: &mut PrintDisplayList,
    x: f64,
    y: f64,
    record: Option<&MergeRecord>,
    outline: bool,
    reverse: bool,
) {
    let geometry = label.geometry();
    let (width, height) = label.size();

    ctx.save();
    ctx.translate(x, y);
    ctx.push(DisplayCommand::ClipOutline(geometry.outline(false, true)));

    ctx.save();
    if label.rotate() {
        ctx.rotate(90.0);
        ctx.translate(0.0, -height);
    }
    if reverse {
        ctx.translate(width, 0.0);
        ctx.scale(-1.0, 1.0);
    }
    label.draw(ctx, false, record);
    ctx.restore();

    if outline {
        ctx.push(DisplayCommand::StrokeOutline {
            outline: geometry.outline(false, false),
            stroke: OUTLINE_STROKE,
        });
    }
    ctx.restore();
}

/// Draws crop marks around every layout grid of the sheet, clamped to the
/// page.
pub fn print_crop_marks(geometry: &dyn TemplateGeometry, ctx: &mut PrintDisplayList) {
    let (page_w, page_h) = geometry.page_size();
    let (w, h) = geometry.frame_size();

    for layout in geometry.layouts() {
        if layout.nx == 0 || layout.ny == 0 {
            continue;
        }
        let xmin = layout.x0;
        let ymin = layout.y0;
        let xmax = layout.x0 + layout.dx * f64::from(layout.nx - 1) + w;
        let ymax = layout.y0 + layout.dy * f64::from(layout.ny - 1) + h;

        for ix in 0..layout.nx {
            let x1 = xmin + f64::from(ix) * layout.dx;
            let x2 = x1 + w;

            let y1 = (ymin - TICK_OFFSET).max(0.0);
            let y2 = (y1 - TICK_LENGTH).max(0.0);
            let y3 = (ymax + TICK_OFFSET).min(page_h);
            let y4 = (y3 + TICK_LENGTH).min(page_h);

            crop_tick(ctx, x1, y1, x1, y2);
            crop_tick(ctx, x2, y1, x2, y2);
            crop_tick(ctx, x1, y3, x1, y4);
            crop_tick(ctx, x2, y3, x2, y4);
        }

        for iy in 0..layout.ny {
            let y1 = ymin + f64::from(iy) * layout.dy;
            let y2 = y1 + h;

            let x1 = (xmin - TICK_OFFSET).max(0.0);
            let x2 = (x1 - TICK_LENGTH).max(0.0);
            let x3 = (xmax + TICK_OFFSET).min(page_w);
            let x4 = (x3 + TICK_LENGTH).min(page_w);

            crop_tick(ctx, x1, y1, x2, y1);
            crop_tick(ctx, x1, y2, x2, y2);
            crop_tick(ctx, x3, y1, x4, y1);
            crop_tick(ctx, x3, y2, x4, y2);
        }
    }
}

fn crop_tick(ctx: &mut PrintDisplayList, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.push(DisplayCommand::Line {
        start: Point::new(x1, y1),
        end: Point::new(x2, y2),
        stroke: CROP_MARK_STROKE,
    });
}
