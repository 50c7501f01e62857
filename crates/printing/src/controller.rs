use thiserror::Error;
use tracing::{debug, info};

use crate::display::PrintDisplayList;
use crate::job::{PrintJobOptions, PrintMode};
use crate::pdf::render_pdf_document;
use crate::platform::{PlatformAdapter, PlatformJobHandle, SpoolSheet};
use crate::preview::{PreviewCache, PrintPreviewKey};
use crate::print_op::PrintOperation;
use crate::raster::render_preview_png;
use crate::renderer::LabelRenderer;

/// Result produced after executing a print job.
/// 列印作業完成後所產生的結果。
#[derive(Debug, Clone)]
pub struct PrintJobResult {
    pub mode: PrintMode,
    pub n_sheets: usize,
    pub sheets: Vec<PrintDisplayList>,
    /// Empty when the job has no sheets.
    pub pdf_data: Vec<u8>,
}

/// Configuration for preview generation.
/// 建立預覽時所需的設定資訊。
#[derive(Debug)]
pub struct PreviewConfig<'a> {
    pub cache: &'a mut PreviewCache,
    pub zoom_levels: &'a [u32],
    pub base_dpi: u32,
}

/// Errors raised while running the print pipeline.
/// 列印管線執行時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum PrintJobError {
    #[error("preview rendering failed: {0}")]
    Preview(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("platform adapter failed: {0}")]
    Platform(String),
}

/// Executes the print pipeline end-to-end, producing previews, PDF, and spooled sheets.
/// 端到端執行列印管線，產生預覽、PDF 與待送佇列的頁面。
pub fn run_print_job<L, A>(
    label: &L,
    job_options: &PrintJobOptions,
    adapter: &A,
    preview: Option<PreviewConfig<'_>>,
) -> Result<PrintJobResult, PrintJobError>
where
    L: LabelRenderer + ?Sized,
    A: PlatformAdapter,
    A::Error: std::fmt::Display,
{
    let mut operation = PrintOperation::new(label, job_options.clone());
    let n_sheets = operation.begin();
    let mode = operation.mode();
    let sheets: Vec<PrintDisplayList> = (0..n_sheets)
        .map(|page| operation.draw_sheet(page))
        .collect();

    if sheets.is_empty() {
        info!(job = %job_options.job_id, "print job has no sheets");
        return Ok(PrintJobResult {
            mode,
            n_sheets,
            sheets,
            pdf_data: Vec::new(),
        });
    }

    let (page_width, page_height) = label.geometry().page_size();

    if let Some(mut preview_config) = preview {
        cache_previews(&mut preview_config, job_options, &sheets, page_width, page_height)
            .map_err(PrintJobError::Preview)?;
    }

    let pdf_data =
        render_pdf_document(&sheets, page_width, page_height).map_err(PrintJobError::Pdf)?;

    spool_sheets(adapter, job_options, &sheets).map_err(PrintJobError::Platform)?;

    debug!(
        job = %job_options.job_id,
        sheets = n_sheets,
        pdf_bytes = pdf_data.len(),
        "print job completed"
    );
    Ok(PrintJobResult {
        mode,
        n_sheets,
        sheets,
        pdf_data,
    })
}

fn cache_previews(
    config: &mut PreviewConfig<'_>,
    job_options: &PrintJobOptions,
    sheets: &[PrintDisplayList],
    page_width: f64,
    page_height: f64,
) -> Result<(), String> {
    for (index, sheet) in sheets.iter().enumerate() {
        let sheet_index = u32::try_from(index).map_err(|err| err.to_string())?;
        for zoom in config.zoom_levels {
            let entry =
                render_preview_png(sheet, page_width, page_height, *zoom, config.base_dpi)?;
            let key = PrintPreviewKey {
                job_id: job_options.job_id,
                sheet: sheet_index,
                zoom_percent: *zoom,
            };
            config.cache.insert(key, entry);
        }
    }
    Ok(())
}

fn spool_sheets<A>(
    adapter: &A,
    job_options: &PrintJobOptions,
    sheets: &[PrintDisplayList],
) -> Result<(), String>
where
    A: PlatformAdapter,
    A::Error: std::fmt::Display,
{
    let mut handle = adapter
        .begin_job(job_options)
        .map_err(|err| err.to_string())?;

    for (sheet, display_list) in sheets.iter().enumerate() {
        let submitted = handle.submit_sheet(SpoolSheet {
            job_id: job_options.job_id,
            sheet,
            display_list: display_list.clone(),
        });
        if let Err(err) = submitted {
            let reason = err.to_string();
            handle.abort(&reason);
            return Err(reason);
        }
    }

    handle.finish().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockPlatformAdapter;
    use rustlabels_core::Label;
    use rustlabels_merge::{MergeRecord, MergeSource};
    use rustlabels_template::TemplateDb;

    const TEMPLATES: &str = r#"<Glabels-templates>
  <Template brand="Test" part="2up" size="Other" width="200pt" height="100pt">
    <Label-rectangle id="0" width="90pt" height="80pt">
      <Layout nx="2" ny="1" x0="5pt" y0="10pt" dx="100pt" dy="0"/>
    </Label-rectangle>
  </Template>
</Glabels-templates>"#;

    fn label() -> Label {
        let db = TemplateDb::from_xml_str(TEMPLATES).expect("templates");
        Label::from_json(
            r#"{"template": "Test 2up", "objects": [{"type": "text", "x": 2, "y": 2, "text": "${name}"}]}"#,
            &db,
        )
        .expect("label")
    }

    #[test]
    fn merge_job_spools_every_sheet() {
        let mut label = label();
        label.set_merge(Some(MergeSource::from_records(vec![
            MergeRecord::from_pairs([("name", "Ada")]),
            MergeRecord::from_pairs([("name", "Grace")]),
            MergeRecord::from_pairs([("name", "Edsger")]),
        ])));
        let adapter = MockPlatformAdapter::new();
        let options = PrintJobOptions::new();

        let result = run_print_job(&label, &options, &adapter, None).expect("job");
        assert_eq!(result.n_sheets, 2);
        assert_eq!(result.mode, PrintMode::Uncollated);
        assert!(result.pdf_data.starts_with(b"%PDF"));

        let jobs = adapter.drain_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].sheets.len(), 2);
        assert_eq!(jobs[0].sheets[1].display_list.glyph_texts(), vec!["Edsger"]);
    }

    #[test]
    fn zero_sheet_job_spools_nothing() {
        let mut label = label();
        label.set_merge(Some(MergeSource::from_records(Vec::new())));
        let adapter = MockPlatformAdapter::new();

        let result = run_print_job(&label, &PrintJobOptions::new(), &adapter, None).expect("job");
        assert_eq!(result.n_sheets, 0);
        assert!(result.pdf_data.is_empty());
        assert!(result.sheets.is_empty());
        assert!(adapter.drain_jobs().is_empty());
    }

    #[test]
    fn previews_are_cached_per_sheet_and_zoom() {
        let label = label();
        let adapter = MockPlatformAdapter::new();
        let options = PrintJobOptions {
            n_sheets: 2,
            ..PrintJobOptions::new()
        };
        let mut cache = PreviewCache::with_capacity(8);
        let preview = PreviewConfig {
            cache: &mut cache,
            zoom_levels: &[50, 100],
            base_dpi: 72,
        };

        run_print_job(&label, &options, &adapter, Some(preview)).expect("job");
        assert_eq!(cache.len(), 4);
        let key = PrintPreviewKey {
            job_id: options.job_id,
            sheet: 1,
            zoom_percent: 100,
        };
        let entry = cache.get(&key).expect("preview");
        assert_eq!((entry.width_px, entry.height_px), (200, 100));
    }
}
