use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rustlabels_core::{open_merge, Label, LabelObject};
use rustlabels_merge::{backends, MergeRecord, MergeSource};
use rustlabels_printing::{
    run_print_job, FileOnlyAdapter, PreviewCache, PreviewConfig, PrintJobOptions,
    PrintOperation, PrintPreviewKey,
};
use rustlabels_settings::{Preferences, PreferencesStore};
use rustlabels_template::{TemplateDb, TemplateGeometry};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "rustlabels.json";

#[derive(Parser)]
#[command(
    name = "rustlabels-cli",
    about = "Print and inspect RustLabels label documents",
    author,
    version
)]
struct Cli {
    /// 偏好設定檔路徑；預設為 rustlabels.json。 / Preferences file (defaults to rustlabels.json).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 將標籤列印為 PDF。 / Print a label document to PDF.
    Print(PrintArgs),
    /// 列出可用的合併資料後端。 / List the available merge backends.
    Backends,
    /// 列出標籤合併資料的紀錄。 / List the merge records of a label.
    Records(RecordsArgs),
    /// 顯示文字物件展開後的內容。 / Show the expanded text objects of a label.
    Expand(ExpandArgs),
    /// 列出範本資料庫中的範本。 / List the templates of a template database.
    Templates(TemplatesArgs),
    /// 匯入/匯出偏好設定。 / Show, import or export preferences.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Args)]
struct LabelArgs {
    /// 標籤文件（JSON）。 / Label document (JSON).
    #[arg(value_name = "LABEL")]
    label: PathBuf,

    /// 範本資料庫（XML）。 / Template database (XML).
    #[arg(long, value_name = "XML")]
    templates: PathBuf,

    /// 以此檔案取代標籤的合併資料來源。 / Replace the label's merge source with this file.
    #[arg(long, value_name = "PATH")]
    merge_source: Option<String>,
}

#[derive(Args)]
struct PrintArgs {
    #[command(flatten)]
    label: LabelArgs,

    /// 輸出的 PDF 路徑；預設為標籤檔名加上 .pdf。 / Output PDF (defaults to the label path with a .pdf extension).
    #[arg(long, short, value_name = "PDF")]
    output: Option<PathBuf>,

    /// 無合併資料時列印的張數。 / Number of sheets when the label has no merge source.
    #[arg(long, default_value_t = 1)]
    sheets: usize,

    /// 第一張標籤的位置（從 1 開始）。 / First label slot, 1-based.
    #[arg(long, default_value_t = 1)]
    first: usize,

    /// 第一張紙的最後一個位置。 / Last label slot on the first sheet.
    #[arg(long)]
    last: Option<usize>,

    /// 每筆紀錄的份數。 / Copies of each merge record.
    #[arg(long)]
    copies: Option<u32>,

    /// 依紀錄分組列印。 / Print all copies of a record together.
    #[arg(long, conflicts_with = "no_collate")]
    collate: bool,

    /// 依份數輪流列印所有紀錄。 / Print one pass of every record per copy.
    #[arg(long)]
    no_collate: bool,

    /// 繪製標籤外框。 / Stroke each label outline.
    #[arg(long, conflicts_with = "no_outline")]
    outline: bool,

    /// 不繪製標籤外框。 / Do not stroke label outlines.
    #[arg(long)]
    no_outline: bool,

    /// 鏡像列印。 / Mirror each label horizontally.
    #[arg(long, conflicts_with = "no_reverse")]
    reverse: bool,

    /// 不鏡像列印。 / Print labels unmirrored.
    #[arg(long)]
    no_reverse: bool,

    /// 繪製裁切線。 / Draw crop marks around the label grid.
    #[arg(long, conflicts_with = "no_crop_marks")]
    crop_marks: bool,

    /// 不繪製裁切線。 / Do not draw crop marks.
    #[arg(long)]
    no_crop_marks: bool,

    /// 不列印的紀錄索引（從 0 開始）。 / Zero-based record index to leave out; repeatable.
    #[arg(long, value_name = "INDEX")]
    deselect: Vec<usize>,

    /// 輸出 PNG 預覽的資料夾。 / Directory for PNG sheet previews.
    #[arg(long, value_name = "DIR")]
    preview_dir: Option<PathBuf>,
}

#[derive(Args)]
struct RecordsArgs {
    #[command(flatten)]
    label: LabelArgs,
}

#[derive(Args)]
struct ExpandArgs {
    #[command(flatten)]
    label: LabelArgs,

    /// 使用的紀錄索引；略過時顯示 ${key} 佔位字串。 / Record index to expand with; fields show as ${key} placeholders when omitted.
    #[arg(long, value_name = "INDEX")]
    record: Option<usize>,
}

#[derive(Args)]
struct TemplatesArgs {
    /// 範本資料庫（XML）。 / Template database (XML).
    #[arg(long, value_name = "XML")]
    templates: PathBuf,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// 顯示目前偏好設定。 / Print the effective preferences as JSON.
    Show,
    /// 匯出目前偏好設定。 / Export current preferences.
    Export(PreferencesExportArgs),
    /// 匯入偏好設定 JSON。 / Import preferences from JSON.
    Import(PreferencesImportArgs),
}

#[derive(Args)]
struct PreferencesExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct PreferencesImportArgs {
    /// 輸入檔案路徑。 / Source preferences JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let Cli { config, command } = Cli::parse();
    let config = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    match command {
        Commands::Print(args) => {
            let store = load_store(&config)?;
            execute_print(args, store.preferences())
        }
        Commands::Backends => execute_backends(),
        Commands::Records(args) => {
            let store = load_store(&config)?;
            execute_records(args, store.preferences())
        }
        Commands::Expand(args) => {
            let store = load_store(&config)?;
            execute_expand(args, store.preferences())
        }
        Commands::Templates(args) => execute_templates(args),
        Commands::Preferences(subcommand) => execute_preferences_command(subcommand, &config),
    }
}

fn load_store(path: &Path) -> Result<PreferencesStore> {
    PreferencesStore::load(path)
        .with_context(|| format!("failed to load preferences from {}", path.display()))
}

fn load_templates(path: &Path) -> Result<TemplateDb> {
    TemplateDb::load(path)
        .with_context(|| format!("failed to load templates from {}", path.display()))
}

/// Loads the label and applies `--merge-source`, which reuses the label's
/// backend or falls back to the preferred one.
fn load_label(args: &LabelArgs, prefs: &Preferences) -> Result<Label> {
    let db = load_templates(&args.templates)?;
    let mut label = Label::load(&args.label, &db)
        .with_context(|| format!("failed to load label {}", args.label.display()))?;

    if let Some(source) = &args.merge_source {
        let backend = label
            .merge()
            .map(MergeSource::id)
            .unwrap_or(prefs.merge.default_backend.as_str())
            .to_string();
        let locator = prefs.merge.resolve_source(source);
        debug!(%backend, %locator, "overriding merge source");
        let merge = open_merge(&backend, Some(&locator))
            .with_context(|| format!("failed to open merge source '{locator}'"))?;
        label.set_merge(Some(merge));
    }

    if let Some(err) = label.merge().and_then(MergeSource::last_error) {
        warn!(error = %err, "merge source could not be read");
        eprintln!("Warning: {err}");
    }
    Ok(label)
}

fn execute_print(args: PrintArgs, prefs: &Preferences) -> Result<()> {
    let mut label = load_label(&args.label, prefs)?;

    if !args.deselect.is_empty() {
        let merge = label
            .merge_mut()
            .ok_or_else(|| anyhow!("--deselect requires a label with a merge source"))?;
        for index in &args.deselect {
            if !merge.set_selected(*index, false) {
                bail!(
                    "record {index} is out of range ({} records)",
                    merge.records().len()
                );
            }
        }
    }

    let mut options = PrintJobOptions::new();
    options.n_sheets = args.sheets;
    options.first = args.first;
    options.last = args.last;
    options.n_copies = args.copies.unwrap_or(prefs.print.copies) as usize;
    options.collate = flag_override(args.collate, args.no_collate, prefs.print.collate);
    options.outline = flag_override(args.outline, args.no_outline, prefs.print.outline);
    options.reverse = flag_override(args.reverse, args.no_reverse, prefs.print.reverse);
    options.crop_marks =
        flag_override(args.crop_marks, args.no_crop_marks, prefs.print.crop_marks);

    if options.n_copies == 0 {
        bail!("--copies must be at least 1");
    }

    let zoom_levels = prefs.print.zoom_levels.as_slice();
    let expected_sheets = PrintOperation::new(&label, options.clone()).begin();
    let mut cache = PreviewCache::with_capacity(expected_sheets * zoom_levels.len());
    let preview = args.preview_dir.as_ref().map(|_| PreviewConfig {
        cache: &mut cache,
        zoom_levels,
        base_dpi: prefs.print.preview_dpi,
    });

    let result = run_print_job(&label, &options, &FileOnlyAdapter, preview)
        .context("print job failed")?;

    if result.n_sheets == 0 {
        println!("Nothing to print: 0 sheets");
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.label.label.with_extension("pdf"));
    write_file(&output, &result.pdf_data)?;

    if let Some(dir) = &args.preview_dir {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let stem = args
            .label
            .label
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "label".to_string());
        for sheet in 0..result.n_sheets {
            for zoom in zoom_levels {
                let key = PrintPreviewKey {
                    job_id: options.job_id,
                    sheet: u32::try_from(sheet)?,
                    zoom_percent: *zoom,
                };
                let entry = cache
                    .get(&key)
                    .ok_or_else(|| anyhow!("missing preview for sheet {}", sheet + 1))?;
                let path = dir.join(format!("{stem}-{}-{zoom}.png", sheet + 1));
                write_file(&path, &entry.data)?;
            }
        }
    }

    let plural = if result.n_sheets == 1 { "" } else { "s" };
    println!(
        "Printed {} sheet{plural} ({} mode) to {}",
        result.n_sheets,
        result.mode,
        output.display()
    );
    Ok(())
}

/// `--flag` / `--no-flag` pair over a preference.
fn flag_override(on: bool, off: bool, preference: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        preference
    }
}

fn execute_backends() -> Result<()> {
    for info in backends() {
        println!("{}\t{}\t{}", info.id, info.src_type, info.description);
    }
    Ok(())
}

fn execute_records(args: RecordsArgs, prefs: &Preferences) -> Result<()> {
    let label = load_label(&args.label, prefs)?;
    let Some(merge) = label.merge() else {
        println!("Label has no merge source");
        return Ok(());
    };

    let primary = merge.primary_key();
    for (index, record) in merge.records().iter().enumerate() {
        let mark = if record.select_flag { 'x' } else { ' ' };
        println!("{index:>4} [{mark}] {}", record_summary(record, primary.as_deref()));
    }
    println!(
        "{} records, {} selected",
        merge.records().len(),
        merge.selected_count()
    );
    Ok(())
}

fn record_summary(record: &MergeRecord, primary: Option<&str>) -> String {
    primary
        .and_then(|key| record.get(key))
        .map(str::to_string)
        .unwrap_or_default()
}

fn execute_expand(args: ExpandArgs, prefs: &Preferences) -> Result<()> {
    let label = load_label(&args.label, prefs)?;
    let record = match args.record {
        Some(index) => Some(label.records().get(index).ok_or_else(|| {
            anyhow!(
                "record {index} is out of range ({} records)",
                label.records().len()
            )
        })?),
        None => None,
    };

    for object in label.objects() {
        if let LabelObject::Text(text) = object {
            println!("{}", text.text.expand(record));
        }
    }
    Ok(())
}

fn execute_templates(args: TemplatesArgs) -> Result<()> {
    let db = load_templates(&args.templates)?;
    for template in db.templates() {
        let (width, height) = template.page_size();
        println!(
            "{}\t{} labels\t{} ({}x{} pt)",
            template.name(),
            template.label_count_per_sheet(),
            template.paper_id,
            width,
            height
        );
    }
    Ok(())
}

fn execute_preferences_command(command: PreferencesCommand, config: &Path) -> Result<()> {
    match command {
        PreferencesCommand::Show => show_preferences(config),
        PreferencesCommand::Export(args) => export_preferences(args, config),
        PreferencesCommand::Import(args) => import_preferences(args, config),
    }
}

fn show_preferences(config: &Path) -> Result<()> {
    let store = load_store(config)?;
    let json = serde_json::to_string_pretty(store.preferences())
        .context("failed to serialize preferences")?;
    println!("{json}");
    Ok(())
}

fn export_preferences(args: PreferencesExportArgs, config: &Path) -> Result<()> {
    let store = load_store(config)?;
    store
        .export_to(&args.output)
        .with_context(|| format!("failed to export preferences to {}", args.output.display()))?;
    println!("Exported preferences to {}", args.output.display());
    Ok(())
}

fn import_preferences(args: PreferencesImportArgs, config: &Path) -> Result<()> {
    let mut store = load_store(config)?;
    if !args.input.exists() {
        bail!("preferences file '{}' does not exist", args.input.display());
    }
    store
        .import_from(&args.input)
        .with_context(|| format!("failed to import preferences from {}", args.input.display()))?;
    println!("Imported preferences from {}", args.input.display());
    Ok(())
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}
