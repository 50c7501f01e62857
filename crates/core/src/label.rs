//! Label document: template reference, merge configuration and objects.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustlabels_merge::{create, MergeError, MergeRecord, MergeSource, SourceType, STDIN_LOCATOR};
use rustlabels_template::{Template, TemplateDb, TemplateError, TemplateGeometry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::text_node::TextDocument;

/// Errors raised while loading a label document.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read label file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse label file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid label document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// 8-bit RGBA colour written as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| format!("colour '{value}' must start with '#'"))?;
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(format!("colour '{value}' must have 6 or 8 hex digits"));
        }
        let channel = |index: usize| {
            u8::from_str_radix(&hex[index..index + 2], 16)
                .map_err(|_| format!("colour '{value}' has invalid hex digits"))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

fn default_font_family() -> String {
    "Sans".to_string()
}

fn default_font_size() -> f64 {
    10.0
}

fn default_line_spacing() -> f64 {
    1.0
}

fn default_line_width() -> f64 {
    1.0
}

/// Text object; `text` holds the serialised field document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f64,
    pub text: TextDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxObject {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
}

/// Objects placed on a label, positions in points from the label's top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LabelObject {
    Text(TextObject),
    Box(BoxObject),
}

/// Merge configuration stored in a label file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSpec {
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// On-disk label document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFile {
    pub template: String,
    #[serde(default)]
    pub rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeSpec>,
    #[serde(default)]
    pub objects: Vec<LabelObject>,
}

/// A label bound to its template and, optionally, an opened merge source.
#[derive(Debug, Clone)]
pub struct Label {
    template: Template,
    rotate: bool,
    merge: Option<MergeSource>,
    objects: Vec<LabelObject>,
}

impl Label {
    pub fn new(template: Template, rotate: bool, objects: Vec<LabelObject>) -> Self {
        Self {
            template,
            rotate,
            merge: None,
            objects,
        }
    }

    /// Loads a label file, resolving its template in `db` and opening its
    /// merge source. Relative source paths are taken from the label's folder.
    pub fn load(path: impl AsRef<Path>, db: &TemplateDb) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: LabelFile = serde_json::from_str(&text).map_err(|source| LabelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file, db, path.parent())
    }

    pub fn from_json(json: &str, db: &TemplateDb) -> Result<Self, LabelError> {
        let file: LabelFile = serde_json::from_str(json)?;
        Self::from_file(file, db, None)
    }

    pub fn from_file(
        file: LabelFile,
        db: &TemplateDb,
        base_dir: Option<&Path>,
    ) -> Result<Self, LabelError> {
        let template = db.get(&file.template)?.clone();
        let mut label = Self::new(template, file.rotate, file.objects);
        if let Some(spec) = &file.merge {
            let locator = spec
                .source
                .as_deref()
                .map(|source| resolve_locator(source, base_dir));
            label.set_merge(Some(open_merge(&spec.backend, locator.as_deref())?));
        }
        debug!(
            template = %label.template.name(),
            objects = label.objects.len(),
            records = label.records().len(),
            "label loaded"
        );
        Ok(label)
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn rotate(&self) -> bool {
        self.rotate
    }

    pub fn set_rotate(&mut self, rotate: bool) {
        self.rotate = rotate;
    }

    /// Label width and height as drawn, after rotation.
    pub fn size(&self) -> (f64, f64) {
        let (w, h) = self.template.frame_size();
        if self.rotate {
            (h, w)
        } else {
            (w, h)
        }
    }

    pub fn objects(&self) -> &[LabelObject] {
        &self.objects
    }

    pub fn push_object(&mut self, object: LabelObject) {
        self.objects.push(object);
    }

    pub fn merge(&self) -> Option<&MergeSource> {
        self.merge.as_ref()
    }

    pub fn merge_mut(&mut self) -> Option<&mut MergeSource> {
        self.merge.as_mut()
    }

    pub fn set_merge(&mut self, merge: Option<MergeSource>) {
        self.merge = merge;
    }

    /// Records of the merge source; empty for a label without merge.
    pub fn records(&self) -> &[MergeRecord] {
        self.merge.as_ref().map(MergeSource::records).unwrap_or(&[])
    }
}

/// Creates a source for `backend`, points it at `locator` and opens it.
/// Open failures leave the source with zero records.
pub fn open_merge(backend: &str, locator: Option<&str>) -> Result<MergeSource, MergeError> {
    let mut source = create(backend)?;
    if let Some(locator) = locator {
        if source.source_type() == SourceType::File {
            source.set_source_locator(locator);
        }
    }
    source.open();
    source.close();
    Ok(source)
}

fn resolve_locator(source: &str, base_dir: Option<&Path>) -> String {
    let path = Path::new(source);
    match base_dir {
        Some(base) if source != STDIN_LOCATOR && path.is_relative() => {
            base.join(path).to_string_lossy().into_owned()
        }
        _ => source.to_string(),
    }
}
