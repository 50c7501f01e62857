use rustlabels_merge::find_backend;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const PREFERENCES_VERSION: u32 = 1;
const MAX_COPIES: u32 = 9999;
const ZOOM_RANGE: std::ops::RangeInclusive<u32> = 10..=800;
const DPI_RANGE: std::ops::RangeInclusive<u32> = 36..=600;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 使用者偏好設定。 / Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub print: PrintPreferences,
    #[serde(default)]
    pub merge: MergePreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            print: PrintPreferences::default(),
            merge: MergePreferences::default(),
        }
    }
}

impl Preferences {
    /// Replaces out-of-range values with defaults and upgrades old versions.
    pub fn sanitize(&mut self) {
        if self.version < PREFERENCES_VERSION {
            debug!(from = self.version, to = PREFERENCES_VERSION, "upgrading preferences");
            self.version = PREFERENCES_VERSION;
        }
        self.print.sanitize();
        self.merge.sanitize();
    }
}

/// 列印預設值。 / Defaults for print jobs and previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintPreferences {
    #[serde(default)]
    pub outline: bool,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub crop_marks: bool,
    #[serde(default = "default_true")]
    pub collate: bool,
    #[serde(default = "default_copies")]
    pub copies: u32,
    /// Preview zoom levels in percent, ascending.
    #[serde(default = "default_zoom_levels")]
    pub zoom_levels: Vec<u32>,
    #[serde(default = "default_preview_dpi")]
    pub preview_dpi: u32,
}

fn default_true() -> bool {
    true
}

fn default_copies() -> u32 {
    1
}

fn default_zoom_levels() -> Vec<u32> {
    vec![100]
}

fn default_preview_dpi() -> u32 {
    96
}

impl Default for PrintPreferences {
    fn default() -> Self {
        Self {
            outline: false,
            reverse: false,
            crop_marks: false,
            collate: true,
            copies: default_copies(),
            zoom_levels: default_zoom_levels(),
            preview_dpi: default_preview_dpi(),
        }
    }
}

impl PrintPreferences {
    fn sanitize(&mut self) {
        self.copies = self.copies.clamp(1, MAX_COPIES);
        self.zoom_levels.retain(|zoom| ZOOM_RANGE.contains(zoom));
        self.zoom_levels.sort_unstable();
        self.zoom_levels.dedup();
        if self.zoom_levels.is_empty() {
            self.zoom_levels = default_zoom_levels();
        }
        if !DPI_RANGE.contains(&self.preview_dpi) {
            self.preview_dpi = default_preview_dpi();
        }
    }
}

/// 合併資料預設值。 / Defaults for merge sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePreferences {
    /// Backend used when a label names a source file but no backend.
    #[serde(default = "default_backend")]
    pub default_backend: String,
    /// Directory that relative merge source paths are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_directory: Option<PathBuf>,
}

fn default_backend() -> String {
    "Text/Comma/Line1Keys".to_string()
}

impl Default for MergePreferences {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            last_directory: None,
        }
    }
}

impl MergePreferences {
    fn sanitize(&mut self) {
        if find_backend(self.default_backend.trim()).is_none() {
            if !self.default_backend.trim().is_empty() {
                warn!(backend = %self.default_backend, "unknown merge backend in preferences");
            }
            self.default_backend = default_backend();
        }
        if matches!(&self.last_directory, Some(dir) if dir.as_os_str().is_empty()) {
            self.last_directory = None;
        }
    }

    /// Resolves a merge source path against `last_directory`.
    pub fn resolve_source(&self, source: &str) -> String {
        let path = Path::new(source);
        match &self.last_directory {
            Some(dir) if source != "-" && path.is_relative() => {
                dir.join(path).to_string_lossy().into_owned()
            }
            _ => source.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    /// Loads preferences from `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!(path = %path.display(), "preferences not found, using defaults");
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }
        let data = read_preferences(&path)?;
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.data
    }

    pub fn update<F>(&mut self, op: F) -> Result<(), PreferencesError>
    where
        F: FnOnce(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    /// Writes the preferences through a temporary file and a rename.
    pub fn save(&self) -> Result<(), PreferencesError> {
        let tmp_path = self.path.with_extension("tmp");
        write_json(&tmp_path, &self.data)?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), PreferencesError> {
        write_json(path.as_ref(), &self.data)
    }

    /// Replaces the current preferences with those in `source`, keeping the
    /// previous file as `.bak`.
    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let data = read_preferences(source.as_ref())?;
        self.backup_existing()?;
        self.data = data;
        self.save()
    }

    fn backup_existing(&self) -> Result<(), PreferencesError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| PreferencesError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

fn read_preferences(path: &Path) -> Result<Preferences, PreferencesError> {
    let mut data: Preferences = read_json(path)?;
    data.sanitize();
    Ok(data)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PreferencesError> {
    let contents = fs::read_to_string(path).map_err(|source| PreferencesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PreferencesError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let payload =
        serde_json::to_string_pretty(value).map_err(|source| PreferencesError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
        path: path.to_path_buf(),
        source,
    })
}
