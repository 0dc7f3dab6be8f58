use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;

/// One year, in seconds (365.25 days).
pub const ONE_YEAR_SECS: u64 = 31_557_600;

/// How the files of one upload request are moved into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Move every file as soon as it has been received; failures do not
    /// affect the other files of the request.
    #[default]
    BestEffort,
    /// Receive every file first, then move them all. Any failure discards
    /// the files that were not moved yet.
    Atomic,
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best-effort" | "best_effort" | "besteffort" => Ok(Self::BestEffort),
            "atomic" => Ok(Self::Atomic),
            other => Err(format!("unknown commit mode '{}'", other)),
        }
    }
}

/// Options handed to the browser file-input widget.
///
/// Field names serialize to the widget's own option names.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub upload_url: String,
    pub language: String,
    pub theme: String,
    pub upload_async: bool,
    pub show_caption: bool,
    pub show_preview: bool,
    pub show_cancel: bool,
    pub show_upload: bool,
    pub show_remove: bool,
    pub min_file_count: u32,
    pub max_file_count: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            upload_url: "/upload".to_string(),
            language: "de".to_string(),
            theme: "explorer".to_string(),
            upload_async: false,
            show_caption: true,
            show_preview: true,
            show_cancel: true,
            show_upload: false,
            show_remove: false,
            min_file_count: 1,
            max_file_count: 5,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port (default: 80)
    pub port: u16,

    /// Directory receiving uploaded files (default: "upload")
    pub upload_dir: PathBuf,

    /// Directory for partially received files. Defaults to the upload
    /// directory so the final rename stays on one filesystem.
    pub temp_dir: Option<PathBuf>,

    /// Directory served as static content (default: "data")
    pub assets_dir: PathBuf,

    /// Maximum request body size in bytes (default: 200 MB)
    pub max_body_size: usize,

    /// Cache-Control max-age for static assets, in seconds (default: one year)
    pub cache_max_age: u64,

    pub commit_mode: CommitMode,

    pub widget: WidgetConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 80,
            upload_dir: PathBuf::from("upload"),
            temp_dir: None,
            assets_dir: PathBuf::from("data"),
            max_body_size: 200 * 1024 * 1024, // 200 MB
            cache_max_age: ONE_YEAR_SECS,
            commit_mode: CommitMode::BestEffort,
            widget: WidgetConfig::default(),
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v.to_lowercase() == "true" || v == "1")
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();
        let widget = default.widget.clone();

        let commit_mode = match env::var("UPLOAD_COMMIT_MODE") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to best-effort", e);
                CommitMode::BestEffort
            }),
            Err(_) => default.commit_mode,
        };

        Self {
            port: parsed("PORT").unwrap_or(default.port),

            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            temp_dir: env::var("UPLOAD_TEMP_DIR").ok().map(PathBuf::from),

            assets_dir: env::var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.assets_dir),

            max_body_size: parsed("MAX_BODY_SIZE").unwrap_or(default.max_body_size),

            cache_max_age: parsed("STATIC_CACHE_MAX_AGE").unwrap_or(default.cache_max_age),

            commit_mode,

            widget: WidgetConfig {
                language: env::var("WIDGET_LANGUAGE").unwrap_or(widget.language),
                theme: env::var("WIDGET_THEME").unwrap_or(widget.theme),
                upload_async: flag("WIDGET_UPLOAD_ASYNC").unwrap_or(widget.upload_async),
                min_file_count: parsed("WIDGET_MIN_FILES").unwrap_or(widget.min_file_count),
                max_file_count: parsed("WIDGET_MAX_FILES").unwrap_or(widget.max_file_count),
                ..widget
            },
        }
    }

    /// Configuration rooted in `base`, for tests and local runs.
    pub fn development(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            port: 3000,
            upload_dir: base.join("upload"),
            assets_dir: base.join("data"),
            ..Self::default()
        }
    }

    /// Where partially received files are written.
    pub fn staging_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.upload_dir.clone())
    }
}
