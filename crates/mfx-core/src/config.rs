//! Application configuration types.
//!
//! The top-level [`Config`] struct carries the tool, temp, font, HTTP and
//! batch sections. Every section defaults sensibly so an empty document is
//! valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub temp: TempConfig,
    pub fonts: FontsConfig,
    pub http: HttpConfig,
    pub batch: BatchConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a JSON file path, falling back to defaults if
    /// the path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(0.0..=1.0).contains(&self.temp.sweep_probability) {
            warnings.push(format!(
                "temp.sweep_probability {} is outside [0, 1]; it will be clamped",
                self.temp.sweep_probability
            ));
        }

        if self.temp.max_age_hours == 0 {
            warnings.push(
                "temp.max_age_hours is 0; every sweep will remove all temp files".into(),
            );
        }

        if self.http.timeout_secs == 0 {
            warnings.push("http.timeout_secs is 0; URL downloads will fail immediately".into());
        }

        for (name, path) in [
            ("tools.ffmpeg_path", &self.tools.ffmpeg_path),
            ("tools.ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        if !self.fonts.dir.exists() {
            warnings.push(format!(
                "fonts.dir {} does not exist; no system fonts will be available",
                self.fonts.dir.display()
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Optional explicit paths to the external tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Temp-file working directory and sweep policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempConfig {
    pub base_dir: PathBuf,
    /// Files older than this are removed by a sweep.
    pub max_age_hours: u64,
    /// Chance that a top-level call triggers an opportunistic sweep.
    pub sweep_probability: f64,
}

impl Default for TempConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::temp_dir().join("mediafx"),
            max_age_hours: 24,
            sweep_probability: 0.1,
        }
    }
}

/// Font directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// Directory holding the system font files. User uploads live in
    /// `<dir>/user`.
    pub dir: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("fonts"),
        }
    }
}

impl FontsConfig {
    /// Directory for user-uploaded fonts.
    pub fn user_dir(&self) -> PathBuf {
        self.dir.join("user")
    }

    /// Path of the user-font JSON index.
    pub fn user_index(&self) -> PathBuf {
        self.user_dir().join("user-fonts.json")
    }
}

/// Settings for URL source downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            user_agent: format!("mediafx/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Batch execution defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Emit an error record per failing item instead of aborting the batch.
    pub continue_on_fail: bool,
    /// Where binary results are placed. Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
}
