//! Locating ffmpeg and ffprobe.
//!
//! A configured path wins when it exists; otherwise the tool is looked up on
//! `PATH` with [`which`].

use std::fmt;
use std::path::{Path, PathBuf};

use mfx_core::config::ToolsConfig;
use serde::Serialize;

/// The external tools MediaFX drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// The engine.
    Ffmpeg,
    /// The prober.
    Ffprobe,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Ffmpeg, Tool::Ffprobe];

    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }

    fn configured(self, config: &ToolsConfig) -> Option<&Path> {
        match self {
            Tool::Ffmpeg => config.ffmpeg_path.as_deref(),
            Tool::Ffprobe => config.ffprobe_path.as_deref(),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// One line of `mediafx check-tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub tool: Tool,
    pub path: Option<PathBuf>,
    /// First line of `<tool> -version`.
    pub version: Option<String>,
}

impl ToolInfo {
    pub fn available(&self) -> bool {
        self.path.is_some()
    }
}

/// Where each tool was found, if anywhere.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl ToolRegistry {
    pub fn discover(config: &ToolsConfig) -> Self {
        Self {
            ffmpeg: locate(Tool::Ffmpeg, config),
            ffprobe: locate(Tool::Ffprobe, config),
        }
    }

    /// Use the given executables as-is.
    pub fn with_paths(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: Some(ffmpeg.into()),
            ffprobe: Some(ffprobe.into()),
        }
    }

    pub fn get(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Ffmpeg => self.ffmpeg.as_deref(),
            Tool::Ffprobe => self.ffprobe.as_deref(),
        }
    }

    /// # Errors
    ///
    /// [`mfx_core::Error::Tool`] when discovery did not find `tool`.
    pub fn require(&self, tool: Tool) -> mfx_core::Result<&Path> {
        self.get(tool).ok_or_else(|| mfx_core::Error::Tool {
            tool: tool.to_string(),
            message: format!("{tool} not found; is it installed and in PATH?"),
        })
    }

    /// The discovered path, or the bare binary name so a missing tool
    /// surfaces as a spawn failure on first use.
    pub fn path_or_name(&self, tool: Tool) -> PathBuf {
        self.get(tool)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(tool.binary_name()))
    }

    /// Availability and version of every tool. Runs each found tool once.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        Tool::ALL
            .into_iter()
            .map(|tool| {
                let path = self.get(tool).map(Path::to_path_buf);
                let version = path.as_deref().and_then(version_line);
                ToolInfo {
                    tool,
                    path,
                    version,
                }
            })
            .collect()
    }
}

fn locate(tool: Tool, config: &ToolsConfig) -> Option<PathBuf> {
    let name = tool.binary_name();
    let found = match tool.configured(config) {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => {
            tracing::warn!(
                "configured {name} path {} does not exist; searching PATH",
                p.display()
            );
            which::which(name).ok()
        }
        None => which::which(name).ok(),
    };
    match &found {
        Some(path) => tracing::debug!("found {name} at {}", path.display()),
        None => tracing::debug!("{name} not found"),
    }
    found
}

fn version_line(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_does_not_panic_without_tools() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        assert_eq!(registry.check_all().len(), 2);
    }

    #[test]
    fn missing_tool_is_a_tool_error() {
        let err = ToolRegistry::default().require(Tool::Ffmpeg).unwrap_err();
        assert_eq!(err.kind(), mfx_core::ErrorKind::EngineExecutionError);
        assert!(err.to_string().contains("ffmpeg not found"));
    }

    #[test]
    fn empty_registry_reports_everything_missing() {
        let infos = ToolRegistry::default().check_all();
        let tools: Vec<Tool> = infos.iter().map(|i| i.tool).collect();
        assert_eq!(tools, Tool::ALL);
        assert!(infos.iter().all(|i| !i.available() && i.version.is_none()));
    }

    #[test]
    fn bare_name_when_not_found() {
        let registry = ToolRegistry::with_paths("/opt/ff/ffmpeg", "/opt/ff/ffprobe");
        assert_eq!(
            registry.require(Tool::Ffprobe).unwrap(),
            Path::new("/opt/ff/ffprobe")
        );
        assert_eq!(
            ToolRegistry::default().path_or_name(Tool::Ffmpeg),
            PathBuf::from("ffmpeg")
        );
    }

    #[test]
    fn missing_configured_path_falls_back_to_search() {
        let config = ToolsConfig {
            ffmpeg_path: Some(PathBuf::from("/definitely/not/here/ffmpeg")),
            ffprobe_path: None,
        };
        let registry = ToolRegistry::discover(&config);
        assert_ne!(
            registry.get(Tool::Ffmpeg),
            Some(Path::new("/definitely/not/here/ffmpeg"))
        );
    }
}
