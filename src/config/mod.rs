//! TOML configuration loading for the command-line tool.

use anyhow::{Context, Result};
use mfx_core::config::Config;
use std::path::{Path, PathBuf};

/// Locations searched, in order, when no `--config` is given.
const DEFAULT_PATHS: &[&str] = &["./mediafx.toml", "~/.config/mediafx/config.toml"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Expand `~` in every configured path.
fn expand_paths(config: &mut Config) {
    config.temp.base_dir = expand(&config.temp.base_dir);
    config.fonts.dir = expand(&config.fonts.dir);
    if let Some(p) = config.tools.ffmpeg_path.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.tools.ffprobe_path.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.batch.output_dir.as_mut() {
        *p = expand(p);
    }
}
