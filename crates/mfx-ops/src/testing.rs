//! In-process engine and prober fakes for operation tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mfx_av::{Engine, InputResolver, Prober, TempStore};
use mfx_core::config::{FontsConfig, HttpConfig};
use mfx_core::{BinaryPayload, Error, MediaProbe, Result, VideoGeometry};
use mfx_fonts::FontRegistry;
use mfx_graph::Invocation;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::context::OpContext;

pub const MODERN_VERSION: &str = "ffmpeg version 6.1.1 Copyright (c) 2000-2023";
pub const OLD_VERSION: &str = "ffmpeg version 4.2.7-0ubuntu0.1 Copyright (c) 2000-2022";

/// Records every invocation and writes a placeholder output file.
pub struct FakeEngine {
    version: String,
    /// Fail the run whose zero-based index matches.
    fail_on: Option<usize>,
    pub runs: Mutex<Vec<Invocation>>,
}

impl FakeEngine {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            fail_on: None,
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, run: usize) -> Self {
        self.fail_on = Some(run);
        self
    }

    pub fn runs(&self) -> Vec<Invocation> {
        self.runs.lock().clone()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        let index = {
            let mut runs = self.runs.lock();
            runs.push(invocation.clone());
            runs.len() - 1
        };
        // Partial output, as a real engine leaves behind when it dies.
        std::fs::write(invocation.output(), b"partial")?;
        if self.fail_on == Some(index) {
            return Err(Error::tool(
                "ffmpeg",
                "exited with status 1: No such filter: 'xfade'",
            ));
        }
        Ok(())
    }

    async fn version_output(&self) -> Result<String> {
        Ok(self.version.clone())
    }
}

/// Reads a JSON-encoded [`MediaProbe`] from the probed file itself.
pub struct FakeProber;

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, path: &Path) -> Result<MediaProbe> {
        let raw = tokio::fs::read(path).await?;
        serde_json::from_slice(&raw)
            .map_err(|e| Error::Probe(format!("{}: {e}", path.display())))
    }
}

pub fn clip(width: u32, height: u32, duration: f64, has_audio: bool) -> MediaProbe {
    MediaProbe {
        duration,
        has_audio,
        video: Some(VideoGeometry {
            width,
            height,
            sample_aspect_ratio: "1:1".into(),
            frame_rate: "30/1".into(),
        }),
    }
}

pub fn audio_only(duration: f64) -> MediaProbe {
    MediaProbe {
        duration,
        has_audio: true,
        video: None,
    }
}

/// A binary payload the fake prober will describe as `probe`.
pub fn payload(name: &str, probe: &MediaProbe) -> BinaryPayload {
    let bytes = serde_json::to_vec(probe).expect("probe serializes");
    BinaryPayload::from_bytes(bytes, Some(name.to_string()))
}

pub struct Harness {
    pub ctx: OpContext,
    pub engine: Arc<FakeEngine>,
    pub temp_dir: TempDir,
    pub font_dir: TempDir,
}

impl Harness {
    pub fn new(engine: FakeEngine) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let font_dir = TempDir::new().expect("font dir");
        std::fs::write(font_dir.path().join("NotoSansKR-Regular.ttf"), b"font").expect("font");

        let engine = Arc::new(engine);
        let temp = TempStore::new(temp_dir.path(), std::time::Duration::from_secs(3600));
        let resolver = InputResolver::new(temp, &HttpConfig::default()).expect("resolver");
        let fonts = Arc::new(FontRegistry::new(&FontsConfig {
            dir: font_dir.path().to_path_buf(),
        }));
        let ctx = OpContext::new(engine.clone(), Arc::new(FakeProber), resolver, fonts);
        Self {
            ctx,
            engine,
            temp_dir,
            font_dir,
        }
    }

    /// Files left in the temp directory.
    pub fn leftovers(&self) -> Vec<String> {
        std::fs::read_dir(self.temp_dir.path())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
