//! Services shared by every operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mfx_av::{
    CapabilityDetector, CleanupOutcome, Engine, FfmpegEngine, FfprobeProber, InputResolver,
    Prober, ResolvedInputs, TempFile, TempStore, Tool, ToolRegistry,
};
use mfx_core::config::Config;
use mfx_fonts::FontRegistry;
use mfx_graph::Invocation;

use crate::guidance;

/// Engine, prober, capability cache, resolver and fonts for one process.
///
/// Built once and passed by reference to every operation. The capability
/// detector inside caches the engine version for the context's lifetime.
pub struct OpContext {
    pub engine: Arc<dyn Engine>,
    pub prober: Arc<dyn Prober>,
    pub capabilities: Arc<CapabilityDetector>,
    pub resolver: InputResolver,
    pub fonts: Arc<FontRegistry>,
    /// Chance of sweeping stale temp files at the start of each item.
    pub sweep_probability: f64,
}

impl OpContext {
    pub fn new(
        engine: Arc<dyn Engine>,
        prober: Arc<dyn Prober>,
        resolver: InputResolver,
        fonts: Arc<FontRegistry>,
    ) -> Self {
        Self {
            capabilities: Arc::new(CapabilityDetector::new(engine.clone())),
            engine,
            prober,
            resolver,
            fonts,
            sweep_probability: 0.0,
        }
    }

    /// Wire up the ffmpeg-backed services described by `config`.
    pub fn from_config(config: &Config, tools: &ToolRegistry) -> mfx_core::Result<Self> {
        let engine = Arc::new(FfmpegEngine::new(tools.path_or_name(Tool::Ffmpeg)));
        let prober = Arc::new(FfprobeProber::new(tools.path_or_name(Tool::Ffprobe)));
        let resolver = InputResolver::new(TempStore::from_config(&config.temp), &config.http)?;
        let fonts = Arc::new(FontRegistry::new(&config.fonts));
        Ok(Self::new(engine, prober, resolver, fonts).with_sweep_probability(config.temp.sweep_probability))
    }

    pub fn with_sweep_probability(mut self, probability: f64) -> Self {
        self.sweep_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn temp(&self) -> &TempStore {
        self.resolver.temp()
    }

    /// Run one engine invocation, enriching failures with guidance.
    pub(crate) async fn run(&self, operation: &str, invocation: &Invocation) -> mfx_core::Result<()> {
        self.engine
            .run(invocation)
            .await
            .map_err(|e| guidance::enrich(operation, e))
    }

    /// Fresh output file; removed on drop unless kept.
    pub(crate) fn output(&self, extension: &str) -> mfx_core::Result<TempFile> {
        self.temp().allocate(extension)
    }

    /// Release resolved inputs, logging (not returning) failures.
    pub(crate) fn release(&self, operation: &str, inputs: &mut ResolvedInputs) -> CleanupOutcome {
        let outcome = inputs.release();
        if let CleanupOutcome::Failed(e) = &outcome {
            tracing::warn!("{operation}: input cleanup failed: {e}");
        }
        outcome
    }
}

/// Output extension matching an input's container; `.tmp` inputs become mp4.
pub(crate) fn extension_like(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext != "tmp" => ext.to_string(),
        _ => "mp4".to_string(),
    }
}

pub(crate) fn first_path(paths: &[PathBuf]) -> mfx_core::Result<&Path> {
    paths
        .first()
        .map(PathBuf::as_path)
        .ok_or_else(|| mfx_core::Error::Internal("no resolved input".into()))
}
