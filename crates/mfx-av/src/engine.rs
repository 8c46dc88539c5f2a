//! The transcoding engine seam.
//!
//! Orchestrators talk to ffmpeg only through [`Engine`], so tests can swap in
//! a recording fake.

use std::path::PathBuf;

use async_trait::async_trait;
use mfx_graph::Invocation;

use crate::command::ToolCommand;

/// Runs one engine invocation at a time.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// Resolves on a clean exit. A non-zero exit yields
    /// [`mfx_core::Error::Tool`] whose message embeds the engine's stderr.
    /// Partially written outputs are left for the caller to remove.
    async fn run(&self, invocation: &Invocation) -> mfx_core::Result<()>;

    /// Raw output of the engine's version query.
    async fn version_output(&self) -> mfx_core::Result<String>;
}

/// [`Engine`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_path: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.ffmpeg_path
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    async fn run(&self, invocation: &Invocation) -> mfx_core::Result<()> {
        tracing::info!("ffmpeg -> {}", invocation.output().display());
        if let Some(graph) = invocation.graph() {
            tracing::debug!("filter graph: {}", graph.render());
        }

        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.args(invocation.to_args());
        tracing::debug!("{}", cmd.command_line());
        cmd.execute().await?;
        Ok(())
    }

    async fn version_output(&self) -> mfx_core::Result<String> {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.arg("-version");
        Ok(cmd.execute().await?.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn missing_binary_is_tool_error() {
        let engine = FfmpegEngine::new(PathBuf::from("/nonexistent/ffmpeg_xyz"));
        let inv = Invocation::new(Path::new("/tmp/out.mp4"));
        let err = engine.run(&inv).await.unwrap_err();
        assert_eq!(err.kind(), mfx_core::ErrorKind::EngineExecutionError);
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn version_query_of_missing_binary_fails() {
        let engine = FfmpegEngine::new(PathBuf::from("/nonexistent/ffmpeg_xyz"));
        assert!(engine.version_output().await.is_err());
    }
}
