//! Input resolution: source descriptors to local temp files.
//!
//! URL sources are streamed to disk with HTTP GET; binary sources are copied
//! out of the work item's payloads. Every resolved file is owned by a
//! [`TempFile`] guard, so a failure part-way through a batch of sources
//! removes whatever was already written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::try_join_all;
use futures::StreamExt;
use mfx_core::{Error, PayloadContent, Payloads, SourceDescriptor};
use tokio::io::AsyncWriteExt;

use crate::temp::{release_all, CleanupOutcome, TempFile, TempStore};

const FALLBACK_EXTENSION: &str = ".tmp";

/// Local files for a list of sources, in the same order.
#[derive(Debug)]
pub struct ResolvedInputs {
    files: Vec<TempFile>,
}

impl ResolvedInputs {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(TempFile::path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove every resolved file. Individual failures are logged and do not
    /// stop the remaining deletions.
    pub fn release(&mut self) -> CleanupOutcome {
        release_all(&mut self.files)
    }
}

/// Turns [`SourceDescriptor`]s into files under a [`TempStore`].
#[derive(Debug, Clone)]
pub struct InputResolver {
    temp: TempStore,
    client: reqwest::Client,
}

impl InputResolver {
    pub fn new(temp: TempStore, http: &mfx_core::config::HttpConfig) -> mfx_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs.max(1)))
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { temp, client })
    }

    pub fn temp(&self) -> &TempStore {
        &self.temp
    }

    /// Resolve all sources concurrently.
    ///
    /// On error, files resolved so far are removed before returning.
    pub async fn resolve(
        &self,
        sources: &[SourceDescriptor],
        payloads: &Payloads,
    ) -> mfx_core::Result<ResolvedInputs> {
        let files = try_join_all(sources.iter().map(|s| self.resolve_one(s, payloads))).await?;
        Ok(ResolvedInputs { files })
    }

    /// Resolve a single source to an owned temp file.
    pub async fn resolve_one(
        &self,
        source: &SourceDescriptor,
        payloads: &Payloads,
    ) -> mfx_core::Result<TempFile> {
        match source {
            SourceDescriptor::Url { value } => self.download(value).await,
            SourceDescriptor::Binary { property } => self.materialize(property, payloads).await,
        }
    }

    async fn download(&self, url: &str) -> mfx_core::Result<TempFile> {
        let parsed = reqwest::Url::parse(url).map_err(|e| Error::resolution(url, e))?;
        let file = self.temp.allocate(&url_extension(&parsed))?;
        tracing::info!("downloading {url} -> {}", file.path().display());

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::resolution(url, e))?;

        let mut out = tokio::fs::File::create(file.path()).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::resolution(url, e))?;
            written += chunk.len() as u64;
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        tracing::debug!("downloaded {written} bytes from {url}");
        Ok(file)
    }

    async fn materialize(&self, property: &str, payloads: &Payloads) -> mfx_core::Result<TempFile> {
        let payload = payloads.get(property).ok_or_else(|| Error::MissingPayload {
            property: property.to_string(),
        })?;
        let ext = payload
            .extension()
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let file = self.temp.allocate(&ext)?;

        match &payload.content {
            PayloadContent::Bytes(bytes) => tokio::fs::write(file.path(), bytes).await?,
            PayloadContent::File(src) => {
                tokio::fs::copy(src, file.path())
                    .await
                    .map_err(|e| Error::resolution(property, format!("{}: {e}", src.display())))?;
            }
        }
        tracing::debug!("payload \"{property}\" -> {}", file.path().display());
        Ok(file)
    }
}

/// Extension (with dot) of the URL path's last segment.
fn url_extension(url: &reqwest::Url) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
