//! Concatenate clips of differing geometry.
//!
//! Each input is re-encoded to the geometry of the first valid video input
//! in a stream-copyable intermediate container, then the intermediates are
//! joined with stream copy. Inputs without audio get a silent track so every
//! intermediate carries the same stream layout.

use std::path::PathBuf;

use mfx_av::probe_all;
use mfx_av::temp::release_all;
use mfx_core::{Error, Payloads, Result};
use mfx_graph::merge::{join_invocation, normalize_invocation, reference_geometry, INTERMEDIATE_EXT};

use crate::context::OpContext;
use crate::item::ItemOutput;
use crate::operation::MergeParams;

const OPERATION: &str = "merge";

pub async fn merge(ctx: &OpContext, params: &MergeParams, payloads: &Payloads) -> Result<ItemOutput> {
    if params.sources.is_empty() {
        return Err(Error::validation("Merge operation requires at least one source."));
    }
    let mut inputs = ctx.resolver.resolve(&params.sources, payloads).await?;
    let result = merge_files(ctx, &inputs.paths(), &params.output_format).await;
    ctx.release(OPERATION, &mut inputs);
    let output = result?;
    Ok(ItemOutput::media(OPERATION, output).with_fields(serde_json::json!({
        "clips": params.sources.len(),
    })))
}

/// Merge already-local files into a fresh output with extension `format`.
pub async fn merge_files(ctx: &OpContext, clips: &[PathBuf], format: &str) -> Result<PathBuf> {
    let probes = probe_all(ctx.prober.as_ref(), clips).await?;
    let reference = reference_geometry(&probes)
        .ok_or_else(|| Error::validation("No merge source contains a video stream with valid dimensions."))?
        .clone();
    tracing::info!(
        "merging {} clips at {}x{}",
        clips.len(),
        reference.width,
        reference.height
    );

    let mut parts = Vec::with_capacity(clips.len());
    for (clip, probe) in clips.iter().zip(&probes) {
        let part = ctx.output(INTERMEDIATE_EXT)?;
        let invocation = normalize_invocation(clip, probe, &reference, part.path())?;
        parts.push(part);
        ctx.run(OPERATION, &invocation).await?;
    }

    let output = ctx.output(format)?;
    let part_paths: Vec<PathBuf> = parts.iter().map(|p| p.path().to_path_buf()).collect();
    let invocation = join_invocation(&part_paths, output.path())?;
    let joined = ctx.run(OPERATION, &invocation).await;

    let cleanup = release_all(&mut parts);
    if cleanup.is_failure() {
        tracing::warn!("merge: intermediate cleanup failed: {cleanup:?}");
    }
    joined?;
    Ok(output.keep())
}
