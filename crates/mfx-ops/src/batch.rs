//! Dispatch of work items, one at a time.
//!
//! A batch runs its items sequentially. When an item fails the batch either
//! stops, reporting the failing index, or records an error-shaped result and
//! moves on, depending on `continue_on_fail`.

use mfx_core::{Error, ErrorKind, Result};
use serde::Serialize;

use crate::context::OpContext;
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::{audio, edit, fonts, merge, overlay, text, transition};

/// Run one work item.
pub async fn run_item(ctx: &OpContext, item: &WorkItem) -> Result<ItemOutput> {
    if let Some(report) = ctx.temp().maybe_sweep(ctx.sweep_probability) {
        tracing::debug!("swept {} stale temp files", report.removed);
    }
    tracing::info!("running {}", item.operation.name());

    let payloads = &item.payloads;
    match &item.operation {
        Operation::Merge(p) => merge::merge(ctx, p, payloads).await,
        Operation::Trim(p) => edit::trim(ctx, p, payloads).await,
        Operation::ExtractAudio(p) => audio::extract_audio(ctx, p, payloads).await,
        Operation::SeparateAudio(p) => audio::separate_audio(ctx, p, payloads).await,
        Operation::MixAudio(p) => audio::mix_audio(ctx, p, payloads).await,
        Operation::AddText(p) => text::add_text(ctx, p, payloads).await,
        Operation::AddSubtitle(p) => text::add_subtitle(ctx, p, payloads).await,
        Operation::StampImage(p) => overlay::stamp_image(ctx, p, payloads).await,
        Operation::OverlayVideo(p) => overlay::overlay_video(ctx, p, payloads).await,
        Operation::TransitionApply(p) => transition::transition_apply(ctx, p, payloads).await,
        Operation::SingleVideoFade(p) => edit::single_video_fade(ctx, p, payloads).await,
        Operation::ImageToVideo(p) => edit::image_to_video(ctx, p, payloads).await,
        Operation::ListFonts(p) => fonts::list_fonts(ctx, p),
        Operation::UploadFont(p) => fonts::upload_font(ctx, p, payloads).await,
        Operation::DeleteFont(p) => fonts::delete_font(ctx, p),
        Operation::ValidateFontKey(p) => fonts::validate_font_key(ctx, p),
        Operation::FontInfo(p) => fonts::font_info(ctx, p),
    }
}

/// Result recorded for a failed item when the batch continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub error: String,
    pub kind: ErrorKind,
    pub operation: String,
}

impl ErrorRecord {
    pub fn new(operation: &str, err: &Error) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
            operation: operation.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemResult {
    Success(ItemOutput),
    Failure(ErrorRecord),
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A batch stopped at its first failing item.
#[derive(Debug, thiserror::Error)]
#[error("item {index} ({operation}) failed: {source}")]
pub struct BatchAborted {
    pub index: usize,
    pub operation: String,
    #[source]
    pub source: Error,
    /// Results of the items before `index`.
    pub completed: Vec<ItemResult>,
}

/// Run `items` in order.
pub async fn run_batch(
    ctx: &OpContext,
    items: &[WorkItem],
    continue_on_fail: bool,
) -> std::result::Result<Vec<ItemResult>, BatchAborted> {
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let operation = item.operation.name();
        match run_item(ctx, item).await {
            Ok(output) => results.push(ItemResult::Success(output)),
            Err(err) if continue_on_fail => {
                tracing::warn!("item {index} ({operation}) failed, continuing: {err}");
                results.push(ItemResult::Failure(ErrorRecord::new(operation, &err)));
            }
            Err(err) => {
                tracing::error!("item {index} ({operation}) failed: {err}");
                return Err(BatchAborted {
                    index,
                    operation: operation.to_string(),
                    source: err,
                    completed: results,
                });
            }
        }
    }
    Ok(results)
}
