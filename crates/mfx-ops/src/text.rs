//! Burned-in text: a single caption or a SubRip subtitle track.

use std::path::PathBuf;

use mfx_core::{Error, Payloads, Result};
use mfx_graph::subtitle::parse_srt;
use mfx_graph::text::{build_text_overlay, TextStyle, TimedText};
use serde_json::json;

use crate::context::{extension_like, first_path, OpContext};
use crate::item::ItemOutput;
use crate::operation::{AddSubtitleParams, AddTextParams, TextStyleParams};

const TEXT_DEFAULT_Y: &str = "h-th-10";
const SUBTITLE_DEFAULT_Y: &str = "h-th-50";

/// Font file for `style.font_key`, checked before any input is fetched.
fn font_file(ctx: &OpContext, style: &TextStyleParams) -> Result<PathBuf> {
    ctx.fonts.resolve(&style.font_key).map_err(|_| {
        Error::validation(format!(
            "Selected font key '{}' is not valid or its file path is missing.",
            style.font_key
        ))
    })
}

fn check_style(style: &TextStyleParams) -> Result<()> {
    if style.size == 0 {
        return Err(Error::validation("Font size must be greater than zero."));
    }
    if style.color.trim().is_empty() {
        return Err(Error::validation("Font color must not be empty."));
    }
    Ok(())
}

pub async fn add_text(ctx: &OpContext, params: &AddTextParams, payloads: &Payloads) -> Result<ItemOutput> {
    const OPERATION: &str = "addText";
    if params.text.is_empty() {
        return Err(Error::validation("Text to add must not be empty."));
    }
    check_style(&params.style)?;
    let style = TextStyle {
        font_file: font_file(ctx, &params.style)?,
        size: params.style.size,
        color: params.style.color.clone(),
        position: params.style.position.text_position(TEXT_DEFAULT_Y),
        boxed: false,
    };
    let entry = TimedText {
        text: params.text.clone(),
        start: params.start_time,
        end: params.end_time,
    };

    let mut inputs = ctx.resolver.resolve(std::slice::from_ref(&params.source), payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let source = first_path(&paths)?;
        let output = ctx.output(&extension_like(source))?;
        let invocation = build_text_overlay(source, std::slice::from_ref(&entry), &style, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?))
}

pub async fn add_subtitle(
    ctx: &OpContext,
    params: &AddSubtitleParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "addSubtitle";
    check_style(&params.style)?;
    let style = TextStyle {
        font_file: font_file(ctx, &params.style)?,
        size: params.style.size,
        color: params.style.color.clone(),
        position: params.style.position.text_position(SUBTITLE_DEFAULT_Y),
        boxed: true,
    };

    let sources = [params.source.clone(), params.subtitle.clone()];
    let mut inputs = ctx.resolver.resolve(&sources, payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let (video, subtitle) = (&paths[0], &paths[1]);
        let raw = tokio::fs::read(subtitle).await?;
        let entries: Vec<TimedText> = parse_srt(&String::from_utf8_lossy(&raw))?
            .iter()
            .map(TimedText::from)
            .collect();
        tracing::debug!("burning {} subtitle entries", entries.len());

        let output = ctx.output(&extension_like(video))?;
        let invocation = build_text_overlay(video, &entries, &style, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>((output.keep(), entries.len()))
    }
    .await;
    ctx.release(OPERATION, &mut inputs);

    let (output, count) = result?;
    Ok(ItemOutput::media(OPERATION, output).with_fields(json!({ "entries": count })))
}
