//! Single-input edits: trim, fade and still-image conversion.

use mfx_core::{Error, Payloads, Result};
use mfx_graph::edit::{fade, image_to_video as still_invocation, trim as trim_invocation};
use serde_json::json;

use crate::context::{extension_like, first_path, OpContext};
use crate::item::ItemOutput;
use crate::operation::{FadeParams, ImageToVideoParams, TrimParams};

pub async fn trim(ctx: &OpContext, params: &TrimParams, payloads: &Payloads) -> Result<ItemOutput> {
    const OPERATION: &str = "trim";
    if params.from < 0.0 || !(params.to > params.from) {
        return Err(Error::validation(format!(
            "Trim end time ({}) must be greater than start time ({}).",
            params.to, params.from
        )));
    }

    let mut inputs = ctx.resolver.resolve(std::slice::from_ref(&params.source), payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let source = first_path(&paths)?;
        let output = ctx.output(&extension_like(source))?;
        let invocation = trim_invocation(source, params.from, params.to, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?).with_fields(json!({
        "from": params.from,
        "to": params.to,
    })))
}

pub async fn single_video_fade(
    ctx: &OpContext,
    params: &FadeParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "singleVideoFade";
    if params.start_time < 0.0 || !(params.duration > 0.0) {
        return Err(Error::validation(
            "Fade start time must be non-negative and duration greater than zero.",
        ));
    }

    let mut inputs = ctx.resolver.resolve(std::slice::from_ref(&params.source), payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let source = first_path(&paths)?;
        let probe = ctx.prober.probe(source).await?;
        let output = ctx.output(&params.output_format)?;
        let invocation = fade(
            source,
            &probe,
            params.effect,
            params.start_time,
            params.duration,
            output.path(),
        )?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?).with_fields(json!({
        "effect": params.effect.as_str(),
    })))
}

pub async fn image_to_video(
    ctx: &OpContext,
    params: &ImageToVideoParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "imageToVideo";
    if !(params.duration > 0.0) {
        return Err(Error::validation("Video duration must be greater than zero."));
    }
    let size = match (params.width, params.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    };

    let mut inputs = ctx.resolver.resolve(std::slice::from_ref(&params.source), payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let source = first_path(&paths)?;
        let output = ctx.output(&params.output_format)?;
        let invocation = still_invocation(source, params.duration, size, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?).with_fields(json!({
        "duration": params.duration,
    })))
}
