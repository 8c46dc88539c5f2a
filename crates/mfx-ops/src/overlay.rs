//! Image stamps and picture-in-picture video overlays.

use mfx_core::{Error, Payloads, Result};
use mfx_graph::overlay::{build_stamp, build_video_overlay, StampOptions, VideoOverlayOptions};
use serde_json::json;

use crate::context::{extension_like, OpContext};
use crate::item::ItemOutput;
use crate::operation::{OverlayVideoParams, StampImageParams};

fn check_opacity(opacity: f64) -> Result<()> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(())
    } else {
        Err(Error::validation(format!("Opacity must be between 0 and 1, got {opacity}")))
    }
}

fn stamp_options(params: &StampImageParams) -> Result<StampOptions> {
    if let Some(opacity) = params.opacity {
        check_opacity(opacity)?;
    }
    let size = match (params.width, params.height) {
        (None, None) => None,
        (w, h) => Some((w.unwrap_or(-1), h.unwrap_or(-1))),
    };
    let coordinate = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("10")
            .to_string()
    };
    Ok(StampOptions {
        size,
        x: coordinate(&params.x),
        y: coordinate(&params.y),
        rotation_degrees: params.rotation,
        opacity: params.opacity,
        window: params.window(),
    })
}

pub async fn stamp_image(
    ctx: &OpContext,
    params: &StampImageParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "stampImage";
    let options = stamp_options(params)?;

    let sources = [params.source.clone(), params.image.clone()];
    let mut inputs = ctx.resolver.resolve(&sources, payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let (video, image) = (&paths[0], &paths[1]);
        let probe = ctx.prober.probe(video).await?;
        let output = ctx.output(&extension_like(video))?;
        let invocation = build_stamp(video, &probe, image, &options, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?))
}

pub async fn overlay_video(
    ctx: &OpContext,
    params: &OverlayVideoParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "overlayVideo";
    check_opacity(params.opacity)?;
    let options = VideoOverlayOptions {
        position: params.position.overlay_position(),
        size: params.size.overlay_size(),
        opacity: params.opacity,
        window: params.window(),
        audio: params.audio,
        main_volume: params.main_volume,
        overlay_volume: params.overlay_volume,
    };

    let sources = [params.source.clone(), params.overlay.clone()];
    let mut inputs = ctx.resolver.resolve(&sources, payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let (main, over) = (&paths[0], &paths[1]);
        let (main_probe, over_probe) =
            futures::try_join!(ctx.prober.probe(main), ctx.prober.probe(over))?;
        let output = ctx.output(&params.output_format)?;
        let invocation =
            build_video_overlay(main, &main_probe, over, &over_probe, &options, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?).with_fields(json!({
        "audio": params.audio,
    })))
}
