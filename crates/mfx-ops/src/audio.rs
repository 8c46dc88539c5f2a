//! Audio operations: mixing a second track in, extracting and separating.

use std::path::Path;

use mfx_core::{Error, Payloads, Result};
use mfx_graph::audio::{build_mix, MixRequest, PartialMix};
use mfx_graph::edit::{extract_audio as extract_invocation, mute_video};
use serde_json::json;

use crate::context::{extension_like, first_path, OpContext};
use crate::item::ItemOutput;
use crate::operation::{ExtractAudioParams, MixAudioParams, PartialMixParams, SeparateAudioParams};

fn check_volume(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::validation(format!("{name} must be a non-negative number, got {value}")))
    }
}

impl From<&PartialMixParams> for PartialMix {
    fn from(p: &PartialMixParams) -> Self {
        Self {
            start: p.start_time.max(0.0),
            duration: p.duration.filter(|d| *d > 0.0),
            looped: p.looped,
            fade_in: p.enable_fade_in.then_some(p.fade_in_duration),
            fade_out: p.enable_fade_out.then_some(p.fade_out_duration),
        }
    }
}

pub async fn mix_audio(ctx: &OpContext, params: &MixAudioParams, payloads: &Payloads) -> Result<ItemOutput> {
    const OPERATION: &str = "mixAudio";
    check_volume("videoVolume", params.video_volume)?;
    check_volume("audioVolume", params.audio_volume)?;

    let sources = [params.video.clone(), params.audio.clone()];
    let mut inputs = ctx.resolver.resolve(&sources, payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let (video, audio) = (&paths[0], &paths[1]);
        let (video_probe, audio_probe) =
            futures::try_join!(ctx.prober.probe(video), ctx.prober.probe(audio))?;

        let request = MixRequest {
            video_volume: params.video_volume,
            audio_volume: params.audio_volume,
            end: params.match_length,
            partial: params.partial.as_ref().map(PartialMix::from),
        };
        let output = ctx.output(&extension_like(video))?;
        let invocation = build_mix(video, &video_probe, audio, &audio_probe, &request, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);

    let fields = json!({
        "matchLength": params.match_length.as_str(),
        "partial": params.partial.is_some(),
    });
    Ok(ItemOutput::media(OPERATION, result?).with_fields(fields))
}

pub async fn extract_audio(
    ctx: &OpContext,
    params: &ExtractAudioParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "extractAudio";
    let mut inputs = ctx.resolver.resolve(std::slice::from_ref(&params.source), payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let source = first_path(&paths)?;
        let output = ctx.output(&params.format)?;
        let invocation =
            extract_invocation(source, &params.format, &params.codec, &params.bitrate, output.path())?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>(output.keep())
    }
    .await;
    ctx.release(OPERATION, &mut inputs);
    Ok(ItemOutput::media(OPERATION, result?).with_fields(json!({ "format": params.format })))
}

/// Split a video into a muted video and an audio file.
///
/// Both outputs are produced or neither is.
pub async fn separate_audio(
    ctx: &OpContext,
    params: &SeparateAudioParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    const OPERATION: &str = "separateAudio";
    let mut inputs = ctx.resolver.resolve(std::slice::from_ref(&params.source), payloads).await?;
    let result = async {
        let paths = inputs.paths();
        let source: &Path = first_path(&paths)?;

        let video = ctx.output(&params.video_format)?;
        ctx.run(OPERATION, &mute_video(source, video.path())?).await?;

        let audio = ctx.output(&params.audio_format)?;
        let invocation = extract_invocation(
            source,
            &params.audio_format,
            &params.codec,
            &params.bitrate,
            audio.path(),
        )?;
        ctx.run(OPERATION, &invocation).await?;
        Ok::<_, Error>((video.keep(), audio.keep()))
    }
    .await;
    ctx.release(OPERATION, &mut inputs);

    let (video, audio) = result?;
    Ok(ItemOutput::json(json!({ "operation": OPERATION, "success": true }))
        .with_file("video", video)
        .with_file("audio", audio))
}
