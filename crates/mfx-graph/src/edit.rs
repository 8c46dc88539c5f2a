//! Single-input edits: trim, audio extraction, muting, fades and
//! still-image conversion.

use std::path::Path;

use mfx_core::{Error, FadeDirection, MediaProbe, Result};

use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::invocation::{Input, Invocation};

/// Re-encode the `[from, to)` window.
pub fn trim(input: &Path, from: f64, to: f64, output: &Path) -> Result<Invocation> {
    if from < 0.0 || !(to > from) {
        return Err(Error::validation(format!(
            "trim window [{from}, {to}) is empty or negative"
        )));
    }
    let mut inv = Invocation::new(output);
    inv.input(Input::file(input).with_options(["-ss".to_string(), from.to_string()]));
    inv.output_args([
        "-t".to_string(),
        (to - from).to_string(),
        "-c:v".into(),
        "libx264".into(),
        "-c:a".into(),
        "aac".into(),
    ]);
    Ok(inv)
}

/// Codec to use for an audio output; `copy` cannot target an mp3 container.
pub fn audio_codec_for(format: &str, codec: &str) -> String {
    if codec == "copy" && format.eq_ignore_ascii_case("mp3") {
        "libmp3lame".into()
    } else {
        codec.into()
    }
}

/// First audio stream only, no video.
pub fn extract_audio(
    input: &Path,
    format: &str,
    codec: &str,
    bitrate: &str,
    output: &Path,
) -> Result<Invocation> {
    let codec = audio_codec_for(format, codec);
    let mut inv = Invocation::new(output);
    inv.input(Input::file(input));
    inv.map("0:a:0");
    inv.output_args(["-vn".to_string(), "-c:a".into(), codec.clone()]);
    if codec != "copy" && !bitrate.is_empty() {
        inv.output_args(["-b:a", bitrate]);
    }
    Ok(inv)
}

/// Stream-copied video with the audio removed.
pub fn mute_video(input: &Path, output: &Path) -> Result<Invocation> {
    let mut inv = Invocation::new(output);
    inv.input(Input::file(input));
    inv.map("0:v");
    inv.output_args(["-an", "-c:v", "copy"]);
    Ok(inv)
}

/// Fade video, and audio when present, over `[start, start + duration]`.
pub fn fade(
    input: &Path,
    probe: &MediaProbe,
    direction: FadeDirection,
    start: f64,
    duration: f64,
    output: &Path,
) -> Result<Invocation> {
    if start < 0.0 || !(duration > 0.0) {
        return Err(Error::validation(
            "fade start must be non-negative and duration positive",
        ));
    }
    let mut inv = Invocation::new(output);
    let main = inv.input(Input::file(input));

    let mut graph = FilterGraph::new();
    graph.push(
        Chain::new()
            .input(Pad::video(main))
            .filter(
                Filter::new("fade")
                    .arg("t", direction.as_str())
                    .arg("st", start)
                    .arg("d", duration),
            )
            .output("vout"),
    )?;
    inv.map("[vout]");
    if probe.has_audio {
        graph.push(
            Chain::new()
                .input(Pad::audio(main))
                .filter(
                    Filter::new("afade")
                        .arg("t", direction.as_str())
                        .arg("st", start)
                        .arg("d", duration),
                )
                .output("aout"),
        )?;
        inv.map("[aout]");
    } else {
        tracing::info!("source has no audio stream; applying video fade only");
    }
    inv.set_graph(graph);
    inv.output_args(["-c:v", "libx264"]);
    if probe.has_audio {
        inv.output_args(["-c:a", "aac"]);
    }
    Ok(inv)
}

/// Loop a still image for `duration` seconds with a silent track.
pub fn image_to_video(
    image: &Path,
    duration: f64,
    size: Option<(u32, u32)>,
    output: &Path,
) -> Result<Invocation> {
    if !(duration > 0.0) {
        return Err(Error::validation("image-to-video duration must be positive"));
    }
    let mut inv = Invocation::new(output);
    let still = inv.input(Input::file(image).with_options([
        "-loop".to_string(),
        "1".into(),
        "-t".into(),
        duration.to_string(),
    ]));
    let silence = inv.input(Input::silence(duration));

    let scale = match size {
        Some((w, h)) if w > 0 && h > 0 => Filter::new("scale").value(w).value(h),
        _ => Filter::new("scale").value("trunc(iw/2)*2").value("trunc(ih/2)*2"),
    };
    let mut graph = FilterGraph::new();
    graph.push(
        Chain::new()
            .input(Pad::video(still))
            .filter(scale)
            .filter(Filter::new("format").value("yuv420p"))
            .output("vout"),
    )?;
    inv.set_graph(graph);
    inv.map("[vout]").map(format!("{silence}:a"));
    inv.output_args(["-c:v", "libx264", "-c:a", "aac", "-shortest"]);
    Ok(inv)
}
