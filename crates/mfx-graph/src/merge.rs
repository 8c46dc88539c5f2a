//! Normalize-then-join merging.
//!
//! Every input is re-encoded to the reference geometry with a stereo 44.1 kHz
//! track, one intermediate per input. The intermediates are then joined with
//! the concat protocol and stream copy, which is only sound because of the
//! normalization pass.

use std::path::{Path, PathBuf};

use mfx_core::{Error, MediaProbe, Result, VideoGeometry};

use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::invocation::{Input, Invocation};

/// Container used for the normalized intermediates.
pub const INTERMEDIATE_EXT: &str = ".ts";

/// The first probe exposing a usable video stream.
pub fn reference_geometry(probes: &[MediaProbe]) -> Option<&VideoGeometry> {
    probes
        .iter()
        .filter_map(|p| p.video.as_ref())
        .find(|g| g.is_valid())
}

/// `num:den` (as probed) to `num/den` (as `setsar` expects).
fn sar_ratio(sar: &str) -> String {
    let positive = |s: &str| s.parse::<u32>().is_ok_and(|n| n > 0);
    match sar.split_once(':') {
        Some((num, den)) if positive(num) && positive(den) => format!("{num}/{den}"),
        _ => "1/1".into(),
    }
}

fn frame_rate(rate: &str) -> &str {
    match rate.trim() {
        "" | "0/0" | "N/A" => "30",
        r => r,
    }
}

/// Filters that bring stream 0 of `input` to the reference geometry.
pub fn normalize_video_filters(reference: &VideoGeometry) -> Vec<Filter> {
    let (w, h) = (reference.width, reference.height);
    vec![
        Filter::new("scale")
            .value(w)
            .value(h)
            .arg("force_original_aspect_ratio", "decrease"),
        Filter::new("pad")
            .value(w)
            .value(h)
            .value(-1)
            .value(-1)
            .arg("color", "black"),
    ]
    .into_iter()
    .chain(conform_filters(reference))
    .chain([Filter::new("setpts").value("PTS-STARTPTS")])
    .collect()
}

/// Sample aspect ratio, pixel format and frame rate of `reference`.
///
/// Streams meeting in `concat` or `xfade` must agree on all three.
pub fn conform_filters(reference: &VideoGeometry) -> [Filter; 3] {
    [
        Filter::new("setsar").value(sar_ratio(&reference.sample_aspect_ratio)),
        Filter::new("format").value("yuv420p"),
        Filter::new("fps").value(frame_rate(&reference.frame_rate)),
    ]
}

/// Filters that bring an audio stream to the common sample layout.
pub fn normalize_audio_filters() -> Vec<Filter> {
    vec![
        Filter::new("aformat")
            .arg("sample_fmts", "fltp")
            .arg("sample_rates", 44100)
            .arg("channel_layouts", "stereo"),
        Filter::new("asetpts").value("PTS-STARTPTS"),
    ]
}

/// Build the normalization invocation for one merge input.
///
/// An input without audio gets a silent track as long as its probed
/// duration.
pub fn normalize_invocation(
    input: &Path,
    probe: &MediaProbe,
    reference: &VideoGeometry,
    output: &Path,
) -> Result<Invocation> {
    if probe.video.is_none() {
        return Err(Error::validation(format!(
            "merge input {} has no video stream",
            input.display()
        )));
    }

    let mut inv = Invocation::new(output);
    let main = inv.input(Input::file(input));
    let audio = if probe.has_audio {
        Pad::audio(main)
    } else {
        Pad::audio(inv.input(Input::silence(probe.duration)))
    };

    let mut graph = FilterGraph::new();
    let video_chain = normalize_video_filters(reference)
        .into_iter()
        .fold(Chain::new().input(Pad::video(main)), Chain::filter)
        .output("v_out");
    graph.push(video_chain)?;
    let audio_chain = normalize_audio_filters()
        .into_iter()
        .fold(Chain::new().input(audio), Chain::filter)
        .output("a_out");
    graph.push(audio_chain)?;

    inv.set_graph(graph);
    inv.map("[v_out]").map("[a_out]");
    inv.output_args(["-c:v", "libx264", "-c:a", "aac"]);
    if !probe.has_audio {
        inv.output_args(["-shortest"]);
    }
    Ok(inv)
}

/// Join normalized intermediates without re-encoding.
pub fn join_invocation(parts: &[PathBuf], output: &Path) -> Result<Invocation> {
    if parts.is_empty() {
        return Err(Error::validation("Merge operation requires at least one source."));
    }
    let mut inv = Invocation::new(output);
    inv.input(Input::concat(parts));
    inv.output_args(["-c", "copy"]);
    Ok(inv)
}
