//! Multi-clip transition chains.
//!
//! Two strategies produce the same N-1 blends:
//!
//! - [`BlendStrategy::Native`] chains the engine's cross-fade filter over the
//!   running output, each blend starting at the running length minus the
//!   transition duration.
//! - [`BlendStrategy::EdgeFade`] is the fallback for engines without the
//!   cross-fade family. Each clip fades out at its tail and/or in at its head
//!   and the clips are concatenated.

use std::path::{Path, PathBuf};

use mfx_core::{Error, MediaProbe, Result};

use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::invocation::{Input, Invocation};
use crate::merge::conform_filters;

/// Transitions that can be synthesized without the cross-fade family.
pub const FADE_FAMILY: &[&str] = &["fade", "fadeblack", "fadewhite"];

/// Transitions that need the cross-fade family.
pub const CROSSFADE_CATALOG: &[&str] = &[
    "wipeleft",
    "wiperight",
    "wipeup",
    "wipedown",
    "slideleft",
    "slideright",
    "slideup",
    "slidedown",
    "circlecrop",
    "rectcrop",
    "distance",
    "fadegrays",
    "radial",
    "circleopen",
    "circleclose",
    "pixelize",
    "dissolve",
    "diagtl",
    "boxin",
    "iris",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendStrategy {
    Native,
    EdgeFade,
}

/// One pairwise blend, in seconds on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub offset: f64,
    pub duration: f64,
}

/// What a transition invocation will do.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub transition: String,
    pub strategy: BlendStrategy,
    pub blends: Vec<Blend>,
    pub with_audio: bool,
}

/// A transition request over already-resolved clips.
#[derive(Debug, Clone)]
pub struct TransitionSpec<'a> {
    pub clips: &'a [PathBuf],
    pub probes: &'a [MediaProbe],
    /// Effective transition name, after any capability fallback.
    pub transition: &'a str,
    pub strategy: BlendStrategy,
    pub duration: f64,
}

fn validate(spec: &TransitionSpec<'_>) -> Result<()> {
    if spec.clips.len() < 2 {
        return Err(Error::validation(
            "Transition (Apply) operation requires at least two source videos.",
        ));
    }
    if spec.clips.len() != spec.probes.len() {
        return Err(Error::Internal(format!(
            "{} clips but {} probes",
            spec.clips.len(),
            spec.probes.len()
        )));
    }
    if !(spec.duration.is_finite() && spec.duration > 0.0) {
        return Err(Error::validation("Transition duration must be positive."));
    }
    if spec.strategy == BlendStrategy::EdgeFade && !FADE_FAMILY.contains(&spec.transition) {
        return Err(Error::UnsupportedCapability(format!(
            "'{}' cannot be synthesized without the xfade filter",
            spec.transition
        )));
    }
    for (i, (clip, probe)) in spec.clips.iter().zip(spec.probes).enumerate() {
        if probe.video.is_none() {
            return Err(Error::validation(format!(
                "transition input {i} ({}) has no video stream",
                clip.display()
            )));
        }
        if probe.duration <= spec.duration {
            return Err(Error::validation(format!(
                "transition duration {}s must be shorter than clip {i} ({}s)",
                spec.duration, probe.duration
            )));
        }
    }
    Ok(())
}

/// Per-clip preparation: bring every clip to the largest frame size, and to
/// the first clip's sample aspect ratio, pixel format and frame rate.
fn push_prepare(graph: &mut FilterGraph, probes: &[MediaProbe], with_audio: bool) -> Result<()> {
    let Some(reference) = probes.first().and_then(|p| p.video.as_ref()) else {
        return Err(Error::Internal("transition without a first video clip".into()));
    };
    let dims: Vec<(u32, u32)> = probes
        .iter()
        .map(|p| p.video.as_ref().map_or((0, 0), |g| (g.width, g.height)))
        .collect();
    let target_w = dims.iter().map(|d| d.0).max().unwrap_or(0);
    let target_h = dims.iter().map(|d| d.1).max().unwrap_or(0);

    for (i, &(w, h)) in dims.iter().enumerate() {
        let mut chain = Chain::new().input(Pad::video(i));
        if (w, h) != (target_w, target_h) {
            chain = chain
                .filter(
                    Filter::new("scale")
                        .value(target_w)
                        .value(target_h)
                        .arg("force_original_aspect_ratio", "decrease"),
                )
                .filter(
                    Filter::new("pad")
                        .value(target_w)
                        .value(target_h)
                        .value("(ow-iw)/2")
                        .value("(oh-ih)/2")
                        .value("black"),
                );
        }
        let chain = conform_filters(reference)
            .into_iter()
            .fold(chain, Chain::filter)
            .filter(Filter::new("settb").value("AVTB"));
        graph.push(chain.output(format!("v{i}")))?;
    }

    if with_audio {
        for i in 0..probes.len() {
            graph.push(
                Chain::new()
                    .input(Pad::audio(i))
                    .filter(
                        Filter::new("aformat")
                            .arg("sample_fmts", "fltp")
                            .arg("sample_rates", 44100)
                            .arg("channel_layouts", "stereo"),
                    )
                    .output(format!("a{i}")),
            )?;
        }
    }
    Ok(())
}

fn push_native(
    graph: &mut FilterGraph,
    spec: &TransitionSpec<'_>,
    with_audio: bool,
) -> Result<(Vec<String>, Vec<Blend>)> {
    let t = spec.duration;
    let mut last_video = "v0".to_string();
    let mut last_audio = "a0".to_string();
    let mut running = spec.probes[0].duration;
    let mut blends = Vec::with_capacity(spec.clips.len() - 1);

    for i in 1..spec.clips.len() {
        let offset = running - t;
        let video_out = format!("vout{i}");
        graph.push(
            Chain::new()
                .input(Pad::label(&last_video))
                .input(Pad::label(format!("v{i}")))
                .filter(
                    Filter::new("xfade")
                        .arg("transition", spec.transition)
                        .arg("duration", t)
                        .arg("offset", offset),
                )
                .output(&video_out),
        )?;
        if with_audio {
            let audio_out = format!("aout{i}");
            graph.push(
                Chain::new()
                    .input(Pad::label(&last_audio))
                    .input(Pad::label(format!("a{i}")))
                    .filter(Filter::new("acrossfade").arg("d", t))
                    .output(&audio_out),
            )?;
            last_audio = audio_out;
        }
        last_video = video_out;
        blends.push(Blend { offset, duration: t });
        running += spec.probes[i].duration - t;
    }

    let mut outs = vec![last_video];
    if with_audio {
        outs.push(last_audio);
    }
    Ok((outs, blends))
}

fn edge_fade(
    name: &str,
    direction: &str,
    start: f64,
    duration: f64,
    colour: Option<&str>,
) -> Filter {
    Filter::new(name)
        .arg("t", direction)
        .arg("st", start)
        .arg("d", duration)
        .arg_opt("color", colour)
}

fn push_edge_fade(
    graph: &mut FilterGraph,
    spec: &TransitionSpec<'_>,
    with_audio: bool,
) -> Result<(Vec<String>, Vec<Blend>)> {
    let t = spec.duration;
    let n = spec.clips.len();
    let colour = match spec.transition {
        "fadeblack" => Some("black"),
        "fadewhite" => Some("white"),
        _ => None,
    };

    let mut elapsed = 0.0;
    let mut blends = Vec::with_capacity(n - 1);
    let mut video_chain = Chain::new();
    let mut audio_chain = Chain::new();

    for (i, probe) in spec.probes.iter().enumerate() {
        let d = probe.duration;
        let fade_in = i > 0;
        let fade_out = i + 1 < n;

        let mut v = Chain::new().input(Pad::label(format!("v{i}")));
        let mut a = Chain::new().input(Pad::label(format!("a{i}")));
        if fade_in {
            v = v.filter(edge_fade("fade", "in", 0.0, t, colour));
            a = a.filter(edge_fade("afade", "in", 0.0, t, None));
        }
        if fade_out {
            v = v.filter(edge_fade("fade", "out", d - t, t, colour));
            a = a.filter(edge_fade("afade", "out", d - t, t, None));
            blends.push(Blend {
                offset: elapsed + d - t,
                duration: t,
            });
        }
        graph.push(v.output(format!("vseg{i}")))?;
        video_chain = video_chain.input(Pad::label(format!("vseg{i}")));
        if with_audio {
            graph.push(a.output(format!("aseg{i}")))?;
            audio_chain = audio_chain.input(Pad::label(format!("aseg{i}")));
        }
        elapsed += d;
    }

    graph.push(
        video_chain
            .filter(Filter::new("concat").arg("n", n).arg("v", 1).arg("a", 0))
            .output("vconcat"),
    )?;
    if with_audio {
        graph.push(
            audio_chain
                .filter(Filter::new("concat").arg("n", n).arg("v", 0).arg("a", 1))
                .output("aconcat"),
        )?;
        Ok((vec!["vconcat".into(), "aconcat".into()], blends))
    } else {
        Ok((vec!["vconcat".into()], blends))
    }
}

/// Build the transition invocation and describe its blends.
///
/// Audio is cross-faded only when every clip has an audio stream; otherwise
/// the output is video-only.
pub fn build_transition(
    spec: &TransitionSpec<'_>,
    output: &Path,
) -> Result<(Invocation, TransitionPlan)> {
    validate(spec)?;
    let with_audio = spec.probes.iter().all(|p| p.has_audio);

    let mut inv = Invocation::new(output);
    for clip in spec.clips {
        inv.input(Input::file(clip));
    }

    let mut graph = FilterGraph::new();
    push_prepare(&mut graph, spec.probes, with_audio)?;
    let (outs, blends) = match spec.strategy {
        BlendStrategy::Native => push_native(&mut graph, spec, with_audio)?,
        BlendStrategy::EdgeFade => push_edge_fade(&mut graph, spec, with_audio)?,
    };

    inv.set_graph(graph);
    for label in outs {
        inv.map(format!("[{label}]"));
    }
    inv.output_args(["-c:v", "libx264"]);
    if with_audio {
        inv.output_args(["-c:a", "aac"]);
    }

    let plan = TransitionPlan {
        transition: spec.transition.to_string(),
        strategy: spec.strategy,
        blends,
        with_audio,
    };
    Ok((inv, plan))
}
