//! Two-track audio mixing onto a video.

use std::path::Path;

use mfx_core::{Error, MediaProbe, MixEnd, Result};

use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::invocation::{Input, Invocation};

/// Window placement of the secondary track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialMix {
    /// Offset of the window on the primary timeline, in seconds.
    pub start: f64,
    /// Window length. Defaults to the secondary track's duration.
    pub duration: Option<f64>,
    /// Loop the secondary track when it is shorter than the window.
    pub looped: bool,
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixRequest {
    pub video_volume: f64,
    pub audio_volume: f64,
    /// End policy of a full mix. A partial mix always keeps the primary length.
    pub end: MixEnd,
    pub partial: Option<PartialMix>,
}

impl Default for MixRequest {
    fn default() -> Self {
        Self {
            video_volume: 1.0,
            audio_volume: 1.0,
            end: MixEnd::Shortest,
            partial: None,
        }
    }
}

fn volume(v: f64) -> Filter {
    Filter::new("volume").value(v)
}

/// Secondary-track filters for a partial mix.
fn window_filters(window: &PartialMix, source_duration: f64, audio_volume: f64) -> Vec<Filter> {
    let length = window
        .duration
        .filter(|d| *d > 0.0)
        .unwrap_or(source_duration);
    let needs_loop = window.looped && source_duration < length;

    let mut filters = Vec::new();
    if needs_loop {
        filters.push(Filter::new("aloop").arg("loop", -1).arg("size", "2e9"));
    }
    if length > 0.0 && (needs_loop || source_duration >= length) {
        filters.push(Filter::new("atrim").arg("duration", length));
    }
    filters.push(Filter::new("asetpts").value("PTS-STARTPTS"));
    if let Some(d) = window.fade_in.filter(|d| *d > 0.0) {
        filters.push(Filter::new("afade").arg("t", "in").arg("st", 0).arg("d", d));
    }
    // An unlooped track shorter than the window goes quiet at its own end.
    let audible = if needs_loop || source_duration <= 0.0 {
        length
    } else {
        length.min(source_duration)
    };
    if let Some(d) = window.fade_out.filter(|d| *d > 0.0) {
        let start = (audible - d).max(0.0);
        filters.push(Filter::new("afade").arg("t", "out").arg("st", start).arg("d", d));
    }
    filters.push(volume(audio_volume));

    let delay_ms = (window.start.max(0.0) * 1000.0).round() as u64;
    filters.push(Filter::new("adelay").value(format!("{delay_ms}|{delay_ms}")));
    filters
}

/// Build the mix invocation.
///
/// The secondary source must carry audio. A primary without audio is given a
/// silent track of its own length.
pub fn build_mix(
    video: &Path,
    video_probe: &MediaProbe,
    audio: &Path,
    audio_probe: &MediaProbe,
    request: &MixRequest,
    output: &Path,
) -> Result<Invocation> {
    if !audio_probe.has_audio {
        return Err(Error::validation(
            "The secondary audio source does not contain any audio stream",
        ));
    }

    let mut inv = Invocation::new(output);
    let main = inv.input(Input::file(video));
    let secondary = inv.input(Input::file(audio));
    let main_audio = if video_probe.has_audio {
        Pad::audio(main)
    } else {
        Pad::audio(inv.input(Input::silence(video_probe.duration)))
    };

    let mut graph = FilterGraph::new();
    match &request.partial {
        None => {
            graph.push(
                Chain::new()
                    .input(main_audio)
                    .filter(volume(request.video_volume))
                    .output("a0"),
            )?;
            graph.push(
                Chain::new()
                    .input(Pad::audio(secondary))
                    .filter(volume(request.audio_volume))
                    .output("a1"),
            )?;
            graph.push(
                Chain::new()
                    .input(Pad::label("a0"))
                    .input(Pad::label("a1"))
                    .filter(
                        Filter::new("amix")
                            .arg("inputs", 2)
                            .arg("duration", request.end.as_str()),
                    )
                    .output("a"),
            )?;
            inv.map(format!("{main}:v")).map("[a]");
        }
        Some(window) => {
            let overlay = window_filters(window, audio_probe.duration, request.audio_volume)
                .into_iter()
                .fold(Chain::new().input(Pad::audio(secondary)), Chain::filter)
                .output("overlay_audio");
            graph.push(overlay)?;
            graph.push(
                Chain::new()
                    .input(main_audio)
                    .filter(volume(request.video_volume))
                    .output("main_audio"),
            )?;
            graph.push(
                Chain::new()
                    .input(Pad::label("main_audio"))
                    .input(Pad::label("overlay_audio"))
                    .filter(
                        Filter::new("amix")
                            .arg("inputs", 2)
                            .arg("duration", "first")
                            .arg("dropout_transition", 0),
                    )
                    .output("mixed_audio"),
            )?;
            inv.map(format!("{main}:v")).map("[mixed_audio]");
        }
    }

    inv.set_graph(graph);
    inv.output_args(["-c:v", "copy", "-c:a", "aac"]);
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(duration: f64, audio: bool) -> MediaProbe {
        MediaProbe {
            duration,
            has_audio: audio,
            video: None,
        }
    }

    fn mix(video: MediaProbe, audio: MediaProbe, request: &MixRequest) -> Result<Invocation> {
        build_mix(
            Path::new("/t/v.mp4"),
            &video,
            Path::new("/t/a.mp3"),
            &audio,
            request,
            Path::new("/t/out.mp4"),
        )
    }

    #[test]
    fn full_mix_shortest() {
        let request = MixRequest {
            video_volume: 1.0,
            audio_volume: 0.5,
            end: MixEnd::Shortest,
            partial: None,
        };
        let inv = mix(track(10.0, true), track(20.0, true), &request).unwrap();
        assert_eq!(
            inv.graph().unwrap().render(),
            "[0:a]volume=1[a0];[1:a]volume=0.5[a1];[a0][a1]amix=inputs=2:duration=shortest[a]"
        );
        assert_eq!(inv.maps(), ["0:v", "[a]"]);
        assert!(inv.has_output_option("-c:v", "copy"));
    }

    #[test]
    fn silent_primary_gets_generated_track() {
        let inv = mix(track(0.0, false), track(5.0, true), &MixRequest::default()).unwrap();
        assert_eq!(inv.inputs().len(), 3);
        assert!(inv.inputs()[2].is_silence());
        assert_eq!(inv.inputs()[2].options[3], "0.01");
        assert!(inv.graph().unwrap().render().starts_with("[2:a]volume=1[a0]"));
    }

    #[test]
    fn secondary_without_audio_fails_fast() {
        let err = mix(track(10.0, true), track(10.0, false), &MixRequest::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn partial_mix_loops_trims_and_delays() {
        let request = MixRequest {
            partial: Some(PartialMix {
                start: 2.5,
                duration: Some(8.0),
                looped: true,
                fade_in: Some(1.0),
                fade_out: Some(2.0),
            }),
            ..Default::default()
        };
        let inv = mix(track(30.0, true), track(3.0, true), &request).unwrap();
        assert_eq!(
            inv.graph().unwrap().render(),
            "[1:a]aloop=loop=-1:size=2e9,atrim=duration=8,asetpts=PTS-STARTPTS,\
             afade=t=in:st=0:d=1,afade=t=out:st=6:d=2,volume=1,adelay=2500|2500[overlay_audio];\
             [0:a]volume=1[main_audio];\
             [main_audio][overlay_audio]amix=inputs=2:duration=first:dropout_transition=0[mixed_audio]"
        );
    }

    #[test]
    fn partial_mix_without_loop_keeps_short_track() {
        let request = MixRequest {
            partial: Some(PartialMix {
                duration: Some(8.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let inv = mix(track(30.0, true), track(3.0, true), &request).unwrap();
        let rendered = inv.graph().unwrap().render();
        assert!(!rendered.contains("aloop"));
        assert!(!rendered.contains("atrim"));
        assert!(rendered.contains("adelay=0|0"));
    }

    #[test]
    fn fade_out_ends_with_a_short_unlooped_track() {
        let request = MixRequest {
            partial: Some(PartialMix {
                duration: Some(8.0),
                fade_out: Some(1.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let inv = mix(track(30.0, true), track(3.0, true), &request).unwrap();
        let rendered = inv.graph().unwrap().render();
        assert!(rendered.contains("afade=t=out:st=2:d=1"), "{rendered}");
        assert!(!rendered.contains("st=7"));
    }
}
