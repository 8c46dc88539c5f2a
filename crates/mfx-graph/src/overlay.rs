//! Image stamping and video-on-video overlay.

use std::f64::consts::PI;
use std::path::Path;

use mfx_core::{AudioRouting, HorizontalAlign, MediaProbe, Result, VerticalAlign};

use crate::escape;
use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::invocation::{Input, Invocation};

/// Frame size assumed when the base video cannot be probed.
const FALLBACK_SIZE: (u32, u32) = (1920, 1080);

/// Display window of an overlay, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    /// `None` means until the end of the base video.
    pub end: Option<f64>,
}

/// Where an overlay is composited on the base frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayPosition {
    Align {
        horizontal: HorizontalAlign,
        vertical: VerticalAlign,
        padding_x: f64,
        padding_y: f64,
    },
    Custom { x: String, y: String },
}

impl OverlayPosition {
    /// x and y expressions over `main_w`/`main_h` and `overlay_w`/`overlay_h`.
    pub fn expressions(&self) -> (String, String) {
        match self {
            Self::Align {
                horizontal,
                vertical,
                padding_x,
                padding_y,
            } => {
                let x = match horizontal {
                    HorizontalAlign::Left => padding_x.to_string(),
                    HorizontalAlign::Center if *padding_x != 0.0 => {
                        format!("(main_w-overlay_w)/2+{padding_x}")
                    }
                    HorizontalAlign::Center => "(main_w-overlay_w)/2".into(),
                    HorizontalAlign::Right => format!("main_w-overlay_w-{padding_x}"),
                };
                let y = match vertical {
                    VerticalAlign::Top => padding_y.to_string(),
                    VerticalAlign::Middle if *padding_y != 0.0 => {
                        format!("(main_h-overlay_h)/2+{padding_y}")
                    }
                    VerticalAlign::Middle => "(main_h-overlay_h)/2".into(),
                    VerticalAlign::Bottom => format!("main_h-overlay_h-{padding_y}"),
                };
                (x, y)
            }
            Self::Custom { x, y } => (escape::expr(x), escape::expr(y)),
        }
    }
}

/// Overlay scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlaySize {
    /// Percent of the base frame. A missing height keeps the aspect ratio.
    Percentage { width: f64, height: Option<f64> },
    /// Explicit pixels; `-1` keeps the aspect ratio on that axis.
    Pixels { width: i64, height: i64 },
    Original,
}

impl OverlaySize {
    /// Target `(w, h)` for the scale filter, or `None` for no scaling.
    pub fn resolve(&self, base: (u32, u32)) -> Option<(i64, i64)> {
        match *self {
            Self::Percentage { width, height } => {
                let w = (f64::from(base.0) * width / 100.0).round() as i64;
                let h = height.map_or(-1, |h| (f64::from(base.1) * h / 100.0).round() as i64);
                Some((w, h))
            }
            Self::Pixels { width, height } => Some((width, height)),
            Self::Original => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Image stamp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StampOptions {
    /// Explicit `(w, h)`; `-1` on an axis keeps the aspect ratio.
    pub size: Option<(i64, i64)>,
    pub x: String,
    pub y: String,
    pub rotation_degrees: f64,
    pub opacity: Option<f64>,
    pub window: Option<TimeWindow>,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            size: None,
            x: "10".into(),
            y: "10".into(),
            rotation_degrees: 0.0,
            opacity: None,
            window: None,
        }
    }
}

/// A missing end means "until the base ends"; an unknown (0) base duration
/// leaves the window open.
fn window_expr(window: &TimeWindow, base_duration: f64) -> String {
    match window.end.filter(|e| *e > 0.0) {
        Some(end) => escape::between(window.start, end),
        None if base_duration > 0.0 => escape::between(window.start, base_duration),
        None => escape::since(window.start),
    }
}

/// Composite a still image over a video.
pub fn build_stamp(
    video: &Path,
    video_probe: &MediaProbe,
    image: &Path,
    options: &StampOptions,
    output: &Path,
) -> Result<Invocation> {
    let mut inv = Invocation::new(output);
    let main = inv.input(Input::file(video));
    let stamp = inv.input(Input::file(image));

    let opacity = options.opacity.filter(|o| *o < 1.0).map(|o| o.max(0.0));
    let rotating = options.rotation_degrees.rem_euclid(360.0) != 0.0;

    let mut prep = Chain::new().input(Pad::video(stamp));
    if rotating || opacity.is_some() {
        prep = prep.filter(Filter::new("format").value("rgba"));
    }
    if let Some((w, h)) = options.size {
        prep = prep.filter(Filter::new("scale").value(w).value(h));
    }
    if rotating {
        let radians = options.rotation_degrees * PI / 180.0;
        prep = prep.filter(
            Filter::new("rotate")
                .value(radians)
                .arg("c", "none")
                .arg("ow", escape::expr(&format!("rotw({radians})")))
                .arg("oh", escape::expr(&format!("roth({radians})"))),
        );
    }
    if let Some(o) = opacity {
        prep = prep.filter(Filter::new("colorchannelmixer").arg("aa", o));
    }

    let mut graph = FilterGraph::new();
    let stamp_pad = if prep.filters().is_empty() {
        Pad::video(stamp)
    } else {
        graph.push(prep.output("stamp"))?;
        Pad::label("stamp")
    };

    let overlay = Filter::new("overlay")
        .arg("x", escape::expr(&options.x))
        .arg("y", escape::expr(&options.y))
        .arg_opt(
            "enable",
            options
                .window
                .as_ref()
                .map(|w| window_expr(w, video_probe.duration)),
        );
    graph.push(
        Chain::new()
            .input(Pad::video(main))
            .input(stamp_pad)
            .filter(overlay)
            .output("vout"),
    )?;

    inv.set_graph(graph);
    inv.map("[vout]").map(format!("{main}:a?"));
    inv.output_args(["-c:a", "copy"]);
    Ok(inv)
}

// ---------------------------------------------------------------------------
// Video overlay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VideoOverlayOptions {
    pub position: OverlayPosition,
    pub size: OverlaySize,
    pub opacity: f64,
    pub window: Option<TimeWindow>,
    pub audio: AudioRouting,
    pub main_volume: f64,
    pub overlay_volume: f64,
}

impl Default for VideoOverlayOptions {
    fn default() -> Self {
        Self {
            position: OverlayPosition::Align {
                horizontal: HorizontalAlign::Center,
                vertical: VerticalAlign::Middle,
                padding_x: 0.0,
                padding_y: 0.0,
            },
            size: OverlaySize::Percentage {
                width: 50.0,
                height: None,
            },
            opacity: 1.0,
            window: None,
            audio: AudioRouting::Main,
            main_volume: 1.0,
            overlay_volume: 1.0,
        }
    }
}

/// Audio routing that the two inputs can actually honour.
fn effective_routing(requested: AudioRouting, main: bool, overlay: bool) -> AudioRouting {
    let routed = match requested {
        AudioRouting::Mix => match (main, overlay) {
            (true, true) => AudioRouting::Mix,
            (true, false) => AudioRouting::Main,
            (false, true) => AudioRouting::Overlay,
            (false, false) => AudioRouting::None,
        },
        AudioRouting::Main if !main => AudioRouting::None,
        AudioRouting::Overlay if !overlay => AudioRouting::None,
        other => other,
    };
    if routed != requested {
        tracing::warn!(
            "audio routing {requested:?} unavailable for these inputs; using {routed:?}"
        );
    }
    routed
}

/// Composite one video over another.
pub fn build_video_overlay(
    main_video: &Path,
    main_probe: &MediaProbe,
    overlay_video: &Path,
    overlay_probe: &MediaProbe,
    options: &VideoOverlayOptions,
    output: &Path,
) -> Result<Invocation> {
    let mut inv = Invocation::new(output);
    let main = inv.input(Input::file(main_video));
    let over = inv.input(Input::file(overlay_video));

    let base = main_probe
        .video
        .as_ref()
        .filter(|g| g.is_valid())
        .map_or(FALLBACK_SIZE, |g| (g.width, g.height));

    let mut prep = Chain::new().input(Pad::video(over));
    if let Some((w, h)) = options.size.resolve(base) {
        prep = prep.filter(Filter::new("scale").value(w).value(h));
    }
    if options.opacity < 1.0 {
        prep = prep
            .filter(Filter::new("format").value("rgba"))
            .filter(Filter::new("colorchannelmixer").arg("aa", options.opacity.max(0.0)));
    }

    let mut graph = FilterGraph::new();
    let over_pad = if prep.filters().is_empty() {
        Pad::video(over)
    } else {
        graph.push(prep.output("ovr"))?;
        Pad::label("ovr")
    };

    let (x, y) = options.position.expressions();
    let overlay = Filter::new("overlay")
        .arg("x", x)
        .arg("y", y)
        .arg("eof_action", "pass")
        .arg("repeatlast", 0)
        .arg_opt(
            "enable",
            options
                .window
                .as_ref()
                .map(|w| window_expr(w, main_probe.duration)),
        );
    graph.push(
        Chain::new()
            .input(Pad::video(main))
            .input(over_pad)
            .filter(overlay)
            .output("outv"),
    )?;
    inv.map("[outv]");

    let routing = effective_routing(options.audio, main_probe.has_audio, overlay_probe.has_audio);
    match routing {
        AudioRouting::Main => {
            inv.map(format!("{main}:a"));
        }
        AudioRouting::Overlay => {
            inv.map(format!("{over}:a"));
        }
        AudioRouting::Mix => {
            graph.push(
                Chain::new()
                    .input(Pad::audio(main))
                    .filter(Filter::new("volume").value(options.main_volume))
                    .output("a0"),
            )?;
            graph.push(
                Chain::new()
                    .input(Pad::audio(over))
                    .filter(Filter::new("volume").value(options.overlay_volume))
                    .output("a1"),
            )?;
            graph.push(
                Chain::new()
                    .input(Pad::label("a0"))
                    .input(Pad::label("a1"))
                    .filter(
                        Filter::new("amix")
                            .arg("inputs", 2)
                            .arg("duration", "longest"),
                    )
                    .output("outa"),
            )?;
            inv.map("[outa]");
        }
        AudioRouting::None => {}
    }

    inv.set_graph(graph);
    inv.output_args(["-c:v", "libx264", "-preset", "fast", "-crf", "23"]);
    if routing == AudioRouting::None {
        inv.output_args(["-an"]);
    } else {
        inv.output_args(["-c:a", "aac"]);
    }
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mfx_core::VideoGeometry;

    fn video(w: u32, h: u32, duration: f64, audio: bool) -> MediaProbe {
        MediaProbe {
            duration,
            has_audio: audio,
            video: Some(VideoGeometry {
                width: w,
                height: h,
                sample_aspect_ratio: "1:1".into(),
                frame_rate: "30/1".into(),
            }),
        }
    }

    #[test]
    fn stamp_scale_rotate_overlay() {
        let options = StampOptions {
            size: Some((200, -1)),
            rotation_degrees: 90.0,
            ..Default::default()
        };
        let inv = build_stamp(
            Path::new("/t/v.mp4"),
            &video(1920, 1080, 10.0, true),
            Path::new("/t/logo.png"),
            &options,
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        let rendered = inv.graph().unwrap().render();
        let radians = PI / 2.0;
        assert!(rendered.starts_with(&format!(
            "[1:v]format=rgba,scale=200:-1,rotate={radians}:c=none:ow='rotw({radians})':oh='roth({radians})'[stamp]"
        )));
        assert!(rendered.ends_with("[0:v][stamp]overlay=x='10':y='10'[vout]"));
        assert!(inv.has_output_option("-c:a", "copy"));
    }

    #[test]
    fn stamp_plain_uses_input_pad() {
        let inv = build_stamp(
            Path::new("/t/v.mp4"),
            &video(1920, 1080, 10.0, true),
            Path::new("/t/logo.png"),
            &StampOptions {
                opacity: Some(1.0),
                window: Some(TimeWindow {
                    start: 2.0,
                    end: None,
                }),
                ..Default::default()
            },
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        assert_eq!(
            inv.graph().unwrap().render(),
            "[0:v][1:v]overlay=x='10':y='10':enable='between(t,2,10)'[vout]"
        );
    }

    #[test]
    fn open_window_on_unknown_duration_stays_open() {
        let window = Some(TimeWindow {
            start: 2.0,
            end: None,
        });
        let stamp = build_stamp(
            Path::new("/t/v.mp4"),
            &video(1920, 1080, 0.0, true),
            Path::new("/t/logo.png"),
            &StampOptions {
                window,
                ..Default::default()
            },
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        assert_eq!(
            stamp.graph().unwrap().render(),
            "[0:v][1:v]overlay=x='10':y='10':enable='gte(t,2)'[vout]"
        );

        let overlay = build_video_overlay(
            Path::new("/t/main.mp4"),
            &video(1920, 1080, 0.0, true),
            Path::new("/t/pip.mp4"),
            &video(640, 360, 4.0, false),
            &VideoOverlayOptions {
                window,
                ..Default::default()
            },
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        let rendered = overlay.graph().unwrap().render();
        assert!(rendered.contains("enable='gte(t,2)'"), "{rendered}");
        assert!(!rendered.contains("between(t,2,0)"));
    }

    #[test]
    fn percentage_size_auto_height() {
        let size = OverlaySize::Percentage {
            width: 25.0,
            height: None,
        };
        assert_eq!(size.resolve((1920, 1080)), Some((480, -1)));
        let size = OverlaySize::Percentage {
            width: 50.0,
            height: Some(50.0),
        };
        assert_eq!(size.resolve((1280, 720)), Some((640, 360)));
        assert_eq!(OverlaySize::Original.resolve((1280, 720)), None);
    }

    #[test]
    fn alignment_with_padding() {
        let pos = OverlayPosition::Align {
            horizontal: HorizontalAlign::Center,
            vertical: VerticalAlign::Bottom,
            padding_x: 15.0,
            padding_y: 20.0,
        };
        assert_eq!(
            pos.expressions(),
            (
                "(main_w-overlay_w)/2+15".to_string(),
                "main_h-overlay_h-20".to_string()
            )
        );
    }

    #[test]
    fn overlay_with_opacity_window_and_mix() {
        let options = VideoOverlayOptions {
            opacity: 0.6,
            window: Some(TimeWindow {
                start: 1.0,
                end: Some(5.0),
            }),
            audio: AudioRouting::Mix,
            overlay_volume: 0.3,
            ..Default::default()
        };
        let inv = build_video_overlay(
            Path::new("/t/main.mp4"),
            &video(1920, 1080, 12.0, true),
            Path::new("/t/pip.mp4"),
            &video(640, 360, 4.0, true),
            &options,
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        let rendered = inv.graph().unwrap().render();
        assert!(rendered.starts_with(
            "[1:v]scale=960:-1,format=rgba,colorchannelmixer=aa=0.6[ovr];\
             [0:v][ovr]overlay=x=(main_w-overlay_w)/2:y=(main_h-overlay_h)/2:eof_action=pass:repeatlast=0:enable='between(t,1,5)'[outv]"
        ));
        assert!(rendered.ends_with("[a0][a1]amix=inputs=2:duration=longest[outa]"));
        assert_eq!(inv.maps(), ["[outv]", "[outa]"]);
        assert!(inv.has_output_option("-crf", "23"));
    }

    #[test]
    fn mix_degrades_when_overlay_is_silent() {
        let options = VideoOverlayOptions {
            audio: AudioRouting::Mix,
            size: OverlaySize::Original,
            ..Default::default()
        };
        let inv = build_video_overlay(
            Path::new("/t/main.mp4"),
            &video(1920, 1080, 12.0, true),
            Path::new("/t/pip.mp4"),
            &video(640, 360, 4.0, false),
            &options,
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        assert_eq!(inv.maps(), ["[outv]", "0:a"]);
        assert!(inv.graph().unwrap().render().starts_with("[0:v][1:v]overlay"));
    }

    #[test]
    fn no_audio_routing_drops_audio() {
        let options = VideoOverlayOptions {
            audio: AudioRouting::None,
            ..Default::default()
        };
        let inv = build_video_overlay(
            Path::new("/t/main.mp4"),
            &video(1920, 1080, 12.0, true),
            Path::new("/t/pip.mp4"),
            &video(640, 360, 4.0, true),
            &options,
            Path::new("/t/out.mp4"),
        )
        .unwrap();
        assert_eq!(inv.maps(), ["[outv]"]);
        assert!(inv.output_options().contains(&"-an".to_string()));
    }
}
