//! FFprobe-based media inspection.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and reduces the JSON output to a [`MediaProbe`]: duration, audio presence
//! and the geometry of the first video stream.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use mfx_core::{MediaProbe, VideoGeometry};
use serde::Deserialize;

use crate::command::ToolCommand;

/// Inspects media files.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe a single file. Failures surface as [`mfx_core::Error::Probe`].
    async fn probe(&self, path: &Path) -> mfx_core::Result<MediaProbe>;
}

/// Probe several files concurrently, preserving input order.
pub async fn probe_all(
    prober: &dyn Prober,
    paths: &[PathBuf],
) -> mfx_core::Result<Vec<MediaProbe>> {
    try_join_all(paths.iter().map(|p| prober.probe(p))).await
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, path: &Path) -> mfx_core::Result<MediaProbe> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd
            .execute()
            .await
            .map_err(|e| mfx_core::Error::Probe(format!("{}: {e}", path.display())))?;
        let probe = parse_probe_json(&output.stdout)?;
        tracing::debug!(
            "probed {}: duration={} audio={} video={:?}",
            path.display(),
            probe.duration,
            probe.has_audio,
            probe.video
        );
        Ok(probe)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_aspect_ratio: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Reduce ffprobe JSON to a [`MediaProbe`].
pub fn parse_probe_json(json: &str) -> mfx_core::Result<MediaProbe> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| mfx_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let first_video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let duration = parse_seconds(output.format.duration.as_deref())
        .or_else(|| first_video.and_then(|s| parse_seconds(s.duration.as_deref())))
        .or_else(|| {
            output
                .streams
                .iter()
                .find_map(|s| parse_seconds(s.duration.as_deref()))
        })
        .unwrap_or(0.0);

    let has_audio = output
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let video = first_video.map(|s| VideoGeometry {
        width: s.width.unwrap_or(0),
        height: s.height.unwrap_or(0),
        sample_aspect_ratio: normalize_sar(s.sample_aspect_ratio.as_deref()),
        frame_rate: s
            .r_frame_rate
            .clone()
            .filter(|r| parse_frame_rate(r).is_some())
            .unwrap_or_else(|| "30".to_string()),
    });

    Ok(MediaProbe {
        duration,
        has_audio,
        video,
    })
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Unknown or degenerate ratios become square pixels.
fn normalize_sar(sar: Option<&str>) -> String {
    match sar {
        Some(s) if s != "N/A" && s != "0:1" && s.contains(':') => s.to_string(),
        _ => "1:1".to_string(),
    }
}

pub fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok().filter(|r: &f64| *r > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIP: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 1920, "height": 1080,
             "sample_aspect_ratio": "1:1", "r_frame_rate": "30000/1001",
             "duration": "9.90"},
            {"codec_type": "audio", "duration": "10.00"}
        ],
        "format": {"duration": "10.010000"}
    }"#;

    #[test]
    fn frame_rate_fraction() {
        assert!((parse_frame_rate("24000/1001").unwrap() - 23.976).abs() < 0.01);
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn full_clip() {
        let probe = parse_probe_json(CLIP).unwrap();
        assert!((probe.duration - 10.01).abs() < 1e-9);
        assert!(probe.has_audio);
        let video = probe.video.unwrap();
        assert_eq!((video.width, video.height), (1920, 1080));
        assert_eq!(video.frame_rate, "30000/1001");
        assert_eq!(video.sample_aspect_ratio, "1:1");
    }

    #[test]
    fn duration_falls_back_to_stream() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 480,
            "duration": "4.5"}], "format": {"duration": "N/A"}}"#;
        let probe = parse_probe_json(json).unwrap();
        assert_eq!(probe.duration, 4.5);
        assert!(!probe.has_audio);
    }

    #[test]
    fn still_image_probes_to_zero() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 800, "height": 600,
            "sample_aspect_ratio": "N/A", "r_frame_rate": "0/0"}], "format": {}}"#;
        let probe = parse_probe_json(json).unwrap();
        assert_eq!(probe.duration, 0.0);
        let video = probe.video.unwrap();
        assert_eq!(video.sample_aspect_ratio, "1:1");
        assert_eq!(video.frame_rate, "30");
    }

    #[test]
    fn audio_only_has_no_geometry() {
        let json = r#"{"streams": [{"codec_type": "audio", "duration": "20"}],
            "format": {"duration": "20.0"}}"#;
        let probe = parse_probe_json(json).unwrap();
        assert!(probe.video.is_none());
        assert!(probe.has_audio);
    }

    #[test]
    fn garbage_is_probe_error() {
        let err = parse_probe_json("not json").unwrap_err();
        assert_eq!(err.kind(), mfx_core::ErrorKind::ProbeError);
    }

    #[tokio::test]
    async fn missing_ffprobe_is_probe_error() {
        let prober = FfprobeProber::new(PathBuf::from("/nonexistent/ffprobe_xyz"));
        let err = prober.probe(Path::new("/tmp/a.mp4")).await.unwrap_err();
        assert_eq!(err.kind(), mfx_core::ErrorKind::ProbeError);
    }

    struct FixedProber;

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, path: &Path) -> mfx_core::Result<MediaProbe> {
            let duration = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0);
            Ok(MediaProbe {
                duration,
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn probe_all_keeps_order() {
        let paths = vec![PathBuf::from("/t/3.mp4"), PathBuf::from("/t/7.mp4")];
        let probes = probe_all(&FixedProber, &paths).await.unwrap();
        let durations: Vec<f64> = probes.iter().map(|p| p.duration).collect();
        assert_eq!(durations, [3.0, 7.0]);
    }
}
