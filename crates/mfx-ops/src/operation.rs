//! Operation descriptors as supplied by the host.
//!
//! Each work item names one operation with the `operation` tag; the rest of
//! the object carries that operation's parameters in camelCase. Every
//! optional parameter has the default the operation documents.

use mfx_core::{AudioRouting, FadeDirection, HorizontalAlign, MixEnd, SourceDescriptor, VerticalAlign};
use mfx_fonts::{FontFilter, DEFAULT_FONT_KEY};
use mfx_graph::overlay::{OverlayPosition, OverlaySize, TimeWindow};
use mfx_graph::text::TextPosition;
use serde::{Deserialize, Serialize};

/// One requested operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Operation {
    Merge(MergeParams),
    Trim(TrimParams),
    ExtractAudio(ExtractAudioParams),
    SeparateAudio(SeparateAudioParams),
    MixAudio(MixAudioParams),
    AddText(AddTextParams),
    AddSubtitle(AddSubtitleParams),
    StampImage(StampImageParams),
    OverlayVideo(OverlayVideoParams),
    TransitionApply(TransitionParams),
    #[serde(alias = "fade")]
    SingleVideoFade(FadeParams),
    ImageToVideo(ImageToVideoParams),
    ListFonts(ListFontsParams),
    UploadFont(UploadFontParams),
    DeleteFont(FontKeyParams),
    ValidateFontKey(FontKeyParams),
    FontInfo(FontKeyParams),
}

impl Operation {
    /// The operation's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Merge(_) => "merge",
            Self::Trim(_) => "trim",
            Self::ExtractAudio(_) => "extractAudio",
            Self::SeparateAudio(_) => "separateAudio",
            Self::MixAudio(_) => "mixAudio",
            Self::AddText(_) => "addText",
            Self::AddSubtitle(_) => "addSubtitle",
            Self::StampImage(_) => "stampImage",
            Self::OverlayVideo(_) => "overlayVideo",
            Self::TransitionApply(_) => "transitionApply",
            Self::SingleVideoFade(_) => "singleVideoFade",
            Self::ImageToVideo(_) => "imageToVideo",
            Self::ListFonts(_) => "listFonts",
            Self::UploadFont(_) => "uploadFont",
            Self::DeleteFont(_) => "deleteFont",
            Self::ValidateFontKey(_) => "validateFontKey",
            Self::FontInfo(_) => "fontInfo",
        }
    }
}

fn mp4() -> String {
    "mp4".into()
}

fn mp3() -> String {
    "mp3".into()
}

fn copy() -> String {
    "copy".into()
}

fn bitrate() -> String {
    "192k".into()
}

fn one() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Media operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeParams {
    pub sources: Vec<SourceDescriptor>,
    #[serde(default = "mp4")]
    pub output_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimParams {
    pub source: SourceDescriptor,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractAudioParams {
    pub source: SourceDescriptor,
    #[serde(default = "mp3")]
    pub format: String,
    #[serde(default = "copy")]
    pub codec: String,
    #[serde(default = "bitrate")]
    pub bitrate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeparateAudioParams {
    pub source: SourceDescriptor,
    #[serde(default = "mp4")]
    pub video_format: String,
    #[serde(default = "mp3")]
    pub audio_format: String,
    #[serde(default = "copy")]
    pub codec: String,
    #[serde(default = "bitrate")]
    pub bitrate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixAudioParams {
    pub video: SourceDescriptor,
    pub audio: SourceDescriptor,
    #[serde(default = "one")]
    pub video_volume: f64,
    #[serde(default = "one")]
    pub audio_volume: f64,
    #[serde(default)]
    pub match_length: MixEnd,
    /// Place the secondary track in a window instead of mixing throughout.
    #[serde(default)]
    pub partial: Option<PartialMixParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialMixParams {
    pub start_time: f64,
    /// Window length; `None` or zero uses the secondary track's length.
    pub duration: Option<f64>,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub enable_fade_in: bool,
    pub fade_in_duration: f64,
    pub enable_fade_out: bool,
    pub fade_out_duration: f64,
}

impl Default for PartialMixParams {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            duration: None,
            looped: false,
            enable_fade_in: false,
            fade_in_duration: 1.0,
            enable_fade_out: false,
            fade_out_duration: 1.0,
        }
    }
}

/// Alignment-based or raw-expression placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    #[default]
    Alignment,
    Custom,
}

/// Placement parameters shared by text and overlay operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionParams {
    #[serde(alias = "positionMode")]
    pub position_type: PositionType,
    pub horizontal_align: Option<HorizontalAlign>,
    pub vertical_align: Option<VerticalAlign>,
    /// Fallback for both paddings.
    pub padding: Option<f64>,
    pub padding_x: Option<f64>,
    pub padding_y: Option<f64>,
    pub x: Option<String>,
    pub y: Option<String>,
}

impl PositionParams {
    fn paddings(&self, default: f64) -> (f64, f64) {
        let base = self.padding.unwrap_or(default);
        (self.padding_x.unwrap_or(base), self.padding_y.unwrap_or(base))
    }

    /// Text placement; custom positions fall back to the given expressions.
    pub fn text_position(&self, default_y: &str) -> TextPosition {
        match self.position_type {
            PositionType::Alignment => {
                let (padding_x, padding_y) = self.paddings(20.0);
                TextPosition::Align {
                    horizontal: self.horizontal_align.unwrap_or_default(),
                    vertical: self.vertical_align.unwrap_or(VerticalAlign::Bottom),
                    padding_x,
                    padding_y,
                }
            }
            PositionType::Custom => TextPosition::Custom {
                x: non_empty(&self.x).unwrap_or("(w-text_w)/2").to_string(),
                y: non_empty(&self.y).unwrap_or(default_y).to_string(),
            },
        }
    }

    pub fn overlay_position(&self) -> OverlayPosition {
        match self.position_type {
            PositionType::Alignment => {
                let (padding_x, padding_y) = self.paddings(0.0);
                OverlayPosition::Align {
                    horizontal: self.horizontal_align.unwrap_or_default(),
                    vertical: self.vertical_align.unwrap_or(VerticalAlign::Middle),
                    padding_x,
                    padding_y,
                }
            }
            PositionType::Custom => OverlayPosition::Custom {
                x: non_empty(&self.x).unwrap_or("0").to_string(),
                y: non_empty(&self.y).unwrap_or("0").to_string(),
            },
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Font and colour for drawn text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyleParams {
    pub font_key: String,
    pub size: u32,
    pub color: String,
    #[serde(flatten)]
    pub position: PositionParams,
}

impl Default for TextStyleParams {
    fn default() -> Self {
        Self {
            font_key: DEFAULT_FONT_KEY.into(),
            size: 48,
            color: "white".into(),
            position: PositionParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTextParams {
    pub source: SourceDescriptor,
    pub text: String,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default = "default_text_end")]
    pub end_time: f64,
    #[serde(default, flatten)]
    pub style: TextStyleParams,
}

fn default_text_end() -> f64 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSubtitleParams {
    pub source: SourceDescriptor,
    /// SubRip file.
    pub subtitle: SourceDescriptor,
    #[serde(default, flatten)]
    pub style: TextStyleParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampImageParams {
    pub source: SourceDescriptor,
    pub image: SourceDescriptor,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl StampImageParams {
    pub fn window(&self) -> Option<TimeWindow> {
        time_window(self.start_time, self.end_time)
    }
}

/// How the overlay video is scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    #[default]
    Percentage,
    Pixels,
    Original,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightMode {
    #[default]
    Auto,
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizeParams {
    pub size_mode: SizeMode,
    pub width_percent: f64,
    pub height_mode: HeightMode,
    pub height_percent: f64,
    pub width_pixels: i64,
    pub height_pixels: i64,
}

impl Default for SizeParams {
    fn default() -> Self {
        Self {
            size_mode: SizeMode::Percentage,
            width_percent: 50.0,
            height_mode: HeightMode::Auto,
            height_percent: 50.0,
            width_pixels: -1,
            height_pixels: -1,
        }
    }
}

impl SizeParams {
    pub fn overlay_size(&self) -> OverlaySize {
        match self.size_mode {
            SizeMode::Percentage => OverlaySize::Percentage {
                width: self.width_percent,
                height: match self.height_mode {
                    HeightMode::Auto => None,
                    HeightMode::Percentage => Some(self.height_percent),
                },
            },
            SizeMode::Pixels => OverlaySize::Pixels {
                width: self.width_pixels,
                height: self.height_pixels,
            },
            SizeMode::Original => OverlaySize::Original,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayVideoParams {
    pub source: SourceDescriptor,
    pub overlay: SourceDescriptor,
    #[serde(default, flatten)]
    pub position: PositionParams,
    #[serde(default, flatten)]
    pub size: SizeParams,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default, alias = "audioHandling")]
    pub audio: AudioRouting,
    #[serde(default = "one")]
    pub main_volume: f64,
    #[serde(default = "one")]
    pub overlay_volume: f64,
    #[serde(default = "mp4")]
    pub output_format: String,
}

impl OverlayVideoParams {
    pub fn window(&self) -> Option<TimeWindow> {
        time_window(self.start_time, self.end_time)
    }
}

fn time_window(start: Option<f64>, end: Option<f64>) -> Option<TimeWindow> {
    if start.is_none() && end.is_none() {
        return None;
    }
    Some(TimeWindow {
        start: start.unwrap_or(0.0).max(0.0),
        end: end.filter(|e| *e > 0.0),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionParams {
    pub sources: Vec<SourceDescriptor>,
    #[serde(default = "default_transition")]
    pub transition: String,
    #[serde(default = "one")]
    pub duration: f64,
    #[serde(default = "mp4")]
    pub output_format: String,
}

fn default_transition() -> String {
    "fade".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FadeParams {
    pub source: SourceDescriptor,
    pub effect: FadeDirection,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default = "one")]
    pub duration: f64,
    #[serde(default = "mp4")]
    pub output_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageToVideoParams {
    pub source: SourceDescriptor,
    pub duration: f64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "mp4")]
    pub output_format: String,
}

// ---------------------------------------------------------------------------
// Font operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListFontsParams {
    pub filter: FontFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFontParams {
    pub font_key: String,
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Payload holding the font file.
    #[serde(default = "default_binary_property")]
    pub binary_property: String,
}

fn default_binary_property() -> String {
    "data".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontKeyParams {
    pub font_key: String,
}
