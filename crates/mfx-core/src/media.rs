//! Media-domain types shared across the MediaFX crates.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Error;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where an operation input comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "sourceType", rename_all = "lowercase")]
pub enum SourceDescriptor {
    /// Remote file fetched with HTTP GET.
    Url { value: String },
    /// Named binary payload attached to the current work item.
    Binary {
        #[serde(rename = "binaryProperty")]
        property: String,
    },
}

impl SourceDescriptor {
    pub fn url(value: impl Into<String>) -> Self {
        Self::Url {
            value: value.into(),
        }
    }

    pub fn binary(property: impl Into<String>) -> Self {
        Self::Binary {
            property: property.into(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url { value } => write!(f, "url {value}"),
            Self::Binary { property } => write!(f, "binary property \"{property}\""),
        }
    }
}

/// Untyped source as supplied by the caller.
///
/// Kept loose so that unknown `sourceType` values surface as
/// [`Error::UnsupportedSource`] instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSource {
    pub source_type: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub binary_property: Option<String>,
}

impl TryFrom<RawSource> for SourceDescriptor {
    type Error = Error;

    fn try_from(raw: RawSource) -> Result<Self, Self::Error> {
        match raw.source_type.as_str() {
            "url" => match raw.value {
                Some(value) if !value.trim().is_empty() => Ok(Self::Url { value }),
                _ => Err(Error::validation("URL source requires a non-empty value")),
            },
            "binary" => match raw.binary_property {
                Some(property) if !property.is_empty() => Ok(Self::Binary { property }),
                _ => Err(Error::validation(
                    "Binary property name is not defined for binary source.",
                )),
            },
            other => Err(Error::UnsupportedSource(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for SourceDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawSource::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Binary payloads
// ---------------------------------------------------------------------------

/// Content of a named binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadContent {
    /// Bytes held in memory.
    Bytes(Bytes),
    /// Bytes stored in a file owned by the caller.
    File(PathBuf),
}

/// A binary attachment on a work item, in or out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub content: PayloadContent,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl BinaryPayload {
    pub fn from_bytes(data: impl Into<Bytes>, file_name: Option<String>) -> Self {
        Self {
            content: PayloadContent::Bytes(data.into()),
            file_name,
            mime_type: None,
        }
    }

    /// A payload backed by a file. The file name defaults to the path's.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            content: PayloadContent::File(path),
            file_name,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// File extension (with leading dot) taken from the original file name.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .map(|e| format!(".{}", e.to_string_lossy()))
    }
}

/// Named payloads attached to a work item.
pub type Payloads = BTreeMap<String, BinaryPayload>;

// ---------------------------------------------------------------------------
// Probe results
// ---------------------------------------------------------------------------

/// Geometry of the first video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
    /// Sample aspect ratio as `num:den`.
    pub sample_aspect_ratio: String,
    /// Frame rate as reported by the prober (`num/den` or a plain number).
    pub frame_rate: String,
}

impl VideoGeometry {
    /// Whether the geometry can serve as a normalization reference.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// What a probe learned about one file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Seconds; 0 when unknown.
    pub duration: f64,
    pub has_audio: bool,
    pub video: Option<VideoGeometry>,
}

// ---------------------------------------------------------------------------
// Shared parameter enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    #[default]
    Bottom,
}

/// When a two-track mix ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixEnd {
    #[default]
    Shortest,
    Longest,
    /// Length of the primary track.
    First,
}

impl MixEnd {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shortest => "shortest",
            Self::Longest => "longest",
            Self::First => "first",
        }
    }
}

/// Audio policy for video-on-video overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioRouting {
    #[default]
    Main,
    Overlay,
    Mix,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    In,
    Out,
}

impl FadeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}
