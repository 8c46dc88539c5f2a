//! Timed text burned onto video with drawtext.

use std::path::{Path, PathBuf};

use mfx_core::{Error, HorizontalAlign, Result, VerticalAlign};

use crate::escape;
use crate::graph::{Chain, Filter, FilterGraph, Pad};
use crate::invocation::{Input, Invocation};

/// Where text is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPosition {
    Align {
        horizontal: HorizontalAlign,
        vertical: VerticalAlign,
        padding_x: f64,
        padding_y: f64,
    },
    /// Raw position expressions in the engine's expression language.
    Custom { x: String, y: String },
}

impl Default for TextPosition {
    fn default() -> Self {
        Self::Align {
            horizontal: HorizontalAlign::Center,
            vertical: VerticalAlign::Bottom,
            padding_x: 20.0,
            padding_y: 20.0,
        }
    }
}

impl TextPosition {
    /// x and y expressions, referencing frame (`w`, `h`) and text extents.
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
                    HorizontalAlign::Center => "(w-text_w)/2".to_string(),
                    HorizontalAlign::Right => format!("w-text_w-{padding_x}"),
                };
                let y = match vertical {
                    VerticalAlign::Top => padding_y.to_string(),
                    VerticalAlign::Middle => "(h-text_h)/2".to_string(),
                    VerticalAlign::Bottom => format!("h-text_h-{padding_y}"),
                };
                (x, y)
            }
            Self::Custom { x, y } => (escape::expr(x), escape::expr(y)),
        }
    }
}

/// Visual style shared by every entry of one overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_file: PathBuf,
    pub size: u32,
    pub color: String,
    pub position: TextPosition,
    /// Semi-transparent box behind the text, as used for subtitles.
    pub boxed: bool,
}

/// One piece of text shown during `[start, end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedText {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

pub fn drawtext(entry: &TimedText, style: &TextStyle) -> Filter {
    let (x, y) = style.position.expressions();
    let mut f = Filter::new("drawtext")
        .arg("fontfile", escape::text(&style.font_file.to_string_lossy()))
        .arg("text", escape::text(&entry.text))
        .arg("fontsize", style.size)
        .arg("fontcolor", escape::text(&style.color));
    if style.boxed {
        f = f
            .arg("box", 1)
            .arg("boxcolor", "black@0.5")
            .arg("boxborderw", 5);
    }
    f.arg("x", x)
        .arg("y", y)
        .arg("enable", escape::between(entry.start, entry.end))
}

/// Build one drawtext stage per entry over the first video stream.
pub fn build_text_overlay(
    video: &Path,
    entries: &[TimedText],
    style: &TextStyle,
    output: &Path,
) -> Result<Invocation> {
    if entries.is_empty() {
        return Err(Error::validation("no text entries to draw"));
    }
    for entry in entries {
        if !(entry.end > entry.start) {
            return Err(Error::validation(format!(
                "text end time {} must be after start time {}",
                entry.end, entry.start
            )));
        }
    }

    let mut inv = Invocation::new(output);
    let main = inv.input(Input::file(video));

    let chain = entries
        .iter()
        .map(|e| drawtext(e, style))
        .fold(Chain::new().input(Pad::video(main)), Chain::filter)
        .output("vout");
    let mut graph = FilterGraph::new();
    graph.push(chain)?;

    inv.set_graph(graph);
    inv.map("[vout]").map(format!("{main}:a?"));
    inv.output_args(["-c:a", "copy"]);
    Ok(inv)
}
