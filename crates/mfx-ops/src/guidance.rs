//! Engine diagnostics to user guidance.
//!
//! A failed engine run surfaces the raw stderr. Before it reaches the caller
//! the message is prefixed with the operation's own sentence and, when a
//! known diagnostic is present, a hint about the likely cause.

use mfx_core::Error;

/// Known diagnostic substrings and their hints, most specific first.
const PATTERNS: &[(&[&str], &str)] = &[
    (
        &["No such filter: 'xfade'"],
        "Your FFmpeg version does not support the 'xfade' filter (requires FFmpeg 4.3+). \
         Please upgrade FFmpeg or use a basic transition like 'fade'.",
    ),
    (
        &["No such filter"],
        "Your FFmpeg build is missing a filter required by this operation.",
    ),
    (
        &["Cannot find color"],
        "An invalid color was specified. Please use a valid color name (e.g., 'yellow') \
         or a hex code (e.g., 'FFFFFF').",
    ),
    (
        &[
            "Cannot find a matching stream for unlabeled",
            "matches no streams",
        ],
        "A source file does not contain an audio stream.",
    ),
    (
        &["Invalid argument"],
        "Invalid parameters for this FFmpeg version.",
    ),
    (
        &["font", "Fontconfig"],
        "There was an issue with the specified font. Please check the font key and \
         ensure the font file is available.",
    ),
];

/// Hint for the first pattern found in `diagnostics`.
pub fn hint_for(diagnostics: &str) -> Option<&'static str> {
    PATTERNS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| diagnostics.contains(n)))
        .map(|(_, hint)| *hint)
}

/// Generic sentence each operation reports on engine failure.
pub fn generic_message(operation: &str) -> &'static str {
    match operation {
        "merge" => "Error merging videos. Please ensure all source videos are valid.",
        "trim" => {
            "Error trimming video. Please check that start and end times are valid and \
             within the video's duration."
        }
        "extractAudio" => {
            "Error extracting audio. Please ensure the source video contains an audio track."
        }
        "separateAudio" => {
            "Error separating audio from video. Please ensure the source video contains \
             both video and audio tracks."
        }
        "imageToVideo" => {
            "Error converting image to video. Please ensure the source image is valid."
        }
        "stampImage" => "Error stamping image on video. Please check source files and stamp options.",
        "addText" => {
            "Error adding text overlay. Please check all text style options (e.g., color, \
             size, position)."
        }
        "addSubtitle" => "Error burning subtitles. Please check subtitle file and style options.",
        "overlayVideo" => "Failed to overlay video.",
        "mixAudio" => "Error mixing audio.",
        "transitionApply" => "Error applying transition.",
        "singleVideoFade" => {
            "Error applying fade effect. Please check the effect parameters (start time, \
             duration)."
        }
        _ => "Error running FFmpeg.",
    }
}

/// Rewrap an engine failure as [`Error::Operation`] with guidance.
///
/// Errors that did not come from the engine pass through unchanged.
pub fn enrich(operation: &str, err: Error) -> Error {
    let diagnostics = match &err {
        Error::Tool { message, .. } => message.clone(),
        _ => return err,
    };
    let mut message = generic_message(operation).to_string();
    if let Some(hint) = hint_for(&diagnostics) {
        message.push(' ');
        message.push_str(hint);
    }
    message.push_str(" FFmpeg error: ");
    message.push_str(&diagnostics);
    Error::operation(operation, message)
}
