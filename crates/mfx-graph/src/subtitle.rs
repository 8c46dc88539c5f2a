//! SubRip (`.srt`) parsing.

use mfx_core::{Error, Result};

use crate::text::TimedText;

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub index: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<&SubtitleEntry> for TimedText {
    fn from(entry: &SubtitleEntry) -> Self {
        TimedText {
            text: entry.text.clone(),
            start: entry.start,
            end: entry.end,
        }
    }
}

/// Parse `HH:MM:SS,mmm` (a `.` separator is accepted too) into seconds.
pub fn parse_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    let (hms, millis) = s.split_once([',', '.']).unwrap_or((s, "0"));
    let mut parts = hms.split(':');
    let h: u64 = parts.next()?.trim().parse().ok()?;
    let m: u64 = parts.next()?.trim().parse().ok()?;
    let sec: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || m >= 60 || sec >= 60 {
        return None;
    }
    let millis: u64 = millis.trim().parse().ok()?;
    Some((h * 3600 + m * 60 + sec) as f64 + millis as f64 / 1000.0)
}

fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    // Positioning hints may follow the end timestamp.
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Parse SubRip content.
///
/// Blocks without a valid timing line are skipped. Content yielding no cues
/// at all is an error.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut entries = Vec::new();

    for block in content.split("\n\n") {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim_end)
            .skip_while(|l| l.is_empty())
            .collect();
        let Some(timing_at) = lines.iter().position(|l| l.contains("-->")) else {
            continue;
        };
        let Some((start, end)) = parse_timing(lines[timing_at]) else {
            tracing::debug!("skipping subtitle block with bad timing: {}", lines[timing_at]);
            continue;
        };
        let index = timing_at
            .checked_sub(1)
            .and_then(|i| lines[i].trim().parse().ok())
            .unwrap_or(entries.len() as u32 + 1);
        let text = lines[timing_at + 1..]
            .iter()
            .copied()
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        entries.push(SubtitleEntry {
            index,
            start,
            end,
            text,
        });
    }

    if entries.is_empty() {
        return Err(Error::validation("Could not parse SRT file or it is empty."));
    }
    Ok(entries)
}
