//! SubRip (`.srt`) subtitle parsing.
//!
//! ```
//! use nightwatch_logic::subtitles::parse_srt;
//!
//! let cues = parse_srt("1\n00:00:01,000 --> 00:00:02,500\nHello?\n\n").unwrap();
//! assert_eq!(cues.cues()[0].start_ms, 1000);
//! assert_eq!(cues.cue_at(2000).map(|c| c.text.as_str()), Some("Hello?"));
//! ```
//!
//! Parsing is strict: every cue needs a timecode line and must be closed by
//! a blank line, including the last one.

use serde::{Deserialize, Serialize};

use crate::error::SubtitleError;

const ARROW: &str = " --> ";

/// One timed caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Ordered subtitle track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitles {
    cues: Vec<Subtitle>,
}

impl Subtitles {
    pub fn cues(&self) -> &[Subtitle] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// The cue showing at `elapsed_ms`, if any. End is exclusive.
    pub fn cue_at(&self, elapsed_ms: u64) -> Option<&Subtitle> {
        self.cues
            .iter()
            .find(|c| c.start_ms <= elapsed_ms && elapsed_ms < c.end_ms)
    }
}

#[derive(Default)]
struct OpenCue {
    first_line: usize,
    timing: Option<(u64, u64)>,
    text: Vec<String>,
}

/// Parse SubRip text into a subtitle track.
pub fn parse_srt(source: &str) -> Result<Subtitles, SubtitleError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut cues = Vec::new();
    let mut open: Option<OpenCue> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');

        if line.trim().is_empty() {
            if let Some(cue) = open.take() {
                let (start_ms, end_ms) = cue.timing.ok_or(SubtitleError::MissingTimecode {
                    line: cue.first_line,
                })?;
                cues.push(Subtitle {
                    start_ms,
                    end_ms,
                    text: cue.text.join("\n"),
                });
            }
            continue;
        }

        let cue = open.get_or_insert_with(|| OpenCue {
            first_line: line_no,
            ..OpenCue::default()
        });

        if cue.timing.is_none() && line.contains(ARROW) {
            cue.timing = Some(parse_timing(line, line_no)?);
        } else if cue.timing.is_none() {
            // Sequence counter before the timecode
            if line.trim().chars().all(|c| c.is_ascii_digit()) && cue.text.is_empty() {
                continue;
            }
            return Err(SubtitleError::MissingTimecode { line: line_no });
        } else if line.contains(ARROW) {
            // Next cue started without a blank line
            return Err(SubtitleError::UnterminatedCue {
                line: cue.first_line,
            });
        } else {
            cue.text.push(line.to_string());
        }
    }

    if let Some(cue) = open {
        return Err(SubtitleError::UnterminatedCue {
            line: cue.first_line,
        });
    }

    Ok(Subtitles { cues })
}

fn parse_timing(line: &str, line_no: usize) -> Result<(u64, u64), SubtitleError> {
    let malformed = || SubtitleError::MalformedTimecode {
        line: line_no,
        text: line.to_string(),
    };
    let (start, end) = line.split_once(ARROW).ok_or_else(malformed)?;
    let start = parse_timecode(start.trim()).ok_or_else(malformed)?;
    let end = parse_timecode(end.trim()).ok_or_else(malformed)?;
    if end < start {
        return Err(malformed());
    }
    Ok((start, end))
}

/// `HH:MM:SS,mmm` to milliseconds.
fn parse_timecode(text: &str) -> Option<u64> {
    let (clock, millis) = text.split_once(',')?;
    let mut parts = clock.split(':');
    let hours = number(parts.next()?, 2)?;
    let minutes = number(parts.next()?, 2)?;
    let seconds = number(parts.next()?, 2)?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let millis = number(millis, 3)?;
    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

fn number(field: &str, width: usize) -> Option<u64> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
