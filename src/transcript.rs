use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::error::{GazeError, GazeResult};
use crate::types::TranscriptInterval;

fn id_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("id pattern"))
}

fn time_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})").expect("time line pattern")
    })
}

fn timestamp() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3})$").expect("timestamp pattern"))
}

// =========================================================================
// Timestamp codec: "HH:MM:SS,mmm" <-> seconds
// =========================================================================

pub fn parse_timestamp(text: &str) -> GazeResult<f64> {
    let caps = timestamp()
        .captures(text)
        .ok_or_else(|| GazeError::InvalidTimestamp(text.to_string()))?;
    let field = |i: usize| -> GazeResult<u64> {
        caps[i]
            .parse::<u64>()
            .map_err(|_| GazeError::InvalidTimestamp(text.to_string()))
    };
    let whole = field(1)? * 3600 + field(2)? * 60 + field(3)?;
    Ok(whole as f64 + field(4)? as f64 / 1000.0)
}

/// Format seconds as `HH:MM:SS,mmm`, rounded to the millisecond.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_s / 3600,
        (total_s / 60) % 60,
        total_s % 60,
        ms
    )
}

// =========================================================================
// SRT Parsing
// =========================================================================

#[derive(Debug, Default)]
struct RawBlock {
    id: Option<String>,
    time: Option<String>,
    bad_time: Option<String>,
    text: Option<String>,
}

impl RawBlock {
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.time.is_none() && self.bad_time.is_none() && self.text.is_none()
    }

    fn label(&self, position: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("#{}", position + 1))
    }

    fn into_interval(self, position: usize) -> GazeResult<TranscriptInterval> {
        let block = self.label(position);
        let malformed = |reason: String| GazeError::MalformedInterval { block: block.clone(), reason };

        let time = match (self.time, self.bad_time) {
            (Some(t), _) => t,
            (None, Some(bad)) => return Err(malformed(format!("unrecognised timestamp line '{}'", bad))),
            (None, None) => return Err(malformed("no timestamp line".to_string())),
        };

        let caps = time_line()
            .captures(&time)
            .ok_or_else(|| malformed(format!("unrecognised timestamp line '{}'", time)))?;
        let start = parse_timestamp(&caps[1]).map_err(|e| malformed(e.to_string()))?;
        let end = parse_timestamp(&caps[2]).map_err(|e| malformed(e.to_string()))?;
        if start >= end {
            return Err(malformed(format!("start {} is not before end {}", &caps[1], &caps[2])));
        }

        Ok(TranscriptInterval::new(start, end, self.text.unwrap_or_default()))
    }
}

/// Parsed transcript plus the blocks that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub intervals: Vec<TranscriptInterval>,
    pub skipped: Vec<GazeError>,
}

impl Transcript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("transcript not found at {}", path.display()))?;
        let transcript = parse_srt(&content);
        info!(
            "Loaded transcript {} ({} blocks, {} skipped)",
            path.display(),
            transcript.intervals.len(),
            transcript.skipped.len()
        );
        Ok(transcript)
    }
}

/// Parse SRT-style text.
///
/// A digits-only line opens a new block, a `start --> end` line sets the
/// block's time range and every other non-empty line is appended to the
/// block text with a single space. Blocks without a usable time range are
/// dropped and reported in `skipped`.
pub fn parse_srt(content: &str) -> Transcript {
    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut current = RawBlock::default();

    for line in content.lines() {
        let line = line.trim_start_matches('\u{feff}').trim();

        if id_line().is_match(line) {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current.id = Some(line.to_string());
        } else if time_line().is_match(line) {
            current.time = Some(line.to_string());
        } else if line.contains("-->") && current.time.is_none() && current.text.is_none() {
            current.bad_time = Some(line.to_string());
        } else if !line.is_empty() {
            current.text = Some(match current.text.take() {
                Some(text) => format!("{} {}", text, line),
                None => line.to_string(),
            });
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let mut transcript = Transcript::default();
    for (position, block) in blocks.into_iter().enumerate() {
        match block.into_interval(position) {
            Ok(interval) => transcript.intervals.push(interval),
            Err(e) => {
                warn!("Dropping {}", e);
                transcript.skipped.push(e);
            }
        }
    }
    transcript
}
