use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GazeError;
use crate::evaluator::FrameEvaluation;
use crate::timeline::EventTimeline;
use crate::transcript::{format_timestamp, parse_timestamp};
use crate::types::{AnnotatedInterval, GazeEvent};

/// One entry of the aligned-transcript file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub start_time: String,
    pub end_time: String,
    pub text: String,
    pub gaze_events: Vec<GazeEvent>,
}

impl From<&AnnotatedInterval> for AlignedRecord {
    fn from(a: &AnnotatedInterval) -> Self {
        Self {
            start_time: format_timestamp(a.start),
            end_time: format_timestamp(a.end),
            text: a.text.clone(),
            gaze_events: a.events.clone(),
        }
    }
}

impl TryFrom<AlignedRecord> for AnnotatedInterval {
    type Error = GazeError;

    fn try_from(r: AlignedRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            start: parse_timestamp(&r.start_time)?,
            end: parse_timestamp(&r.end_time)?,
            text: r.text,
            events: r.gaze_events,
        })
    }
}

/// Pretty JSON with four-space indentation.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    write_pretty(&mut buf, value)?;
    Ok(String::from_utf8(buf)?)
}

fn write_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser)?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))
}

// =========================================================================
// Gaze events file: ascending array of seconds
// =========================================================================

pub fn write_gaze_events(path: &Path, timeline: &EventTimeline) -> Result<()> {
    write_json(path, timeline.events())?;
    info!("Saved {} gaze events to {}", timeline.len(), path.display());
    Ok(())
}

pub fn read_gaze_events(path: &Path) -> Result<EventTimeline> {
    let events: Vec<GazeEvent> = read_json(path)?;
    EventTimeline::from_events(events).with_context(|| format!("invalid gaze events in {}", path.display()))
}

// =========================================================================
// Aligned transcript file
// =========================================================================

pub fn write_aligned(path: &Path, aligned: &[AnnotatedInterval]) -> Result<()> {
    let records: Vec<AlignedRecord> = aligned.iter().map(AlignedRecord::from).collect();
    write_json(path, &records)?;
    info!("Saved aligned transcript ({} lines) to {}", records.len(), path.display());
    Ok(())
}

pub fn read_aligned(path: &Path) -> Result<Vec<AnnotatedInterval>> {
    let records: Vec<AlignedRecord> = read_json(path)?;
    records
        .into_iter()
        .map(|r| AnnotatedInterval::try_from(r).map_err(anyhow::Error::from))
        .collect()
}

/// Per-frame looks-at relations, for inspection.
pub fn write_relations(path: &Path, evaluations: &[FrameEvaluation]) -> Result<()> {
    write_json(path, evaluations)?;
    info!("Saved relations for {} frames to {}", evaluations.len(), path.display());
    Ok(())
}
