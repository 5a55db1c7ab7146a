use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{GazeError, GazeResult};
use crate::types::{FrameGazeState, GazeVector, HeadBox, PersonRecord};

/// One person as written by the gaze estimator. Either field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerson {
    #[serde(default)]
    pub gaze: Option<Vec<f64>>,
    #[serde(default)]
    pub head_bbox: Option<Vec<f64>>,
}

/// All persons of one frame as written by the gaze estimator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFrame {
    pub persons: BTreeMap<String, Option<RawPerson>>,
}

impl RawFrame {
    /// Type one frame of the feed. A value of the wrong shape is reported
    /// as `MissingData` for that frame only.
    pub fn from_value(value: &Value, frame_index: u64) -> GazeResult<Self> {
        RawFrame::deserialize(value).map_err(|e| GazeError::MissingData {
            frame: frame_index.to_string(),
            reason: format!("malformed frame record: {}", e),
        })
    }

    /// Validate every person record. A single incomplete record rejects the
    /// whole frame.
    pub fn to_state(&self, frame_index: u64) -> GazeResult<FrameGazeState> {
        let missing = |reason: String| GazeError::MissingData {
            frame: frame_index.to_string(),
            reason,
        };

        let mut state = FrameGazeState::new(frame_index);
        for (id, raw) in &self.persons {
            let raw = raw.as_ref().ok_or_else(|| missing(format!("{}: empty record", id)))?;

            let gaze = match raw.gaze.as_deref() {
                Some(g) if g.len() >= 2 && g.iter().all(|v| v.is_finite()) => {
                    GazeVector::new(g[0], g[1], g.get(2).copied().unwrap_or(0.0))
                }
                Some(_) => return Err(missing(format!("{}: malformed gaze", id))),
                None => return Err(missing(format!("{}: no gaze", id))),
            };

            let head_bbox = match raw.head_bbox.as_deref() {
                Some([xmin, ymin, xmax, ymax]) => HeadBox::new(*xmin, *ymin, *xmax, *ymax)
                    .map_err(|e| missing(format!("{}: {}", id, e)))?,
                Some(_) => return Err(missing(format!("{}: head_bbox needs 4 values", id))),
                None => return Err(missing(format!("{}: no head_bbox", id))),
            };

            state = state.with_person(PersonRecord { id: id.clone(), gaze, head_bbox });
        }
        Ok(state)
    }
}

// =========================================================================
// Gaze Feed
// JSON object keyed by frame-number string. `null` marks a frame without
// detections. Frame values stay untyped until evaluated so one bad record
// only costs its own frame.
// =========================================================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GazeFeed {
    frames: BTreeMap<String, Value>,
}

impl GazeFeed {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("gaze feed not found at {}", path.display()))?;
        let feed: GazeFeed = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse gaze feed {}", path.display()))?;
        info!("Loaded gaze feed {} ({} frames)", path.display(), feed.len());
        Ok(feed)
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.frames.get(key).filter(|v| !v.is_null())
    }

    /// Frame keys that parse as frame numbers, in ascending numeric order.
    pub fn frame_numbers(&self) -> Vec<(u64, String)> {
        let mut numbers: Vec<(u64, String)> = self
            .frames
            .keys()
            .filter_map(|k| k.parse::<u64>().ok().map(|n| (n, k.clone())))
            .collect();
        numbers.sort();
        numbers
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
