use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::detections::RawFrame;
use crate::error::GazeError;
use crate::geometry::{GazeRay, DEFAULT_GAZE_LENGTH};
use crate::types::{FrameGazeState, LooksAt};

/// The two people whose mutual gaze is reported on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOfInterest {
    pub first: String,
    pub second: String,
}

impl Default for PairOfInterest {
    fn default() -> Self {
        Self {
            first: "person_0".to_string(),
            second: "person_1".to_string(),
        }
    }
}

impl PairOfInterest {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self { first: first.into(), second: second.into() }
    }

    /// Both directed relations between the pair must be present.
    pub fn is_mutual(&self, looks_at: &BTreeSet<LooksAt>) -> bool {
        looks_at.contains(&LooksAt::new(&self.first, &self.second))
            && looks_at.contains(&LooksAt::new(&self.second, &self.first))
    }
}

/// Everything learned from one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameEvaluation {
    pub frame_index: u64,
    pub looks_at: BTreeSet<LooksAt>,
    pub mutual: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Evaluated(FrameEvaluation),
    NoData { frame_index: u64, error: GazeError },
}

impl FrameOutcome {
    pub fn frame_index(&self) -> u64 {
        match self {
            FrameOutcome::Evaluated(e) => e.frame_index,
            FrameOutcome::NoData { frame_index, .. } => *frame_index,
        }
    }

    pub fn is_mutual(&self) -> bool {
        matches!(self, FrameOutcome::Evaluated(e) if e.mutual)
    }
}

// =========================================================================
// Frame Gaze Evaluator
// =========================================================================
#[derive(Debug, Clone)]
pub struct FrameGazeEvaluator {
    gaze_length: f64,
    pair: PairOfInterest,
}

impl Default for FrameGazeEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_GAZE_LENGTH, PairOfInterest::default())
    }
}

impl FrameGazeEvaluator {
    pub fn new(gaze_length: f64, pair: PairOfInterest) -> Self {
        Self { gaze_length, pair }
    }

    pub fn pair(&self) -> &PairOfInterest {
        &self.pair
    }

    pub fn evaluate(&self, frame: &FrameGazeState) -> FrameEvaluation {
        let mut looks_at = BTreeSet::new();

        for (id, person) in &frame.persons {
            let ray = GazeRay::from_head(&person.head_bbox, &person.gaze, self.gaze_length);
            for (other_id, other) in &frame.persons {
                if other_id == id {
                    continue;
                }
                if ray.hits(&other.head_bbox) {
                    debug!("frame {}: {} looks at {}", frame.frame_index, id, other_id);
                    looks_at.insert(LooksAt::new(id, other_id));
                }
            }
        }

        let mutual = self.pair.is_mutual(&looks_at);
        FrameEvaluation {
            frame_index: frame.frame_index,
            looks_at,
            mutual,
        }
    }

    /// Evaluate one entry of the detection feed. Absent or malformed entries
    /// and entries with incomplete person records come back as `NoData`.
    pub fn evaluate_entry(&self, frame_index: u64, entry: Option<&Value>) -> FrameOutcome {
        let state = match entry {
            Some(value) => RawFrame::from_value(value, frame_index).and_then(|raw| raw.to_state(frame_index)),
            None => Err(GazeError::MissingData {
                frame: frame_index.to_string(),
                reason: "no entry in gaze feed".to_string(),
            }),
        };

        match state {
            Ok(state) => FrameOutcome::Evaluated(self.evaluate(&state)),
            Err(error) => {
                debug!("skipping frame {}: {}", frame_index, error);
                FrameOutcome::NoData { frame_index, error }
            }
        }
    }
}
