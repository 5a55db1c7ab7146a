use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GazeError, GazeResult};

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Head region of one person in one frame, pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl HeadBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> GazeResult<Self> {
        let finite = [xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite());
        if !finite || xmin >= xmax || ymin >= ymax {
            return Err(GazeError::InvalidHeadBox { xmin, ymin, xmax, ymax });
        }
        Ok(Self { xmin, ymin, xmax, ymax })
    }

    /// Center snapped to the pixel grid with floor division.
    pub fn center(&self) -> Point {
        Point {
            x: ((self.xmin + self.xmax) / 2.0).floor() as i64,
            y: ((self.ymin + self.ymax) / 2.0).floor() as i64,
        }
    }
}

/// Camera-space gaze direction. Only `x` and `y` take part in the 2-D projection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GazeVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GazeVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonRecord {
    pub id: String,
    pub gaze: GazeVector,
    pub head_bbox: HeadBox,
}

/// Everyone detected in one frame, keyed by person id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameGazeState {
    pub frame_index: u64,
    pub persons: BTreeMap<String, PersonRecord>,
}

impl FrameGazeState {
    pub fn new(frame_index: u64) -> Self {
        Self { frame_index, persons: BTreeMap::new() }
    }

    pub fn with_person(mut self, record: PersonRecord) -> Self {
        self.persons.insert(record.id.clone(), record);
        self
    }
}

/// Seconds from the start of the video at which mutual gaze was seen.
pub type GazeEvent = f64;

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptInterval {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptInterval {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into() }
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// A transcript interval together with the gaze events attributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedInterval {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub events: Vec<GazeEvent>,
}

/// Ordered (looker, target) pair of person ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LooksAt {
    pub from: String,
    pub to: String,
}

impl LooksAt {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}
