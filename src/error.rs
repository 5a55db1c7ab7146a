use thiserror::Error;

/// Errors raised by the detection and alignment core.
///
/// `MissingData` and `MalformedInterval` are per-unit failures: callers skip
/// the frame or transcript block and keep going. The rest are violated
/// invariants and abort whatever operation produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GazeError {
    #[error("frame {frame}: no usable data ({reason})")]
    MissingData { frame: String, reason: String },

    #[error("transcript block {block}: {reason}")]
    MalformedInterval { block: String, reason: String },

    #[error("invalid timestamp '{0}', expected HH:MM:SS,mmm")]
    InvalidTimestamp(String),

    #[error("invalid head box [{xmin}, {ymin}, {xmax}, {ymax}]")]
    InvalidHeadBox { xmin: f64, ymin: f64, xmax: f64, ymax: f64 },

    #[error("frame rate must be positive and finite, got {0}")]
    InvalidFrameRate(f64),

    #[error("frame indices must be strictly increasing: {current} follows {previous}")]
    NonMonotonicFrames { previous: u64, current: u64 },

    #[error("frame {0} was evaluated more than once")]
    DuplicateFrame(u64),

    #[error("gaze event at position {index} is not a finite timestamp ({value})")]
    InvalidEvent { index: usize, value: f64 },

    #[error("gaze events must be non-decreasing: {current} at position {index} follows {previous}")]
    UnsortedEvents { index: usize, previous: f64, current: f64 },

    #[error("transcript intervals must be sorted by start: interval {index} starts at {current} before {previous}")]
    UnsortedIntervals { index: usize, previous: f64, current: f64 },
}

pub type GazeResult<T> = std::result::Result<T, GazeError>;
