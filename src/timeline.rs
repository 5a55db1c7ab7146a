use crate::error::{GazeError, GazeResult};
use crate::types::GazeEvent;

/// Ascending mutual-gaze timestamps for one video.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventTimeline {
    events: Vec<GazeEvent>,
}

impl EventTimeline {
    /// Build from frames visited in strictly increasing index order.
    ///
    /// Each frame flagged `true` contributes `frame_index / frame_rate`.
    pub fn build<I>(frame_rate: f64, frames: I) -> GazeResult<Self>
    where
        I: IntoIterator<Item = (u64, bool)>,
    {
        check_frame_rate(frame_rate)?;

        let mut events = Vec::new();
        let mut previous: Option<u64> = None;
        for (frame_index, mutual) in frames {
            if let Some(prev) = previous {
                if frame_index <= prev {
                    return Err(GazeError::NonMonotonicFrames { previous: prev, current: frame_index });
                }
            }
            previous = Some(frame_index);

            if mutual {
                events.push(frame_index as f64 / frame_rate);
            }
        }

        debug_assert!(events.windows(2).all(|w| w[0] < w[1]));
        Ok(Self { events })
    }

    /// Build from frames in any order, e.g. after parallel evaluation.
    /// The same frame index may not appear twice.
    pub fn build_unordered(frame_rate: f64, mut frames: Vec<(u64, bool)>) -> GazeResult<Self> {
        frames.sort_by_key(|(idx, _)| *idx);
        if let Some(w) = frames.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(GazeError::DuplicateFrame(w[0].0));
        }
        Self::build(frame_rate, frames)
    }

    /// Adopt an event list produced elsewhere. It must already be ascending;
    /// repeated timestamps are collapsed.
    pub fn from_events(events: Vec<GazeEvent>) -> GazeResult<Self> {
        check_events(&events)?;
        let mut events = events;
        events.dedup();
        Ok(Self { events })
    }

    pub fn events(&self) -> &[GazeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn check_frame_rate(frame_rate: f64) -> GazeResult<()> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(())
    } else {
        Err(GazeError::InvalidFrameRate(frame_rate))
    }
}

/// Events must be finite and non-decreasing.
pub fn check_events(events: &[GazeEvent]) -> GazeResult<()> {
    for (index, &value) in events.iter().enumerate() {
        if !value.is_finite() {
            return Err(GazeError::InvalidEvent { index, value });
        }
        if index > 0 && value < events[index - 1] {
            return Err(GazeError::UnsortedEvents {
                index,
                previous: events[index - 1],
                current: value,
            });
        }
    }
    Ok(())
}
