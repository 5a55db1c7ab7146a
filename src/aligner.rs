//! Attribution of gaze events to transcript intervals.
//!
//! A single forward sweep over both sequences. The event cursor never moves
//! back, so an event that falls between two intervals, or before the first
//! one, is consumed without being attributed. When an event sits exactly on
//! a boundary shared by two consecutive intervals the earlier interval gets
//! it.

use crate::error::{GazeError, GazeResult};
use crate::timeline::check_events;
use crate::types::{AnnotatedInterval, GazeEvent, TranscriptInterval};

/// Sweep `events` across `intervals`.
///
/// Both inputs must be ordered: events ascending, intervals by start time.
/// Unordered input is not detected here; see [`align_checked`].
pub fn align(events: &[GazeEvent], intervals: &[TranscriptInterval]) -> Vec<AnnotatedInterval> {
    let mut cursor = 0;
    let mut out = Vec::with_capacity(intervals.len());

    for interval in intervals {
        let mut hits = Vec::new();
        while cursor < events.len() && events[cursor] <= interval.end {
            let t = events[cursor];
            if t >= interval.start {
                hits.push(t);
            }
            cursor += 1;
        }

        out.push(AnnotatedInterval {
            start: interval.start,
            end: interval.end,
            text: interval.text.clone(),
            events: hits,
        });
    }

    out
}

/// Same as [`align`], after verifying that the ordering preconditions hold.
pub fn align_checked(
    events: &[GazeEvent],
    intervals: &[TranscriptInterval],
) -> GazeResult<Vec<AnnotatedInterval>> {
    check_events(events)?;
    check_intervals(intervals)?;
    Ok(align(events, intervals))
}

pub fn check_intervals(intervals: &[TranscriptInterval]) -> GazeResult<()> {
    for (index, pair) in intervals.windows(2).enumerate() {
        if pair[1].start < pair[0].start {
            return Err(GazeError::UnsortedIntervals {
                index: index + 1,
                previous: pair[0].start,
                current: pair[1].start,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: f64, end: f64, text: &str) -> TranscriptInterval {
        TranscriptInterval::new(start, end, text)
    }

    #[test]
    fn shared_boundary_goes_to_the_earlier_interval() {
        let intervals = vec![iv(0.0, 1.0, "a"), iv(1.0, 2.0, "b")];
        let out = align(&[0.5, 1.0, 1.9], &intervals);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "a");
        assert_eq!(out[0].events, vec![0.5, 1.0]);
        assert_eq!(out[1].text, "b");
        assert_eq!(out[1].events, vec![1.9]);
    }

    #[test]
    fn every_interval_is_emitted_without_events() {
        let intervals = vec![iv(0.0, 1.0, "a"), iv(2.0, 3.0, "b"), iv(4.0, 5.0, "c")];
        let out = align(&[], &intervals);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|a| a.events.is_empty()));
        let texts: Vec<&str> = out.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn events_in_gaps_and_after_the_end_are_dropped() {
        let intervals = vec![iv(1.0, 2.0, "a"), iv(3.0, 4.0, "b")];
        let out = align(&[0.5, 1.5, 2.5, 3.5, 9.0], &intervals);
        assert_eq!(out[0].events, vec![1.5]);
        assert_eq!(out[1].events, vec![3.5]);
    }

    #[test]
    fn overlapping_intervals_never_share_an_event() {
        let intervals = vec![iv(0.0, 3.0, "a"), iv(1.0, 4.0, "b")];
        let out = align(&[0.5, 2.0, 3.5], &intervals);
        assert_eq!(out[0].events, vec![0.5, 2.0]);
        assert_eq!(out[1].events, vec![3.5]);
    }

    #[test]
    fn no_event_is_assigned_twice_or_outside_its_window() {
        let intervals: Vec<TranscriptInterval> = (0..40)
            .map(|i| {
                let start = i as f64 * 1.7;
                iv(start, start + 1.0 + (i % 3) as f64, &format!("line {}", i))
            })
            .collect();
        let events: Vec<f64> = (0..300).map(|i| i as f64 * 0.25).collect();

        let out = align(&events, &intervals);
        assert_eq!(out.len(), intervals.len());

        let mut seen: Vec<f64> = Vec::new();
        for (annotated, interval) in out.iter().zip(&intervals) {
            assert_eq!(annotated.text, interval.text);
            for &e in &annotated.events {
                assert!(interval.contains(e), "{} outside [{}, {}]", e, interval.start, interval.end);
                assert!(!seen.contains(&e), "{} assigned twice", e);
                seen.push(e);
            }
        }
    }

    #[test]
    fn checked_alignment_rejects_unsorted_intervals() {
        let intervals = vec![iv(5.0, 6.0, "late"), iv(1.0, 2.0, "early")];
        let err = align_checked(&[1.5], &intervals).unwrap_err();
        assert_eq!(err, GazeError::UnsortedIntervals { index: 1, previous: 5.0, current: 1.0 });
    }

    #[test]
    fn checked_alignment_rejects_unsorted_events() {
        let intervals = vec![iv(0.0, 6.0, "a")];
        assert!(matches!(
            align_checked(&[2.0, 1.0], &intervals),
            Err(GazeError::UnsortedEvents { index: 1, .. })
        ));
    }

    #[test]
    fn checked_alignment_matches_plain_alignment() {
        let intervals = vec![iv(0.0, 1.0, "a"), iv(1.0, 2.0, "b")];
        let events = [0.5, 1.0, 1.9];
        assert_eq!(align_checked(&events, &intervals).unwrap(), align(&events, &intervals));
    }
}
