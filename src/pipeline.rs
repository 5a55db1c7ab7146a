use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::detections::GazeFeed;
use crate::evaluator::{FrameEvaluation, FrameGazeEvaluator, FrameOutcome};
use crate::frames::{FrameRef, FrameSource};
use crate::timeline::EventTimeline;

/// Result of running detection over one video.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub frames_total: usize,
    pub frames_skipped: usize,
    pub mutual_frames: usize,
    pub evaluations: Vec<FrameEvaluation>,
    pub timeline: EventTimeline,
}

impl DetectionReport {
    pub fn frames_evaluated(&self) -> usize {
        self.frames_total - self.frames_skipped
    }
}

pub struct DetectionPipeline {
    evaluator: FrameGazeEvaluator,
    parallel: bool,
}

impl DetectionPipeline {
    pub fn new(evaluator: FrameGazeEvaluator, parallel: bool) -> Self {
        Self { evaluator, parallel }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            FrameGazeEvaluator::new(config.gaze_length, config.pair.clone()),
            config.parallel,
        )
    }

    pub fn name(&self) -> String {
        let pair = self.evaluator.pair();
        format!(
            "Mutual gaze {} <-> {}{}",
            pair.first,
            pair.second,
            if self.parallel { " (parallel)" } else { "" }
        )
    }

    /// Outcomes come back in the order of `frames`.
    pub fn evaluate_frames(&self, frames: &[FrameRef], feed: &GazeFeed) -> Vec<FrameOutcome> {
        let eval = |f: &FrameRef| self.evaluator.evaluate_entry(f.index, feed.get(&f.key));
        if self.parallel {
            frames.par_iter().map(eval).collect()
        } else {
            frames.iter().map(eval).collect()
        }
    }

    pub fn run(&self, source: &dyn FrameSource, feed: &GazeFeed, frame_rate: f64) -> Result<DetectionReport> {
        info!("Active pipeline: {} over {}", self.name(), source.name());
        let frames = source.frames()?;
        let outcomes = self.evaluate_frames(&frames, feed);

        let flags: Vec<(u64, bool)> = outcomes.iter().map(|o| (o.frame_index(), o.is_mutual())).collect();
        let timeline = if self.parallel {
            EventTimeline::build_unordered(frame_rate, flags)?
        } else {
            EventTimeline::build(frame_rate, flags)?
        };

        let mut evaluations = Vec::with_capacity(outcomes.len());
        let mut frames_skipped = 0;
        for outcome in outcomes {
            match outcome {
                FrameOutcome::Evaluated(e) => evaluations.push(e),
                FrameOutcome::NoData { .. } => frames_skipped += 1,
            }
        }
        let mutual_frames = evaluations.iter().filter(|e| e.mutual).count();
        debug!("{} frames without data", frames_skipped);

        Ok(DetectionReport {
            frames_total: frames.len(),
            frames_skipped,
            mutual_frames,
            evaluations,
            timeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FeedFrames;

    const FEED: &str = r#"{
        "0": {
            "person_0": {"gaze": [-1.0, 0.0, 0.0], "head_bbox": [100, 100, 200, 200]},
            "person_1": {"gaze": [1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
        },
        "1": {
            "person_0": {"gaze": [-1.0, 0.0, 0.0], "head_bbox": [100, 100, 200, 200]},
            "person_1": {"gaze": [-1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
        },
        "2": {
            "person_0": {"gaze": [-1.0, 0.0, 0.0], "head_bbox": [100, 100, 200, 200]},
            "person_1": {"gaze": [1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
        },
        "3": null,
        "4": {
            "person_0": {"gaze": [-1.0, 0.0, 0.0]},
            "person_1": {"gaze": [1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
        }
    }"#;

    #[test]
    fn runs_feed_into_timeline() {
        let feed = GazeFeed::from_json_str(FEED).unwrap();
        let pipeline = DetectionPipeline::from_config(&DetectionConfig::default());
        let report = pipeline.run(&FeedFrames::new(&feed), &feed, 10.0).unwrap();

        assert_eq!(report.frames_total, 5);
        assert_eq!(report.frames_skipped, 2);
        assert_eq!(report.frames_evaluated(), 3);
        assert_eq!(report.mutual_frames, 2);
        assert_eq!(report.timeline.events(), &[0.0, 0.2]);
    }

    #[test]
    fn malformed_frames_are_skipped_and_good_frames_still_count() {
        let feed = GazeFeed::from_json_str(
            r#"{
                "0": {
                    "person_0": {"gaze": [-1.0, 0.0, 0.0], "head_bbox": [100, 100, 200, 200]},
                    "person_1": {"gaze": [1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
                },
                "1": {
                    "person_0": {"gaze": [-1.0, null, 0.0], "head_bbox": [100, 100, 200, 200]},
                    "person_1": {"gaze": [1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
                },
                "2": [],
                "3": {
                    "person_0": {"gaze": [-1.0, 0.0, 0.0], "head_bbox": [100, 100, 200, 200]},
                    "person_1": {"gaze": [1.0, 0.0, 0.0], "head_bbox": [600, 100, 700, 200]}
                }
            }"#,
        )
        .unwrap();
        let pipeline = DetectionPipeline::from_config(&DetectionConfig::default());
        let report = pipeline.run(&FeedFrames::new(&feed), &feed, 10.0).unwrap();

        assert_eq!(report.frames_total, 4);
        assert_eq!(report.frames_skipped, 2);
        assert_eq!(report.mutual_frames, 2);
        assert_eq!(report.timeline.events(), &[0.0, 0.3]);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let feed = GazeFeed::from_json_str(FEED).unwrap();
        let sequential = DetectionPipeline::from_config(&DetectionConfig::default());
        let parallel = DetectionPipeline::from_config(&DetectionConfig { parallel: true, ..DetectionConfig::default() });

        let a = sequential.run(&FeedFrames::new(&feed), &feed, 25.0).unwrap();
        let b = parallel.run(&FeedFrames::new(&feed), &feed, 25.0).unwrap();
        assert_eq!(a.timeline, b.timeline);
        assert_eq!(a.evaluations, b.evaluations);
    }
}
