//! Session directories and the detect / align flows over them.
//!
//! A session is a directory named after its video. It holds the detection
//! feed `<name>-gaze.json`, the video `<name>.mp4`, the extracted frames in
//! `frames/` and optionally the transcript `<name>.srt`. Outputs are written
//! next to them.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::aligner::align_checked;
use crate::config::AppConfig;
use crate::detections::GazeFeed;
use crate::frames::{FeedFrames, FrameDirectory};
use crate::output::{read_gaze_events, write_aligned, write_gaze_events, write_relations};
use crate::pipeline::{DetectionPipeline, DetectionReport};
use crate::transcript::Transcript;
use crate::video::resolve_frame_rate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub dir: PathBuf,
    pub name: String,
}

impl SessionPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("cannot derive a session name from {}", dir.display()))?
            .to_string();
        Ok(Self { dir, name })
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }

    pub fn gaze_feed(&self) -> PathBuf {
        self.file("-gaze.json")
    }

    pub fn video(&self) -> PathBuf {
        self.file(".mp4")
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.dir.join("frames")
    }

    pub fn transcript(&self) -> PathBuf {
        self.file(".srt")
    }

    pub fn gaze_events(&self) -> PathBuf {
        self.file("_gaze_events.json")
    }

    pub fn aligned(&self) -> PathBuf {
        self.file("_result.json")
    }

    pub fn relations(&self) -> PathBuf {
        self.file("_relations.json")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DetectOptions {
    /// Overrides both the config and the video's own frame rate
    pub fps: Option<f64>,
    /// Take frame numbers from the feed instead of `frames/`
    pub from_feed_keys: bool,
}

// =========================================================================
// Detection
// =========================================================================

pub fn detect(paths: &SessionPaths, config: &AppConfig, opts: DetectOptions) -> Result<DetectionReport> {
    let feed = GazeFeed::load(&paths.gaze_feed())?;
    let fps = resolve_frame_rate(opts.fps, &config.video, &paths.video())?;

    let pipeline = DetectionPipeline::from_config(&config.detection);
    let report = if opts.from_feed_keys {
        pipeline.run(&FeedFrames::new(&feed), &feed, fps)?
    } else {
        let source = FrameDirectory::new(paths.frames_dir(), &config.video.frame_extensions);
        pipeline.run(&source, &feed, fps)?
    };

    write_gaze_events(&paths.gaze_events(), &report.timeline)?;
    if config.output.write_relations {
        write_relations(&paths.relations(), &report.evaluations)?;
    }

    info!(
        "{}: {} frames, {} skipped, {} mutual gaze events",
        paths.name,
        report.frames_total,
        report.frames_skipped,
        report.timeline.len()
    );
    Ok(report)
}

// =========================================================================
// Alignment
// =========================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub intervals: usize,
    pub intervals_with_events: usize,
    pub events_total: usize,
    pub events_attributed: usize,
    pub blocks_skipped: usize,
}

pub fn align_files(events: &Path, transcript: &Path, output: &Path) -> Result<AlignmentSummary> {
    let timeline = read_gaze_events(events)?;
    let transcript = Transcript::load(transcript)?;

    let aligned = align_checked(timeline.events(), &transcript.intervals)
        .context("transcript and gaze events cannot be aligned")?;
    write_aligned(output, &aligned)?;

    let summary = AlignmentSummary {
        intervals: aligned.len(),
        intervals_with_events: aligned.iter().filter(|a| !a.events.is_empty()).count(),
        events_total: timeline.len(),
        events_attributed: aligned.iter().map(|a| a.events.len()).sum(),
        blocks_skipped: transcript.skipped.len(),
    };
    if summary.events_attributed < summary.events_total {
        info!(
            "{} gaze events fall outside every transcript line",
            summary.events_total - summary.events_attributed
        );
    }
    Ok(summary)
}

pub fn align_session(paths: &SessionPaths) -> Result<AlignmentSummary> {
    align_files(&paths.gaze_events(), &paths.transcript(), &paths.aligned())
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub name: String,
    pub detection: DetectionReport,
    pub alignment: Option<AlignmentSummary>,
}

/// Detect, then align when the session has a transcript.
pub fn run_session(paths: &SessionPaths, config: &AppConfig, opts: DetectOptions) -> Result<SessionSummary> {
    let detection = detect(paths, config, opts)?;
    let alignment = if paths.transcript().exists() {
        Some(align_session(paths)?)
    } else {
        warn!("{}: no transcript at {}, skipping alignment", paths.name, paths.transcript().display());
        None
    };
    Ok(SessionSummary { name: paths.name.clone(), detection, alignment })
}

// =========================================================================
// Batch over a dataset root
// =========================================================================

/// Immediate subdirectories of `root`, sorted by name.
pub fn find_sessions(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("dataset root {} is not a directory", root.display());
    }
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    info!("Found {} session directories under {}", dirs.len(), root.display());
    Ok(dirs)
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: Vec<SessionSummary>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Run every session under `root`. Sessions that already have a gaze-events
/// file are left alone unless `force` is set. A failing session does not
/// stop the batch.
pub fn run_batch(root: &Path, config: &AppConfig, opts: DetectOptions, force: bool) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for dir in find_sessions(root)? {
        let paths = match SessionPaths::new(&dir) {
            Ok(p) => p,
            Err(e) => {
                error!("Skipping {}: {:#}", dir.display(), e);
                summary.failed.push((dir.display().to_string(), format!("{:#}", e)));
                continue;
            }
        };
        if !force && paths.gaze_events().exists() {
            info!("{} already has {}, skipping", paths.name, paths.gaze_events().display());
            summary.skipped.push(paths.name);
            continue;
        }

        info!("Processing session {}", paths.name);
        match run_session(&paths, config, opts) {
            Ok(s) => summary.processed.push(s),
            Err(e) => {
                error!("Session {} failed: {:#}", paths.name, e);
                summary.failed.push((paths.name, format!("{:#}", e)));
            }
        }
    }

    Ok(summary)
}
