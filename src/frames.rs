use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::detections::GazeFeed;

/// A frame to evaluate: its number and its key in the gaze feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub index: u64,
    pub key: String,
}

pub trait FrameSource {
    fn name(&self) -> String;
    /// Frames in strictly ascending index order.
    fn frames(&self) -> Result<Vec<FrameRef>>;
}

// =========================================================================
// Extracted frame images, named `<frame number>.<ext>`
// =========================================================================
pub struct FrameDirectory {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl FrameDirectory {
    pub fn new(dir: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl FrameSource for FrameDirectory {
    fn name(&self) -> String {
        format!("frame directory {}", self.dir.display())
    }

    fn frames(&self) -> Result<Vec<FrameRef>> {
        if !self.dir.is_dir() {
            bail!("frames folder not found at {}", self.dir.display());
        }

        let mut frames = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !self.accepts(path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<u64>() {
                Ok(index) => frames.push(FrameRef { index, key: stem.to_string() }),
                Err(_) => warn!("Ignoring frame file without a frame number: {}", path.display()),
            }
        }

        frames.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.key.cmp(&b.key)));
        let before = frames.len();
        frames.dedup_by_key(|f| f.index);
        if frames.len() != before {
            warn!("{} duplicate frame numbers in {}", before - frames.len(), self.dir.display());
        }

        info!("Found {} frames in {}", frames.len(), self.dir.display());
        Ok(frames)
    }
}

// =========================================================================
// Frame numbers taken straight from the gaze feed keys
// =========================================================================
pub struct FeedFrames<'a> {
    feed: &'a GazeFeed,
}

impl<'a> FeedFrames<'a> {
    pub fn new(feed: &'a GazeFeed) -> Self {
        Self { feed }
    }
}

impl FrameSource for FeedFrames<'_> {
    fn name(&self) -> String {
        "gaze feed keys".to_string()
    }

    fn frames(&self) -> Result<Vec<FrameRef>> {
        let mut frames: Vec<FrameRef> = self
            .feed
            .frame_numbers()
            .into_iter()
            .map(|(index, key)| FrameRef { index, key })
            .collect();
        let before = frames.len();
        frames.dedup_by_key(|f| f.index);
        if frames.len() != before {
            // "7" and "007" both present
            debug!("{} feed keys share a frame number", before - frames.len());
        }
        Ok(frames)
    }
}
