use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::evaluator::PairOfInterest;
use crate::geometry::DEFAULT_GAZE_LENGTH;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub video: VideoConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gaze ray length in pixels
    pub gaze_length: f64,
    pub pair: PairOfInterest,
    /// Evaluate frames on the rayon pool
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub fps_override: Option<f64>,
    pub ffprobe_path: String,
    pub frame_extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Also write `<name>_relations.json` with every looks-at pair per frame
    pub write_relations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            gaze_length: DEFAULT_GAZE_LENGTH,
            pair: PairOfInterest::default(),
            parallel: false,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps_override: None,
            ffprobe_path: "ffprobe".to_string(),
            frame_extensions: vec!["jpg".to_string(), "png".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "mutual_gaze.json";

    /// Read a configuration file. `Ok(None)` when the file does not exist;
    /// an unreadable or unparsable file is an error.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        // missing fields fall back to Default through #[serde(default)]
        let config = serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("error parsing config {}", path.display()))?;
        Ok(Some(config))
    }

    /// Turn the outcome of [`AppConfig::read`] into a configuration, logging
    /// what happened. Call once logging is up.
    pub fn or_defaults(read: Result<Option<Self>>, path: &Path) -> Self {
        match read {
            Ok(Some(c)) => {
                info!("Loaded configuration from {}", path.display());
                c
            }
            Ok(None) => {
                info!("Configuration file {} not found. Using defaults.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let c: AppConfig = serde_json::from_str(r#"{"detection": {"parallel": true}}"#).unwrap();
        assert!(c.detection.parallel);
        assert_eq!(c.detection.gaze_length, DEFAULT_GAZE_LENGTH);
        assert_eq!(c.detection.pair, PairOfInterest::default());
        assert_eq!(c.video.ffprobe_path, "ffprobe");
        assert_eq!(c.logging.level, "info");
    }

    #[test]
    fn save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let mut c = AppConfig::default();
        c.video.fps_override = Some(30.0);
        c.detection.pair = PairOfInterest::new("child", "parent");
        c.save(&path).unwrap();

        let loaded = AppConfig::read(&path).unwrap().unwrap();
        assert_eq!(loaded.video.fps_override, Some(30.0));
        assert_eq!(loaded.detection.pair.first, "child");
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.json");
        assert!(AppConfig::read(&path).unwrap().is_none());
        assert!(AppConfig::or_defaults(AppConfig::read(&path), &path).video.fps_override.is_none());
    }

    #[test]
    fn broken_file_is_reported_then_replaced_by_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();

        let err = AppConfig::read(&broken).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));

        let config = AppConfig::or_defaults(AppConfig::read(&broken), &broken);
        assert!(!config.detection.parallel);
        assert_eq!(config.logging.level, "info");
    }
}
