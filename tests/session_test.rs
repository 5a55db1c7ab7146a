use std::fs;
use std::path::Path;

use mutual_gaze::config::AppConfig;
use mutual_gaze::output::{read_aligned, read_gaze_events};
use mutual_gaze::session::{align_session, detect, run_batch, run_session, DetectOptions, SessionPaths};

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
    "3": null
}"#;

const SRT: &str = "1\n00:00:00,000 --> 00:00:00,150\nhello\n\n2\n00:00:00,150 --> 00:00:01,000\nhow are\nyou\n\n3\n00:00:05,000 --> 00:00:04,000\nbackwards\n";

const OPTS: DetectOptions = DetectOptions { fps: Some(10.0), from_feed_keys: false };

fn make_session(root: &Path, name: &str, with_transcript: bool) -> SessionPaths {
    let paths = SessionPaths::new(root.join(name)).unwrap();
    fs::create_dir_all(paths.frames_dir()).unwrap();
    for i in 0..4 {
        fs::write(paths.frames_dir().join(format!("{}.jpg", i)), b"").unwrap();
    }
    fs::write(paths.gaze_feed(), FEED).unwrap();
    if with_transcript {
        fs::write(paths.transcript(), SRT).unwrap();
    }
    paths
}

#[test]
fn detect_writes_event_times() {
    let root = tempfile::tempdir().unwrap();
    let paths = make_session(root.path(), "pcit1", false);

    let report = detect(&paths, &AppConfig::default(), OPTS).unwrap();
    assert_eq!(report.frames_total, 4);
    assert_eq!(report.frames_skipped, 1);
    assert_eq!(report.mutual_frames, 2);

    let timeline = read_gaze_events(&paths.gaze_events()).unwrap();
    assert_eq!(timeline.events(), &[0.0, 0.2]);
    assert!(!paths.relations().exists());
}

#[test]
fn detect_can_write_relations() {
    let root = tempfile::tempdir().unwrap();
    let paths = make_session(root.path(), "pcit1", false);
    let mut config = AppConfig::default();
    config.output.write_relations = true;

    detect(&paths, &config, OPTS).unwrap();
    let relations: serde_json::Value = serde_json::from_str(&fs::read_to_string(paths.relations()).unwrap()).unwrap();
    assert_eq!(relations.as_array().unwrap().len(), 3);
}

#[test]
fn run_session_aligns_events_with_transcript() {
    let root = tempfile::tempdir().unwrap();
    let paths = make_session(root.path(), "pcit2", true);

    let summary = run_session(&paths, &AppConfig::default(), OPTS).unwrap();
    let alignment = summary.alignment.unwrap();
    assert_eq!(alignment.intervals, 2);
    assert_eq!(alignment.blocks_skipped, 1);
    assert_eq!(alignment.events_total, 2);
    assert_eq!(alignment.events_attributed, 2);

    let aligned = read_aligned(&paths.aligned()).unwrap();
    assert_eq!(aligned[0].text, "hello");
    assert_eq!(aligned[0].events, vec![0.0]);
    assert_eq!(aligned[1].text, "how are you");
    assert_eq!(aligned[1].events, vec![0.2]);

    let raw = fs::read_to_string(paths.aligned()).unwrap();
    assert!(raw.contains("\"start_time\": \"00:00:00,150\""));
}

#[test]
fn align_without_events_file_fails() {
    let root = tempfile::tempdir().unwrap();
    let paths = make_session(root.path(), "pcit3", true);
    assert!(align_session(&paths).is_err());
}

#[test]
fn run_session_without_transcript_only_detects() {
    let root = tempfile::tempdir().unwrap();
    let paths = make_session(root.path(), "pcit4", false);
    let summary = run_session(&paths, &AppConfig::default(), OPTS).unwrap();
    assert!(summary.alignment.is_none());
    assert!(paths.gaze_events().exists());
    assert!(!paths.aligned().exists());
}

#[test]
fn batch_skips_done_sessions_and_survives_failures() {
    let root = tempfile::tempdir().unwrap();
    make_session(root.path(), "a", true);
    let done = make_session(root.path(), "b", true);
    fs::write(done.gaze_events(), "[]").unwrap();
    // no gaze feed
    fs::create_dir_all(root.path().join("c").join("frames")).unwrap();

    let config = AppConfig::default();
    let batch = run_batch(root.path(), &config, OPTS, false).unwrap();
    let processed: Vec<&str> = batch.processed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(processed, vec!["a"]);
    assert_eq!(batch.skipped, vec!["b".to_string()]);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].0, "c");

    let forced = run_batch(root.path(), &config, OPTS, true).unwrap();
    assert_eq!(forced.processed.len(), 2);
    assert!(forced.skipped.is_empty());
    assert_eq!(read_gaze_events(&done.gaze_events()).unwrap().events(), &[0.0, 0.2]);
}

#[test]
fn feed_keys_replace_frame_folder() {
    let root = tempfile::tempdir().unwrap();
    let paths = make_session(root.path(), "pcit5", false);
    fs::remove_dir_all(paths.frames_dir()).unwrap();

    let opts = DetectOptions { fps: Some(10.0), from_feed_keys: true };
    let report = detect(&paths, &AppConfig::default(), opts).unwrap();
    assert_eq!(report.timeline.events(), &[0.0, 0.2]);

    assert!(detect(&paths, &AppConfig::default(), OPTS).is_err());
}
