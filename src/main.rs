use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mutual_gaze::args::{Args, Command};
use mutual_gaze::config::{AppConfig, LoggingConfig};
use mutual_gaze::pipeline::DetectionReport;
use mutual_gaze::session::{
    align_files, detect, run_batch, run_session, AlignmentSummary, SessionPaths,
};

fn print_detection(name: &str, report: &DetectionReport) {
    println!(
        "{}",
        format!(
            "{}: {} frames ({} without data), {} mutual gaze events",
            name,
            report.frames_total,
            report.frames_skipped,
            report.timeline.len()
        )
        .green()
    );
}

fn print_alignment(name: &str, summary: &AlignmentSummary) {
    println!(
        "{}",
        format!(
            "{}: {}/{} transcript lines with gaze, {}/{} events attributed, {} blocks dropped",
            name,
            summary.intervals_with_events,
            summary.intervals,
            summary.events_attributed,
            summary.events_total,
            summary.blocks_skipped
        )
        .green()
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from(AppConfig::DEFAULT_PATH));
    let read = AppConfig::read(&config_path);

    // the subscriber has to exist before the config outcome is logged
    let default_level = match (&read, args.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(Some(c)), false) => c.logging.level.clone(),
        _ => LoggingConfig::default().level,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
    let config = AppConfig::or_defaults(read, &config_path);

    match args.command {
        Command::Detect { session, detect: opts } => {
            let paths = SessionPaths::new(session)?;
            let report = detect(&paths, &config, opts.into())?;
            print_detection(&paths.name, &report);
        }
        Command::Align { session, events, transcript, output } => {
            let paths = session.map(SessionPaths::new).transpose()?;
            let pick = |explicit: Option<PathBuf>, default: fn(&SessionPaths) -> PathBuf, what: &str| {
                explicit
                    .or_else(|| paths.as_ref().map(default))
                    .with_context(|| format!("no {} given", what))
            };
            let events = pick(events, SessionPaths::gaze_events, "gaze events file")?;
            let transcript = pick(transcript, SessionPaths::transcript, "transcript")?;
            let output = pick(output, SessionPaths::aligned, "output path")?;

            let summary = align_files(&events, &transcript, &output)?;
            let name = paths.as_ref().map(|p| p.name.as_str()).unwrap_or("alignment");
            print_alignment(name, &summary);
        }
        Command::Run { session, detect: opts } => {
            let paths = SessionPaths::new(session)?;
            let summary = run_session(&paths, &config, opts.into())?;
            print_detection(&summary.name, &summary.detection);
            if let Some(alignment) = &summary.alignment {
                print_alignment(&summary.name, alignment);
            }
        }
        Command::Batch { root, detect: opts, force } => {
            let batch = run_batch(&root, &config, opts.into(), force)?;
            for s in &batch.processed {
                print_detection(&s.name, &s.detection);
                if let Some(alignment) = &s.alignment {
                    print_alignment(&s.name, alignment);
                }
            }
            for name in &batch.skipped {
                println!("{}", format!("{}: already processed", name).yellow());
            }
            for (name, err) in &batch.failed {
                println!("{}", format!("{}: {}", name, err).red());
            }
        }
        Command::InitConfig { path } => {
            let path = path.unwrap_or(config_path);
            AppConfig::default().save(&path)?;
            info!("Wrote default configuration to {}", path.display());
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
