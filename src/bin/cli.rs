//! buzzline CLI: synchronized playback of up to four tone channels.
//!
//! Usage:
//!   bz-cli play melody1.csv melody2.csv melody3.csv melody4.csv
//!   bz-cli play --config session.json --tempo 0.5
//!   bz-cli play melody1.csv --dry-run
//!   bz-cli inspect melody1.csv

use anyhow::{bail, Context, Result};
use bz_formats::{decode_str, EventFormat};
use bz_ir::TempoScale;
use bz_master::{ChannelConfig, Controller, SessionConfig, SessionReport, ToneCall};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bz-cli")]
#[command(about = "Synchronized multi-channel tone sequencer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play channel files together from a common start
    Play {
        /// One event file per channel (max 4); replaces channels from --config
        files: Vec<PathBuf>,

        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Format of the files given on the command line
        #[arg(short, long, default_value = "pairs")]
        format: EventFormat,

        /// Duration multiplier (above 1 slows down)
        #[arg(short, long)]
        tempo: Option<f32>,

        /// Milliseconds between session start and the first note
        #[arg(long)]
        lead_ms: Option<u64>,

        /// Shortest sleep in milliseconds
        #[arg(long)]
        min_ms: Option<f32>,

        /// Combined output level 0.0-1.0
        #[arg(long)]
        level: Option<f32>,

        /// Record requests instead of opening an audio device
        #[arg(long)]
        dry_run: bool,
    },
    /// Decode one file and print its events
    Inspect {
        file: PathBuf,

        #[arg(short, long, default_value = "pairs")]
        format: EventFormat,

        /// Duration multiplier used for the total
        #[arg(short, long, default_value = "1.0")]
        tempo: f32,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Play {
            files,
            config,
            format,
            tempo,
            lead_ms,
            min_ms,
            level,
            dry_run,
        } => {
            let overrides = Overrides {
                tempo,
                lead_ms,
                min_ms,
                level,
            };
            load_config(config, files, format, overrides).and_then(|cfg| play(cfg, dry_run))
        }
        Commands::Inspect {
            file,
            format,
            tempo,
        } => inspect(&file, format, tempo).map(|()| ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|e| {
        log::error!("{:#}", e);
        ExitCode::FAILURE
    })
}

struct Overrides {
    tempo: Option<f32>,
    lead_ms: Option<u64>,
    min_ms: Option<f32>,
    level: Option<f32>,
}

fn load_config(
    path: Option<PathBuf>,
    files: Vec<PathBuf>,
    format: EventFormat,
    overrides: Overrides,
) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => Controller::from_file(&path)?.config().clone(),
        None => SessionConfig::default(),
    };

    if !files.is_empty() {
        config.channels = files
            .into_iter()
            .map(|f| ChannelConfig::new(f, format))
            .collect();
    }
    if let Some(tempo) = overrides.tempo {
        config.tempo = tempo;
    }
    if let Some(lead_ms) = overrides.lead_ms {
        config.lead_time_ms = lead_ms;
    }
    if let Some(min_ms) = overrides.min_ms {
        config.min_duration_ms = min_ms;
    }
    if let Some(level) = overrides.level {
        config.level = level;
    }

    if config.channels.is_empty() {
        bail!("no channel files given (pass files or --config)");
    }
    Ok(config)
}

fn play(config: SessionConfig, dry_run: bool) -> Result<ExitCode> {
    for (i, channel) in config.channels.iter().enumerate() {
        println!("ch{}: {} ({})", i, channel.path.display(), channel.format);
    }
    println!(
        "Tempo: x{}, lead {} ms, floor {} ms",
        config.tempo, config.lead_time_ms, config.min_duration_ms
    );
    println!();

    let ctrl = Controller::new(config);
    let report = if dry_run {
        let (report, recordings) = ctrl.dry_run()?;
        print_timelines(&report, &recordings);
        report
    } else {
        println!("Playing...");
        ctrl.play()?
    };

    print!("{}", report);
    Ok(if report.all_finished() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn print_timelines(report: &SessionReport, recordings: &[bz_master::Recording]) {
    for (channel, recording) in report.channels().iter().zip(recordings) {
        let Some(origin) = channel.started_at else {
            println!("{}: never started", channel.id);
            continue;
        };
        println!("{}:", channel.id);
        for call in recording.calls().iter().filter(|c| c.at >= origin) {
            let at = (call.at - origin).as_secs_f32();
            match call.call {
                ToneCall::Tone(freq) => println!("  {:>8.3}s  tone {:.2} Hz", at, freq),
                ToneCall::Silence => println!("  {:>8.3}s  silence", at),
            }
        }
    }
    println!();
}

fn inspect(path: &Path, format: EventFormat, tempo: f32) -> Result<()> {
    let Some(scale) = TempoScale::with_multiplier(tempo) else {
        bail!("invalid tempo multiplier {}", tempo);
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let (events, skipped) = decode_str(&text, format);

    for (i, event) in events.iter().enumerate() {
        if event.is_rest() {
            println!("{:>5}  rest          {:.3}s", i, event.duration);
        } else {
            println!("{:>5}  {:>9.2} Hz  {:.3}s", i, event.frequency, event.duration);
        }
    }
    println!();

    let rests = events.iter().filter(|e| e.is_rest()).count();
    let total: f32 = events.iter().map(|e| scale.apply(e.duration)).sum();
    println!("Events:   {} ({} rests)", events.len(), rests);
    println!("Skipped:  {} lines", skipped);
    println!("Duration: {:.3}s at x{}", total, tempo);
    Ok(())
}
