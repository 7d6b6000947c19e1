use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rep_sentinel::{
    export, Config, ExerciseSession, FeedbackSink, FrameSource, LogSink, RecordedPose,
    SessionSummary,
};

#[derive(Parser, Debug)]
#[command(name = "rep-sentinel")]
#[command(author, version, about = "Exercise repetition counting from pose landmarks")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded landmarks through one session and export the result
    Analyze {
        /// Exercise configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Exercise to track, as named in the config
        #[arg(short, long)]
        exercise: String,

        /// Recorded pose output, one JSON object per line
        #[arg(short, long)]
        input: PathBuf,

        /// CSV destination; defaults to analysis_<timestamp>.csv
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a JSON session summary after export
        #[arg(long)]
        summary: bool,
    },

    /// List configured exercises and their joints
    Exercises {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Validate a configuration file
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Command::Analyze {
            config,
            exercise,
            input,
            output,
            summary,
        } => analyze(&config, &exercise, &input, output, summary),
        Command::Exercises { config } => list_exercises(&config),
        Command::CheckConfig { config } => {
            load_config(&config)?;
            println!("{}: ok", config.display());
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn analyze(
    config_path: &Path,
    exercise: &str,
    input: &Path,
    output: Option<PathBuf>,
    print_summary: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut source = FrameSource::open(input)
        .with_context(|| format!("opening pose recording {}", input.display()))?
        .peekable();

    // the recording's first frame marks the session start
    let start_time = match source.peek() {
        Some(Ok(first)) => first.timestamp,
        _ => Utc::now(),
    };

    let mut estimator = RecordedPose::new();
    let mut overlay = LogSink::new();
    let mut session = ExerciseSession::start(&config, exercise, start_time)?;
    info!(session = %session.session_id(), exercise, "analyzing {}", input.display());

    let mut last_timestamp = None;
    for raw in source {
        let raw = raw.with_context(|| format!("reading {}", input.display()))?;
        let feedback = session.process_with(&mut estimator, &raw)?;
        overlay.publish(&feedback);
        last_timestamp = Some(feedback.timestamp);
    }

    let record = session.finish(last_timestamp.unwrap_or(start_time))?;
    let output = output.unwrap_or_else(|| PathBuf::from(export::default_file_name(&Local::now())));
    export::write_csv_file(&record, &output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(
        reps = record.final_count,
        frames = session.frames_seen(),
        skipped = session.frames_skipped(),
        "saved {}",
        output.display()
    );

    if print_summary {
        let summary = SessionSummary::from_record(&record);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn list_exercises(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = config.registry()?;
    for name in registry.exercises() {
        let exercise = config.exercise(name)?;
        println!(
            "{name}: lower {} / upper {} degrees",
            exercise.lower_bound, exercise.upper_bound
        );
        for joint in registry.definitions_for(name).unwrap_or_default() {
            let [a, b, c] = joint.roles();
            println!("  {}: {a:?} - {b:?} - {c:?}", joint.id);
        }
    }
    Ok(())
}
