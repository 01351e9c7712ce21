//! MOSEI preprocessing binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, Instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use mosei_media::{check_ffmpeg, check_ffprobe, CommandAligner, Ffmpeg, FfmpegRunner};
use mosei_pipeline::{
    run_average, run_downsample, run_faces, run_majority, run_merge, PipelineConfig, RunOptions,
    StageLogger,
};

#[derive(Debug, Parser)]
#[command(name = "mosei-prep", version, about = "Preprocess MOSEI clips and sentiment labels")]
struct Cli {
    /// Dataset root; every default path is derived from it
    #[arg(long, env = "MOSEI_DATA_ROOT", default_value = "./data", global = true)]
    data_root: PathBuf,

    /// Log the planned work without running ffmpeg, the aligner or writing tables
    #[arg(long, global = true)]
    dry_run: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Re-encode manifest clips at the target frame rate
    Downsample,
    /// Merge raw annotation exports, keeping clips with media
    Merge,
    /// Write per-clip average sentiment
    Average,
    /// Write per-clip majority-vote sentiment
    Majority,
    /// Build face-crop videos from downsampled clips
    Faces,
    /// Run every stage in dependency order
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Downsample,
    Faces,
    Merge,
    Average,
    Majority,
}

impl Stage {
    /// Order used by `all`: media first, then labels.
    const ALL: [Stage; 5] = [
        Stage::Downsample,
        Stage::Faces,
        Stage::Merge,
        Stage::Average,
        Stage::Majority,
    ];

    fn name(self) -> &'static str {
        match self {
            Stage::Downsample => "downsample",
            Stage::Faces => "faces",
            Stage::Merge => "merge",
            Stage::Average => "average",
            Stage::Majority => "majority",
        }
    }
}

impl Command {
    fn stages(self) -> Vec<Stage> {
        match self {
            Command::Downsample => vec![Stage::Downsample],
            Command::Merge => vec![Stage::Merge],
            Command::Average => vec![Stage::Average],
            Command::Majority => vec![Stage::Majority],
            Command::Faces => vec![Stage::Faces],
            Command::All => Stage::ALL.to_vec(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let config = PipelineConfig::from_env(&cli.data_root).context("Invalid configuration")?;
    let options = RunOptions {
        dry_run: cli.dry_run,
        show_progress: !cli.no_progress,
    };
    let run_id = Uuid::new_v4().to_string();

    info!(
        run_id = %run_id,
        data_root = %cli.data_root.display(),
        dry_run = options.dry_run,
        "Starting mosei-prep {:?}",
        cli.command
    );

    for stage in cli.command.stages() {
        if let Err(e) = run_stage(stage, &config, &options, &run_id).await {
            error!(run_id = %run_id, stage = stage.name(), "Stage aborted: {:#}", e);
            return Err(e);
        }
    }

    info!(run_id = %run_id, "mosei-prep finished");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    // Colored output for terminals, JSON for log collectors
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("mosei=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run_stage(
    stage: Stage,
    config: &PipelineConfig,
    options: &RunOptions,
    run_id: &str,
) -> anyhow::Result<()> {
    let logger = StageLogger::with_run_id(run_id, stage.name());
    let span = logger.create_span();

    async {
        match stage {
            Stage::Downsample => {
                let ffmpeg = media_toolkit(config, options)?;
                run_downsample(config, &ffmpeg, &logger, options).await?;
            }
            Stage::Faces => {
                let ffmpeg = media_toolkit(config, options)?;
                let aligner = CommandAligner::new(config.aligner.clone());
                if !options.dry_run {
                    aligner.check()?;
                }
                run_faces(config, &ffmpeg, &aligner, &logger, options).await?;
            }
            Stage::Merge => {
                run_merge(config, &logger, options).await?;
            }
            Stage::Average => {
                run_average(config, &logger, options).await?;
            }
            Stage::Majority => {
                run_majority(config, &logger, options).await?;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}

/// FFmpeg-backed codec; tools must be on `PATH` unless this is a dry run.
fn media_toolkit(config: &PipelineConfig, options: &RunOptions) -> anyhow::Result<Ffmpeg> {
    if !options.dry_run {
        check_ffmpeg()?;
        check_ffprobe()?;
    }
    Ok(Ffmpeg::new(
        FfmpegRunner::new().with_optional_timeout(config.ffmpeg_timeout_secs),
    ))
}
