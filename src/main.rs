use anyhow::Result;
use clap::Parser;
use racetrack_cv::GameConfig;
use std::path::PathBuf;

mod replay;

use replay::ReplayOptions;

#[derive(Parser, Debug)]
#[command(name = "racetrack", about = "Replay recorded camera frames through the race track game")]
struct Args {
    /// JSON game configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory for annotated frames
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Confirmations a zone needs before it triggers a transition
    #[arg(long)]
    debounce: Option<u32>,
    /// Fail on frames smaller than the region of interest instead of skipping them
    #[arg(long)]
    strict: bool,
    /// Frame files or directories of frames
    #[arg(value_name = "FRAME", required = true)]
    frames: Vec<PathBuf>,
}

#[cfg(not(feature = "opencv"))]
fn build_game(config: GameConfig) -> Result<racetrack_cv::Game> {
    Ok(racetrack_cv::Game::new(config)?)
}

#[cfg(feature = "opencv")]
fn build_game(
    config: GameConfig,
) -> Result<racetrack_cv::Game<racetrack_cv::OpenCvBackend, racetrack_core::MonotonicTime>> {
    Ok(racetrack_cv::Game::with_parts(
        config,
        racetrack_cv::OpenCvBackend::new(),
        racetrack_core::MonotonicTime::new(),
    )?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(threshold) = args.debounce {
        config = config.with_debounce_threshold(threshold);
    }

    let mut game = build_game(config)?;
    let frames = replay::collect_frames(&args.frames)?;
    let options = ReplayOptions {
        output_dir: args.output,
        strict: args.strict,
    };

    let report = replay::replay(&mut game, &frames, &options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
