//! Replay of recorded frames through a [`Game`]

use anyhow::{bail, Context, Result};
use log::{info, warn};
use racetrack_core::{GameState, TimeSource};
use racetrack_cv::utils::ImageUtils;
use racetrack_cv::{Game, GameSnapshot, VisionBackend, VisionError};
use serde::Serialize;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replay settings taken from the command line
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Where annotated frames go; nothing is written when unset
    pub output_dir: Option<PathBuf>,
    /// Abort on undersized frames instead of skipping them
    pub strict: bool,
}

/// A state change and the frame that caused it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub frame: usize,
    pub from: GameState,
    pub to: GameState,
    pub elapsed_secs: f64,
}

/// Summary printed at the end of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub frames_total: usize,
    pub frames_rejected: usize,
    pub transitions: Vec<TransitionRecord>,
    pub final_state: GameSnapshot,
}

impl ReplayReport {
    fn new(final_state: GameSnapshot) -> Self {
        Self {
            frames_total: 0,
            frames_rejected: 0,
            transitions: Vec::new(),
            final_state,
        }
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Expand files and directories into an ordered frame list.
///
/// Files are kept in the given order; a directory contributes its frame files
/// sorted by name.
pub fn collect_frames(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read frame directory: {:?}", input))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()
                .with_context(|| format!("Failed to list frame directory: {:?}", input))?;
            entries.retain(|path| path.is_file() && is_frame_file(path));
            entries.sort();
            frames.extend(entries);
        } else if input.is_file() {
            frames.push(input.clone());
        } else {
            bail!("No such frame file or directory: {:?}", input);
        }
    }
    Ok(frames)
}

/// Tick one frame and fold the outcome into `report`.
///
/// Returns the annotated frame, or `None` when the frame was skipped.
pub fn run_frame<B: VisionBackend, T: TimeSource + Clone>(
    game: &mut Game<B, T>,
    index: usize,
    frame: &image::RgbImage,
    report: &mut ReplayReport,
    strict: bool,
) -> Result<Option<image::RgbImage>> {
    report.frames_total += 1;

    let annotated = match game.tick(frame) {
        Ok(annotated) => annotated,
        Err(err @ VisionError::InvalidFrameSize { .. }) if !strict => {
            warn!("skipping frame {}: {}", index, err);
            report.frames_rejected += 1;
            return Ok(None);
        }
        Err(err) => return Err(err).with_context(|| format!("Frame {} failed", index)),
    };

    if let Some(transition) = game.last_transition() {
        report.transitions.push(TransitionRecord {
            frame: index,
            from: transition.from,
            to: transition.to,
            elapsed_secs: game.elapsed_time(),
        });
    }
    report.final_state = game.snapshot();
    Ok(Some(annotated))
}

/// Replay `frames` in order, optionally saving the annotated output
pub fn replay<B: VisionBackend, T: TimeSource + Clone>(
    game: &mut Game<B, T>,
    frames: &[PathBuf],
    options: &ReplayOptions,
) -> Result<ReplayReport> {
    if let Some(dir) = &options.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    info!(
        "replaying {} frames, zones trigger after {} confirmations",
        frames.len(),
        game.machine().debounce_threshold()
    );
    let mut report = ReplayReport::new(game.snapshot());
    for (index, path) in frames.iter().enumerate() {
        let frame = ImageUtils::load_frame(path)?;
        let Some(annotated) = run_frame(game, index, &frame, &mut report, options.strict)? else {
            continue;
        };

        if let (Some(dir), Some(name)) = (&options.output_dir, path.file_name()) {
            ImageUtils::save_frame(&annotated, dir.join(name))?;
        }
    }

    info!(
        "replayed {} frames ({} rejected), final state {}",
        report.frames_total, report.frames_rejected, report.final_state.state
    );
    Ok(report)
}
