use std::path::{Path, PathBuf};

use boxtrack_tracker::{
    load_frames_jsonl, InitialReferenceSet, ReplayedFrame, SessionReport, TrackerConfig,
    TrackerConfigError, TrackerIoError,
};
use log::info;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("{path}: {error}")]
    Read {
        path: PathBuf,
        #[source]
        error: TrackerIoError,
    },
    #[error("{path}: {error}")]
    Write {
        path: PathBuf,
        #[source]
        error: TrackerIoError,
    },
    #[error(transparent)]
    Config(#[from] TrackerConfigError),
    #[error("no frame stream given (use --frames or set frames_path in the config)")]
    NoFrames,
    #[error("no frame in {0} has a marker with both position and orientation")]
    NoCompleteFrame(PathBuf),
    #[error("{0} already exists (pass --force to overwrite)")]
    OutputExists(PathBuf),
}

fn read_err(path: &Path) -> impl FnOnce(TrackerIoError) -> CliError + '_ {
    move |error| CliError::Read {
        path: path.to_path_buf(),
        error,
    }
}

fn write_err(path: &Path) -> impl FnOnce(TrackerIoError) -> CliError + '_ {
    move |error| CliError::Write {
        path: path.to_path_buf(),
        error,
    }
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

pub fn replay(
    config_path: &Path,
    frames_override: Option<&Path>,
    output_override: Option<&Path>,
    log_every: u64,
) -> Result<(), CliError> {
    let cfg = TrackerConfig::load_json(config_path).map_err(read_err(config_path))?;
    let base = config_dir(config_path);
    let mut tracker = cfg.build_tracker(base)?;
    info!(
        "loaded {} reference tags, {} faces",
        tracker.references().len(),
        tracker.layout().faces().len()
    );

    let frames_path = frames_override
        .map(Path::to_path_buf)
        .or_else(|| cfg.frames_path(base))
        .ok_or(CliError::NoFrames)?;
    let frames = load_frames_jsonl(&frames_path).map_err(read_err(&frames_path))?;
    info!("replaying {} frames from {}", frames.len(), frames_path.display());

    let mut replayed = Vec::with_capacity(frames.len());
    for frame in frames {
        let report = tracker.update(&frame.observations);
        if log_every > 0 && (report.frame_index + 1) % log_every == 0 {
            info!(
                "frame {}: faces {:?}, heading {:?}, reference {:?}, rotations {}, cycles {}",
                report.frame_index,
                report.visible_faces,
                report.orientation_deg,
                report.reference_orientation_deg(),
                report.rotation_count,
                report.cycle_count
            );
        }
        replayed.push(ReplayedFrame {
            timestamp_ms: frame.timestamp_ms,
            report,
        });
    }

    let summary = tracker.snapshot();
    info!(
        "done: rotation count {}, cycle count {}",
        summary.tracker.rotation_count, summary.cycle.cycle_count
    );

    let report = SessionReport {
        config_path: config_path.to_string_lossy().into_owned(),
        frames_path: Some(frames_path.to_string_lossy().into_owned()),
        frames: replayed,
        summary,
    };
    let output_path = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cfg.output_path(base));
    report
        .write_json(&output_path)
        .map_err(write_err(&output_path))?;
    println!("wrote report JSON to {}", output_path.display());
    Ok(())
}

pub fn capture_reference(frames_path: &Path, output_path: &Path) -> Result<(), CliError> {
    let frames = load_frames_jsonl(frames_path).map_err(read_err(frames_path))?;
    let set = frames
        .iter()
        .map(|f| InitialReferenceSet::capture(&f.observations))
        .find(|set| !set.is_empty())
        .ok_or_else(|| CliError::NoCompleteFrame(frames_path.to_path_buf()))?;

    set.write_json(output_path).map_err(write_err(output_path))?;
    println!(
        "captured {} reference tags {:?} into {}",
        set.len(),
        set.tag_ids(),
        output_path.display()
    );
    Ok(())
}

pub fn check_layout(config_path: &Path) -> Result<(), CliError> {
    let cfg = TrackerConfig::load_json(config_path).map_err(read_err(config_path))?;
    let layout = cfg.build_layout()?;

    println!("layout OK: {} faces", layout.faces().len());
    for face in layout.faces() {
        let slots: Vec<String> = face
            .corners
            .occupied()
            .map(|(slot, tag)| format!("{slot:?}={tag}"))
            .collect();
        println!("  {}: {}", face.name, slots.join(", "));
    }
    println!("adjacency: {} directed edges", layout.adjacency().len());
    for pair in layout.adjacency().undirected_pairs() {
        println!("  {} <-> {} at {} deg", pair.a, pair.b, pair.angle_deg);
    }
    Ok(())
}

pub fn init_config(output_path: &Path, force: bool) -> Result<(), CliError> {
    if output_path.exists() && !force {
        return Err(CliError::OutputExists(output_path.to_path_buf()));
    }
    TrackerConfig::default()
        .write_json(output_path)
        .map_err(write_err(output_path))?;
    println!("wrote default config to {}", output_path.display());
    Ok(())
}
