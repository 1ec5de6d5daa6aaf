//! JSON configuration, frame streams and session reports.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use boxtrack_core::MarkerObservation;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::{BoxTracker, FrameReport, SessionSummary, TrackerParams};
use crate::layout::{BoxLayout, BoxLayoutSpec, LayoutError};
use crate::reference::{InitialReferenceSet, ReferenceError};

#[derive(thiserror::Error, Debug)]
pub enum TrackerIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error("frame stream line {line}: {error}")]
    FrameLine {
        line: usize,
        #[source]
        error: serde_json::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum TrackerConfigError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("failed to load reference set {path}: {error}")]
    References {
        path: PathBuf,
        #[source]
        error: TrackerIoError,
    },
}

/// Configuration of one tracking session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Reference-set JSON (keyed or list form).
    pub reference_path: String,
    /// Recorded frames, JSON Lines.
    #[serde(default)]
    pub frames_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub layout: BoxLayoutSpec,
    #[serde(default)]
    pub params: TrackerParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reference_path: "initial_reference.json".to_string(),
            frames_path: Some("frames.jsonl".to_string()),
            output_path: None,
            layout: BoxLayoutSpec::default(),
            params: TrackerParams::default(),
        }
    }
}

impl TrackerConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TrackerIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Report path, relative paths resolved against `base_dir`.
    pub fn output_path(&self, base_dir: &Path) -> PathBuf {
        let rel = self.output_path.as_deref().unwrap_or("boxtrack_report.json");
        resolve_path(base_dir, rel)
    }

    pub fn frames_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.frames_path.as_deref().map(|p| resolve_path(base_dir, p))
    }

    pub fn reference_path(&self, base_dir: &Path) -> PathBuf {
        resolve_path(base_dir, &self.reference_path)
    }

    /// Validate the box layout.
    pub fn build_layout(&self) -> Result<BoxLayout, TrackerConfigError> {
        Ok(BoxLayout::new(self.layout.clone())?)
    }

    /// Load the reference set and build a fresh tracker.
    pub fn build_tracker(&self, base_dir: &Path) -> Result<BoxTracker, TrackerConfigError> {
        let layout = self.build_layout()?;
        let path = self.reference_path(base_dir);
        let references = InitialReferenceSet::load_json(&path)
            .map_err(|error| TrackerConfigError::References { path, error })?;
        Ok(BoxTracker::new(layout, references, self.params.clone()))
    }
}

fn resolve_path(base_dir: &Path, p: &str) -> PathBuf {
    let path = Path::new(p);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// One line of a recorded frame stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub observations: Vec<MarkerObservation>,
}

/// Parse a JSON Lines frame stream. Blank lines are skipped.
pub fn read_frames_jsonl(reader: impl BufRead) -> Result<Vec<FrameRecord>, TrackerIoError> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str(&line).map_err(|error| {
            warn!("rejecting frame record on line {}: {error}", idx + 1);
            TrackerIoError::FrameLine {
                line: idx + 1,
                error,
            }
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Load a JSON Lines frame stream from disk.
pub fn load_frames_jsonl(path: impl AsRef<Path>) -> Result<Vec<FrameRecord>, TrackerIoError> {
    let file = fs::File::open(path)?;
    read_frames_jsonl(BufReader::new(file))
}

/// A frame report together with the capture timestamp it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayedFrame {
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
    #[serde(flatten)]
    pub report: FrameReport,
}

/// Result of replaying a recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub config_path: String,
    #[serde(default)]
    pub frames_path: Option<String>,
    pub frames: Vec<ReplayedFrame>,
    pub summary: SessionSummary,
}

impl SessionReport {
    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TrackerIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
