//! Initial reference set: per-tag poses recorded once during calibration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use boxtrack_core::{MarkerObservation, TagId};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::io::TrackerIoError;

const DISTANCE_REL_TOLERANCE: f64 = 1e-6;

/// Pose of one marker at calibration time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    pub position: Vector3<f64>,
    pub distance: f64,
    /// Degrees, same convention as [`MarkerObservation::orientation`].
    pub orientation: f64,
}

impl ReferenceSnapshot {
    /// Snapshot of an observation carrying both a position and an orientation.
    pub fn from_observation(obs: &MarkerObservation) -> Option<Self> {
        Some(Self {
            position: *obs.position()?,
            distance: obs.translation_magnitude()?,
            orientation: obs.orientation()?,
        })
    }

    fn validate(&self, tag_id: TagId) -> Result<(), ReferenceError> {
        if !self.position.iter().all(|c| c.is_finite())
            || !self.distance.is_finite()
            || !self.orientation.is_finite()
        {
            return Err(ReferenceError::NonFinite { tag_id });
        }
        let norm = self.position.norm();
        if (self.distance - norm).abs() > DISTANCE_REL_TOLERANCE * norm.max(1.0) {
            return Err(ReferenceError::InconsistentDistance {
                tag_id,
                distance: self.distance,
                norm,
            });
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("reference for tag {tag_id} has non-finite values")]
    NonFinite { tag_id: TagId },
    #[error("reference for tag {tag_id}: distance {distance} disagrees with position norm {norm}")]
    InconsistentDistance {
        tag_id: TagId,
        distance: f64,
        norm: f64,
    },
    #[error("tag {tag_id} appears more than once in the reference list")]
    DuplicateTag { tag_id: TagId },
}

/// List-form entry as written by the calibration capture step.
#[derive(Clone, Debug, Deserialize)]
struct ListedSnapshot {
    tag_id: TagId,
    position: Vector3<f64>,
    distance: f64,
    orientation: f64,
}

/// Read-only (unless learning is enabled) map of calibrated marker poses.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InitialReferenceSet {
    snapshots: BTreeMap<TagId, ReferenceSnapshot>,
}

impl InitialReferenceSet {
    /// Validate and wrap a keyed set of snapshots.
    pub fn new(snapshots: BTreeMap<TagId, ReferenceSnapshot>) -> Result<Self, ReferenceError> {
        for (&tag_id, snap) in &snapshots {
            snap.validate(tag_id)?;
        }
        Ok(Self { snapshots })
    }

    /// Build from `(tag, snapshot)` pairs; a repeated tag is an error.
    pub fn from_snapshots(
        entries: impl IntoIterator<Item = (TagId, ReferenceSnapshot)>,
    ) -> Result<Self, ReferenceError> {
        let mut snapshots = BTreeMap::new();
        for (tag_id, snap) in entries {
            snap.validate(tag_id)?;
            if snapshots.insert(tag_id, snap).is_some() {
                return Err(ReferenceError::DuplicateTag { tag_id });
            }
        }
        Ok(Self { snapshots })
    }

    /// Capture a reference set from one frame: every marker with a position
    /// and an orientation becomes a snapshot. The first sample of a tag wins.
    pub fn capture(observations: &[MarkerObservation]) -> Self {
        let mut snapshots = BTreeMap::new();
        for obs in observations {
            if let Some(snap) = ReferenceSnapshot::from_observation(obs) {
                snapshots.entry(obs.tag_id()).or_insert(snap);
            }
        }
        Self { snapshots }
    }

    /// Parse either the keyed-map or the list JSON form.
    pub fn from_json_str(raw: &str) -> Result<Self, TrackerIoError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let set = if value.is_array() {
            let list: Vec<ListedSnapshot> = serde_json::from_value(value)?;
            Self::from_snapshots(list.into_iter().map(|e| {
                (
                    e.tag_id,
                    ReferenceSnapshot {
                        position: e.position,
                        distance: e.distance,
                        orientation: e.orientation,
                    },
                )
            }))?
        } else {
            Self::new(serde_json::from_value(value)?)?
        };
        Ok(set)
    }

    /// Load a reference set from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TrackerIoError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Write the keyed-map JSON form.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    #[inline]
    pub fn get(&self, tag_id: TagId) -> Option<&ReferenceSnapshot> {
        self.snapshots.get(&tag_id)
    }

    #[inline]
    pub fn contains(&self, tag_id: TagId) -> bool {
        self.snapshots.contains_key(&tag_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshots in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = (TagId, &ReferenceSnapshot)> {
        self.snapshots.iter().map(|(&t, s)| (t, s))
    }

    pub fn tag_ids(&self) -> Vec<TagId> {
        self.snapshots.keys().copied().collect()
    }

    /// Record `obs` if its tag has no snapshot yet. Returns true on insert.
    pub(crate) fn learn(&mut self, obs: &MarkerObservation) -> bool {
        if self.contains(obs.tag_id()) {
            return false;
        }
        match ReferenceSnapshot::from_observation(obs) {
            Some(snap) => {
                self.snapshots.insert(obs.tag_id(), snap);
                true
            }
            None => false,
        }
    }
}
