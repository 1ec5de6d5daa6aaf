//! Per-marker pose samples handed over by the detection stage.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Identifier of one physical fiducial marker, stable across frames.
pub type TagId = u32;

/// Relative tolerance used when checking a reported distance against the
/// norm of the reported position.
const DISTANCE_REL_TOLERANCE: f64 = 1e-6;

/// Reasons a raw observation record is rejected at the detector boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ObservationError {
    #[error("tag {tag_id}: position has non-finite components")]
    NonFinitePosition { tag_id: TagId },
    #[error("tag {tag_id}: orientation {orientation} is not finite")]
    NonFiniteOrientation { tag_id: TagId, orientation: f64 },
    #[error("tag {tag_id}: distance {distance} given without a position")]
    DistanceWithoutPosition { tag_id: TagId, distance: f64 },
    #[error("tag {tag_id}: orientation given without a position")]
    OrientationWithoutPosition { tag_id: TagId },
    #[error("tag {tag_id}: distance {distance} disagrees with position norm {norm}")]
    InconsistentDistance {
        tag_id: TagId,
        distance: f64,
        norm: f64,
    },
}

/// Loosely-shaped observation as it appears on the wire.
///
/// Every pose field is optional. Convert into [`MarkerObservation`] with
/// `TryFrom` to get a record whose fields are mutually consistent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservationRecord {
    pub tag_id: TagId,
    #[serde(default)]
    pub position: Option<Vector3<f64>>,
    #[serde(default, alias = "distance")]
    pub translation_magnitude: Option<f64>,
    #[serde(default)]
    pub orientation: Option<f64>,
}

/// One fused pose sample for one marker in one frame.
///
/// Invariant: `translation_magnitude` is present iff `position` is, and
/// equals its norm. An observation without a position still counts as
/// "detected" but does not vote in fusion or resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "MarkerObservationRecord",
    into = "MarkerObservationRecord"
)]
pub struct MarkerObservation {
    tag_id: TagId,
    position: Option<Vector3<f64>>,
    translation_magnitude: Option<f64>,
    orientation: Option<f64>,
}

impl MarkerObservation {
    /// Observation with a full pose. The distance is derived from `position`.
    pub fn new(
        tag_id: TagId,
        position: Vector3<f64>,
        orientation: Option<f64>,
    ) -> Result<Self, ObservationError> {
        if !position.iter().all(|c| c.is_finite()) {
            return Err(ObservationError::NonFinitePosition { tag_id });
        }
        if let Some(orientation) = orientation.filter(|o| !o.is_finite()) {
            return Err(ObservationError::NonFiniteOrientation {
                tag_id,
                orientation,
            });
        }
        Ok(Self {
            tag_id,
            translation_magnitude: Some(position.norm()),
            position: Some(position),
            orientation,
        })
    }

    /// Marker detected, but pose estimation failed for it this frame.
    pub fn detected_only(tag_id: TagId) -> Self {
        Self {
            tag_id,
            position: None,
            translation_magnitude: None,
            orientation: None,
        }
    }

    #[inline]
    pub fn tag_id(&self) -> TagId {
        self.tag_id
    }

    #[inline]
    pub fn position(&self) -> Option<&Vector3<f64>> {
        self.position.as_ref()
    }

    /// Distance from the camera, i.e. the norm of [`Self::position`].
    #[inline]
    pub fn translation_magnitude(&self) -> Option<f64> {
        self.translation_magnitude
    }

    /// Detector-defined in-image rotation, degrees.
    #[inline]
    pub fn orientation(&self) -> Option<f64> {
        self.orientation
    }

    /// True when this marker votes (has a position).
    #[inline]
    pub fn has_pose(&self) -> bool {
        self.position.is_some()
    }
}

impl TryFrom<MarkerObservationRecord> for MarkerObservation {
    type Error = ObservationError;

    fn try_from(rec: MarkerObservationRecord) -> Result<Self, Self::Error> {
        let tag_id = rec.tag_id;
        let Some(position) = rec.position else {
            if let Some(distance) = rec.translation_magnitude {
                return Err(ObservationError::DistanceWithoutPosition { tag_id, distance });
            }
            if rec.orientation.is_some() {
                return Err(ObservationError::OrientationWithoutPosition { tag_id });
            }
            return Ok(Self::detected_only(tag_id));
        };

        let obs = Self::new(tag_id, position, rec.orientation)?;
        if let Some(distance) = rec.translation_magnitude {
            let norm = obs.translation_magnitude.unwrap_or_default();
            let tol = DISTANCE_REL_TOLERANCE * norm.max(1.0);
            if !distance.is_finite() || (distance - norm).abs() > tol {
                return Err(ObservationError::InconsistentDistance {
                    tag_id,
                    distance,
                    norm,
                });
            }
        }
        Ok(obs)
    }
}

impl From<MarkerObservation> for MarkerObservationRecord {
    fn from(obs: MarkerObservation) -> Self {
        Self {
            tag_id: obs.tag_id,
            position: obs.position,
            translation_magnitude: obs.translation_magnitude,
            orientation: obs.orientation,
        }
    }
}
