use boxtrack_core::TagId;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::cycle::CycleState;
use crate::resolver::ReferenceOrientation;
use crate::rotation::{RotationEvent, TrackerState, TrackingPhase};

/// Everything the engine knows after one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Zero-based index of the frame within the session.
    pub frame_index: u64,
    /// Mean position of the voting markers, camera frame.
    pub position: Option<Vector3<f64>>,
    /// Markers that voted in the fused pose (0 when the pose is absent).
    pub contributing_markers: usize,
    /// Fused heading in `[0, 360)`.
    pub orientation_deg: Option<f64>,
    /// Heading change against the previous valid frame, wrapped.
    pub delta_deg: Option<f64>,
    pub reference_orientation: Option<ReferenceOrientation>,
    pub rotation_event: Option<RotationEvent>,
    pub rotation_count: i64,
    pub cycle_count: u64,
    /// True when this frame completed a visibility cycle.
    pub cycle_completed: bool,
    pub visible_tags: Vec<TagId>,
    pub visible_faces: Vec<String>,
}

impl FrameReport {
    /// Reference-relative orientation in degrees, if resolved.
    pub fn reference_orientation_deg(&self) -> Option<f64> {
        self.reference_orientation.map(|r| r.degrees)
    }
}

/// Serializable end-of-session state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub phase: TrackingPhase,
    pub tracker: TrackerState,
    pub cycle: CycleState,
    pub reference_tags: Vec<TagId>,
}
