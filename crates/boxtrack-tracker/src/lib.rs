//! Pose and rotation tracking for a box covered with fiducial markers.
//!
//! Each frame, the detection stage hands over a list of
//! [`MarkerObservation`]s. A [`BoxTracker`] then
//! - fuses the voting markers into one box position and heading,
//! - keeps a signed count of large heading jumps across the ±180 deg seam,
//! - resolves an orientation relative to the calibration pose, walking the
//!   face-adjacency graph when the calibrated markers are out of view,
//! - counts visibility cycles (every face marker seen once) as an independent
//!   corroboration of the rotation count.
//!
//! ## Quickstart
//!
//! ```
//! use boxtrack_tracker::{
//!     BoxLayout, BoxLayoutSpec, BoxTracker, InitialReferenceSet, MarkerObservation, TrackerParams,
//! };
//! use nalgebra::Vector3;
//!
//! let layout = BoxLayout::new(BoxLayoutSpec::default()).unwrap();
//! let refs = InitialReferenceSet::default();
//! let mut tracker = BoxTracker::new(layout, refs, TrackerParams::default());
//!
//! let obs = MarkerObservation::new(0, Vector3::new(0.1, 0.0, 0.8), Some(3.0)).unwrap();
//! let report = tracker.update(&[obs]);
//! assert_eq!(report.visible_faces, vec!["right".to_string()]);
//! ```

mod adjacency;
mod cycle;
mod engine;
mod fusion;
mod io;
mod layout;
mod reference;
mod resolver;
mod rotation;

pub use adjacency::{AdjacencyEdge, AdjacencyError, AdjacencyPair, AdjacentTag, FaceAdjacency};
pub use cycle::{CycleParams, CycleState, VisibilityCycleDetector};
pub use engine::{BoxTracker, FrameReport, SessionSummary, TrackerParams};
pub use fusion::{fuse_observations, FusedPose, FusionParams};
pub use io::{
    load_frames_jsonl, read_frames_jsonl, FrameRecord, ReplayedFrame, SessionReport,
    TrackerConfig, TrackerConfigError, TrackerIoError,
};
pub use layout::{BoxLayout, BoxLayoutSpec, CornerSlot, Face, FaceCorners, LayoutError};
pub use reference::{InitialReferenceSet, ReferenceError, ReferenceSnapshot};
pub use resolver::{
    resolve_reference_orientation, EmptyFramePolicy, ReferenceOrientation, Resolution,
    ResolverParams,
};
pub use rotation::{
    RotationEvent, RotationParams, RotationTracker, RotationUpdate, TrackerState, TrackingPhase,
};

pub use boxtrack_core::{MarkerObservation, TagId};
