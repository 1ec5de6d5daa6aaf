use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use boxtrack_core::{MarkerObservation, TagId};
use log::{debug, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{FrameReport, SessionSummary, TrackerParams};
use crate::cycle::{CycleState, VisibilityCycleDetector};
use crate::fusion::fuse_observations;
use crate::layout::BoxLayout;
use crate::reference::InitialReferenceSet;
use crate::resolver::resolve_reference_orientation;
use crate::rotation::{RotationTracker, TrackerState, TrackingPhase};

/// Stateful tracker for one physical box.
///
/// Feed it one complete observation list per frame with [`BoxTracker::update`].
/// Not meant to be re-entered concurrently; track several boxes with several
/// instances.
pub struct BoxTracker {
    layout: BoxLayout,
    references: InitialReferenceSet,
    params: TrackerParams,
    rotation: RotationTracker,
    cycle: VisibilityCycleDetector,
    frames_processed: u64,
}

impl BoxTracker {
    /// Create a tracker. When the layout places tags on faces, only those
    /// tags count towards visibility cycles.
    pub fn new(layout: BoxLayout, references: InitialReferenceSet, params: TrackerParams) -> Self {
        let rotation = RotationTracker::new(params.rotation.clone());
        let mut cycle = VisibilityCycleDetector::new(params.cycle.clone());
        let face_tags = layout.face_tags();
        if !face_tags.is_empty() {
            cycle = cycle.with_tag_filter(face_tags);
        }

        Self {
            layout,
            references,
            params,
            rotation,
            cycle,
            frames_processed: 0,
        }
    }

    #[inline]
    pub fn layout(&self) -> &BoxLayout {
        &self.layout
    }

    #[inline]
    pub fn references(&self) -> &InitialReferenceSet {
        &self.references
    }

    #[inline]
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    #[inline]
    pub fn rotation_state(&self) -> &TrackerState {
        self.rotation.state()
    }

    #[inline]
    pub fn phase(&self) -> TrackingPhase {
        self.rotation.phase()
    }

    #[inline]
    pub fn cycle_state(&self) -> &CycleState {
        self.cycle.state()
    }

    #[inline]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Process one frame of marker observations.
    ///
    /// Never fails: missing poses, empty frames and degenerate geometry only
    /// leave the corresponding report fields empty.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, observations), fields(frame = self.frames_processed, observations = observations.len()))
    )]
    pub fn update(&mut self, observations: &[MarkerObservation]) -> FrameReport {
        let frame = unique_by_tag(observations);
        let frame: &[MarkerObservation] = &frame;

        let fused = fuse_observations(frame, &self.params.fusion);
        let heading = self.rotation.update(fused.as_ref().map(|f| f.raw_orientation_rad));

        // Too few voting markers: skip resolution too, but keep the
        // empty-frame default.
        let reference_orientation = if fused.is_some() || frame.is_empty() {
            resolve_reference_orientation(
                frame,
                &self.references,
                self.layout.adjacency(),
                &self.params.resolver,
            )
        } else {
            None
        };

        if self.params.learn_unseen_reference_tags {
            for obs in frame {
                if self.references.learn(obs) {
                    debug!("learned reference snapshot for tag {}", obs.tag_id());
                }
            }
        }

        let visible_tags: BTreeSet<TagId> = frame.iter().map(MarkerObservation::tag_id).collect();
        let completed = self.cycle.update(visible_tags.iter().copied());
        let visible_faces = self.layout.faces_for_tags(visible_tags.iter().copied());

        let report = FrameReport {
            frame_index: self.frames_processed,
            position: fused.as_ref().map(|f| f.position),
            contributing_markers: fused.as_ref().map_or(0, |f| f.contributing),
            orientation_deg: heading.map(|h| h.orientation_deg),
            delta_deg: heading.and_then(|h| h.delta_deg),
            reference_orientation,
            rotation_event: heading.and_then(|h| h.event),
            rotation_count: self.rotation.rotation_count(),
            cycle_count: self.cycle.cycle_count(),
            cycle_completed: completed > 0,
            visible_tags: visible_tags.into_iter().collect(),
            visible_faces,
        };
        self.frames_processed += 1;
        report
    }

    /// Current state, suitable for persisting at session end.
    pub fn snapshot(&self) -> SessionSummary {
        SessionSummary {
            frames_processed: self.frames_processed,
            phase: self.rotation.phase(),
            tracker: self.rotation.state().clone(),
            cycle: self.cycle.state().clone(),
            reference_tags: self.references.tag_ids(),
        }
    }
}

/// One observation per tag, in order of first appearance. The first
/// duplicate carrying a position wins, else the first one seen.
fn unique_by_tag(observations: &[MarkerObservation]) -> Cow<'_, [MarkerObservation]> {
    let mut seen = BTreeSet::new();
    if observations.iter().all(|o| seen.insert(o.tag_id())) {
        return Cow::Borrowed(observations);
    }

    let mut slot_of: BTreeMap<TagId, usize> = BTreeMap::new();
    let mut unique: Vec<MarkerObservation> = Vec::with_capacity(observations.len());
    for obs in observations {
        match slot_of.get(&obs.tag_id()) {
            None => {
                slot_of.insert(obs.tag_id(), unique.len());
                unique.push(obs.clone());
            }
            Some(&idx) => {
                warn!("tag {} reported twice in one frame", obs.tag_id());
                if !unique[idx].has_pose() && obs.has_pose() {
                    unique[idx] = obs.clone();
                }
            }
        }
    }
    Cow::Owned(unique)
}
