//! Orientation relative to the calibrated reference, recovered through the
//! face-adjacency graph when the calibrated markers themselves are hidden.
//!
//! Candidates are examined in ascending tag order. For each visible marker
//! with a position, a direct reference hit (implicit 0 deg edge) is tried
//! first, then its adjacency edges in declaration order. The first candidate
//! whose reference and current vectors both have non-zero length wins:
//!
//! `(reference.orientation + edge angle + angle_between(ref, current)) mod 360`

use std::collections::BTreeMap;

use boxtrack_core::{normalize_degrees, vector_angle_degrees, MarkerObservation, TagId};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::adjacency::FaceAdjacency;
use crate::reference::InitialReferenceSet;

/// What to report for a frame in which no marker was detected at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFramePolicy {
    /// Assume the box still faces the reference (report the default angle).
    #[default]
    FacingReference,
    /// Report no orientation.
    Absent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolverParams {
    #[serde(default)]
    pub empty_frame: EmptyFramePolicy,
    /// Angle reported under [`EmptyFramePolicy::FacingReference`].
    #[serde(default)]
    pub default_orientation_deg: f64,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            empty_frame: EmptyFramePolicy::FacingReference,
            default_orientation_deg: 0.0,
        }
    }
}

/// How a reference-relative orientation was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Resolution {
    /// Through a visible marker; `visible_tag == reference_tag` for a direct hit.
    Matched {
        visible_tag: TagId,
        reference_tag: TagId,
        edge_angle_deg: f64,
        angle_between_deg: f64,
    },
    /// Nothing visible; the empty-frame default was applied.
    EmptyFrameDefault,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrientation {
    /// Degrees in `[0, 360)`.
    pub degrees: f64,
    pub resolution: Resolution,
}

/// Resolve the orientation of the box relative to the calibration pose.
///
/// Returns `None` when the reference set is empty, when no visible marker
/// relates to a reference marker, or when every candidate is degenerate.
pub fn resolve_reference_orientation(
    observations: &[MarkerObservation],
    references: &InitialReferenceSet,
    adjacency: &FaceAdjacency,
    params: &ResolverParams,
) -> Option<ReferenceOrientation> {
    if references.is_empty() {
        return None;
    }

    if observations.is_empty() {
        return match params.empty_frame {
            EmptyFramePolicy::FacingReference => Some(ReferenceOrientation {
                degrees: normalize_degrees(params.default_orientation_deg),
                resolution: Resolution::EmptyFrameDefault,
            }),
            EmptyFramePolicy::Absent => None,
        };
    }

    // First position per tag, ascending tag order.
    let mut visible: BTreeMap<TagId, &Vector3<f64>> = BTreeMap::new();
    for obs in observations {
        if let Some(p) = obs.position() {
            visible.entry(obs.tag_id()).or_insert(p);
        }
    }

    for (&visible_tag, &current) in &visible {
        let direct = references.contains(visible_tag).then_some((visible_tag, 0.0));
        let via_edges = adjacency
            .related(visible_tag)
            .iter()
            .map(|rel| (rel.tag_id, rel.angle_deg));

        for (reference_tag, edge_angle_deg) in direct.into_iter().chain(via_edges) {
            let Some(snapshot) = references.get(reference_tag) else {
                continue;
            };
            let Some(angle_between_deg) = vector_angle_degrees(&snapshot.position, current)
            else {
                continue;
            };
            return Some(ReferenceOrientation {
                degrees: normalize_degrees(
                    snapshot.orientation + edge_angle_deg + angle_between_deg,
                ),
                resolution: Resolution::Matched {
                    visible_tag,
                    reference_tag,
                    edge_angle_deg,
                    angle_between_deg,
                },
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyPair;
    use crate::reference::ReferenceSnapshot;
    use approx::assert_abs_diff_eq;

    fn snapshot(position: Vector3<f64>, orientation: f64) -> ReferenceSnapshot {
        ReferenceSnapshot {
            distance: position.norm(),
            position,
            orientation,
        }
    }

    fn refs(entries: Vec<(TagId, ReferenceSnapshot)>) -> InitialReferenceSet {
        InitialReferenceSet::from_snapshots(entries).unwrap()
    }

    fn obs(tag_id: TagId, position: Vector3<f64>) -> MarkerObservation {
        MarkerObservation::new(tag_id, position, None).unwrap()
    }

    #[test]
    fn resolves_through_adjacent_reference_marker() {
        let p = Vector3::new(0.2, -0.1, 1.5);
        let references = refs(vec![(24, snapshot(p, 90.0))]);
        let adjacency = FaceAdjacency::from_undirected([AdjacencyPair::new(3, 24, 90.0)]).unwrap();

        let res = resolve_reference_orientation(
            &[obs(3, p)],
            &references,
            &adjacency,
            &ResolverParams::default(),
        )
        .unwrap();

        assert_abs_diff_eq!(res.degrees, 180.0, epsilon = 1e-5);
        match res.resolution {
            Resolution::Matched {
                visible_tag,
                reference_tag,
                ..
            } => {
                assert_eq!(visible_tag, 3);
                assert_eq!(reference_tag, 24);
            }
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn adds_angle_between_and_wraps() {
        let references = refs(vec![(24, snapshot(Vector3::x(), 300.0))]);
        let adjacency =
            FaceAdjacency::from_undirected([AdjacencyPair::new(3, 24, 90.0)]).unwrap();
        let res = resolve_reference_orientation(
            &[obs(3, Vector3::y())],
            &references,
            &adjacency,
            &ResolverParams::default(),
        )
        .unwrap();
        // 300 + 90 + 90 = 480 -> 120
        assert_abs_diff_eq!(res.degrees, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_frame_reports_facing_reference() {
        let references = refs(vec![(24, snapshot(Vector3::z(), 90.0))]);
        let res = resolve_reference_orientation(
            &[],
            &references,
            &FaceAdjacency::default(),
            &ResolverParams::default(),
        )
        .unwrap();
        assert_eq!(res.degrees, 0.0);
        assert_eq!(res.resolution, Resolution::EmptyFrameDefault);
    }

    #[test]
    fn empty_frame_policy_can_report_absent() {
        let references = refs(vec![(24, snapshot(Vector3::z(), 90.0))]);
        let params = ResolverParams {
            empty_frame: EmptyFramePolicy::Absent,
            ..ResolverParams::default()
        };
        assert!(
            resolve_reference_orientation(&[], &references, &FaceAdjacency::default(), &params)
                .is_none()
        );
    }

    #[test]
    fn unrelated_visible_tag_is_absent() {
        let references = refs(vec![(24, snapshot(Vector3::z(), 90.0))]);
        let adjacency = FaceAdjacency::from_undirected([AdjacencyPair::new(3, 24, 90.0)]).unwrap();
        assert!(resolve_reference_orientation(
            &[obs(8, Vector3::z())],
            &references,
            &adjacency,
            &ResolverParams::default()
        )
        .is_none());
    }

    #[test]
    fn detected_tags_without_pose_are_absent_not_default() {
        let references = refs(vec![(24, snapshot(Vector3::z(), 90.0))]);
        assert!(resolve_reference_orientation(
            &[MarkerObservation::detected_only(24)],
            &references,
            &FaceAdjacency::default(),
            &ResolverParams::default()
        )
        .is_none());
    }

    #[test]
    fn lowest_visible_tag_wins() {
        let references = refs(vec![
            (24, snapshot(Vector3::z(), 10.0)),
            (25, snapshot(Vector3::z(), 200.0)),
        ]);
        let adjacency = FaceAdjacency::from_undirected([
            AdjacencyPair::new(3, 24, 90.0),
            AdjacencyPair::new(2, 25, 0.0),
        ])
        .unwrap();
        // Tag 3 comes first in the input; tag 2 still decides.
        let res = resolve_reference_orientation(
            &[obs(3, Vector3::z()), obs(2, Vector3::z())],
            &references,
            &adjacency,
            &ResolverParams::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(res.degrees, 200.0, epsilon = 1e-6);
    }

    #[test]
    fn visible_reference_marker_matches_directly() {
        let references = refs(vec![(24, snapshot(Vector3::z(), 45.0))]);
        let res = resolve_reference_orientation(
            &[obs(24, Vector3::z())],
            &references,
            &FaceAdjacency::default(),
            &ResolverParams::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(res.degrees, 45.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_length_current_vector_is_no_relationship() {
        let references = refs(vec![(24, snapshot(Vector3::z(), 90.0))]);
        let adjacency = FaceAdjacency::from_undirected([AdjacencyPair::new(3, 24, 90.0)]).unwrap();
        assert!(resolve_reference_orientation(
            &[obs(3, Vector3::zeros())],
            &references,
            &adjacency,
            &ResolverParams::default()
        )
        .is_none());
    }

    #[test]
    fn empty_reference_set_is_absent() {
        assert!(resolve_reference_orientation(
            &[],
            &InitialReferenceSet::default(),
            &FaceAdjacency::default(),
            &ResolverParams::default()
        )
        .is_none());
    }
}
