//! Averaging per-marker positions into one box position and raw heading.
//!
//! The heading is the horizontal-plane projection of the mean position:
//! `atan2(mean.y, mean.x)`. Reference capture uses the same convention, so
//! runtime and calibration angles stay comparable.

use boxtrack_core::MarkerObservation;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Pose fusion policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusionParams {
    /// Minimal number of markers with a position before the fused pose is
    /// trusted. Values below 1 behave like 1.
    pub min_valid_positions: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            min_valid_positions: 1,
        }
    }
}

/// Fused box pose for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusedPose {
    /// Component-wise mean of the contributing marker positions.
    pub position: Vector3<f64>,
    /// `atan2(position.y, position.x)`, radians in `(-π, π]`.
    pub raw_orientation_rad: f64,
    /// Number of markers that voted.
    pub contributing: usize,
}

/// Fuse the markers of one frame.
///
/// Markers without a position do not vote. Returns `None` when fewer than
/// `params.min_valid_positions` markers voted.
pub fn fuse_observations(
    observations: &[MarkerObservation],
    params: &FusionParams,
) -> Option<FusedPose> {
    let (sum, contributing) = observations
        .iter()
        .filter_map(MarkerObservation::position)
        .fold((Vector3::<f64>::zeros(), 0usize), |(sum, n), p| (sum + p, n + 1));

    if contributing == 0 || contributing < params.min_valid_positions {
        return None;
    }

    let position = sum / contributing as f64;
    Some(FusedPose {
        raw_orientation_rad: position.y.atan2(position.x),
        position,
        contributing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn obs(tag_id: u32, x: f64, y: f64, z: f64) -> MarkerObservation {
        MarkerObservation::new(tag_id, Vector3::new(x, y, z), None).unwrap()
    }

    #[test]
    fn single_marker_is_its_own_mean() {
        let fused = fuse_observations(&[obs(0, 1.0, 2.0, 3.0)], &FusionParams::default()).unwrap();
        assert_abs_diff_eq!(fused.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(fused.contributing, 1);
    }

    #[test]
    fn two_markers_average_componentwise() {
        let fused = fuse_observations(
            &[obs(0, 1.0, 0.0, 2.0), obs(1, 3.0, 2.0, 4.0)],
            &FusionParams::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(fused.position, Vector3::new(2.0, 1.0, 3.0));
    }

    #[test]
    fn five_markers_ignore_the_ones_without_pose() {
        let frame = vec![
            obs(0, 1.0, 1.0, 1.0),
            MarkerObservation::detected_only(9),
            obs(1, 2.0, -1.0, 0.0),
            obs(24, 3.0, 4.0, 5.0),
            MarkerObservation::detected_only(10),
            obs(25, -2.0, 0.0, 2.0),
            obs(3, 1.0, 1.0, 2.0),
        ];
        let fused = fuse_observations(&frame, &FusionParams::default()).unwrap();
        assert_eq!(fused.contributing, 5);
        assert_abs_diff_eq!(fused.position, Vector3::new(1.0, 1.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn heading_uses_x_y_plane() {
        let fused =
            fuse_observations(&[obs(0, 0.0, 2.0, 7.0)], &FusionParams::default()).unwrap();
        assert_abs_diff_eq!(fused.raw_orientation_rad, std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn nothing_to_fuse_is_absent() {
        assert!(fuse_observations(&[], &FusionParams::default()).is_none());
        assert!(fuse_observations(
            &[MarkerObservation::detected_only(1)],
            &FusionParams::default()
        )
        .is_none());
    }

    #[test]
    fn minimum_count_policy_rejects_lone_marker() {
        let params = FusionParams {
            min_valid_positions: 2,
        };
        assert!(fuse_observations(&[obs(0, 1.0, 0.0, 0.0)], &params).is_none());
        assert!(
            fuse_observations(&[obs(0, 1.0, 0.0, 0.0), obs(1, 0.0, 1.0, 0.0)], &params).is_some()
        );
    }
}
