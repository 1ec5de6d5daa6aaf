//! Heading tracker and signed rotation counter.
//!
//! The counter is a heuristic: every frame-to-frame heading jump larger than
//! the threshold moves it by one in the direction of the jump. It is *not*
//! an odometer of completed 360 deg turns.

use boxtrack_core::{normalize_degrees, wrap_delta_degrees};
use log::debug;
use serde::{Deserialize, Serialize};

/// Rotation tracker settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationParams {
    /// A wrapped delta counts as a rotation event when `|delta|` exceeds this.
    pub threshold_deg: f64,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            threshold_deg: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingPhase {
    /// No heading seen yet.
    Uninitialized,
    /// At least one heading seen.
    Tracking,
}

/// Persistent tracker state. Never reset during a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    pub previous_orientation_deg: Option<f64>,
    pub rotation_count: i64,
}

/// A heading jump that moved the counter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationEvent {
    pub delta_deg: f64,
    /// `+1` or `-1`.
    pub direction: i8,
}

/// Outcome of one tracker update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationUpdate {
    /// Heading in `[0, 360)`.
    pub orientation_deg: f64,
    /// Wrapped delta to the previous heading; `None` on the first sample.
    pub delta_deg: Option<f64>,
    pub event: Option<RotationEvent>,
}

#[derive(Clone, Debug, Default)]
pub struct RotationTracker {
    params: RotationParams,
    state: TrackerState,
}

impl RotationTracker {
    pub fn new(params: RotationParams) -> Self {
        Self {
            params,
            state: TrackerState::default(),
        }
    }

    #[inline]
    pub fn params(&self) -> &RotationParams {
        &self.params
    }

    #[inline]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    #[inline]
    pub fn rotation_count(&self) -> i64 {
        self.state.rotation_count
    }

    pub fn phase(&self) -> TrackingPhase {
        if self.state.previous_orientation_deg.is_some() {
            TrackingPhase::Tracking
        } else {
            TrackingPhase::Uninitialized
        }
    }

    /// Feed the fused heading of one frame, radians.
    ///
    /// An absent (or non-finite) heading leaves the state untouched.
    pub fn update(&mut self, raw_orientation_rad: Option<f64>) -> Option<RotationUpdate> {
        raw_orientation_rad.and_then(|rad| self.update_degrees(rad.to_degrees()))
    }

    /// Feed a heading already expressed in degrees (any range).
    ///
    /// A non-finite heading counts as absent: `None`, state untouched.
    pub fn update_degrees(&mut self, orientation_deg: f64) -> Option<RotationUpdate> {
        if !orientation_deg.is_finite() {
            return None;
        }
        let current = normalize_degrees(orientation_deg);
        let delta = self
            .state
            .previous_orientation_deg
            .map(|previous| wrap_delta_degrees(previous, current));

        let event = delta
            .filter(|d| d.abs() > self.params.threshold_deg)
            .map(|delta_deg| RotationEvent {
                delta_deg,
                direction: if delta_deg > 0.0 { 1 } else { -1 },
            });

        if let Some(ev) = event {
            self.state.rotation_count += i64::from(ev.direction);
            debug!(
                "rotation event: delta {:+.2} deg, count {}",
                ev.delta_deg, self.state.rotation_count
            );
        }
        self.state.previous_orientation_deg = Some(current);

        Some(RotationUpdate {
            orientation_deg: current,
            delta_deg: delta,
            event,
        })
    }
}
