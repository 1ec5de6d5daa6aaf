//! Wraparound-safe angle arithmetic in degrees.
//!
//! Orientations live on the circle `[0, 360)`. Differences between two such
//! orientations are taken along the shortest path, so they fall in
//! `[-180, 180]`.

use nalgebra::Vector3;

/// Map an angle in degrees into `[0, 360)`.
///
/// `rem_euclid` can round tiny negative inputs up to exactly `360.0`; that
/// case is folded back to `0.0`.
#[inline]
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed difference `current - previous` for two normalized angles.
///
/// Both inputs are expected in `[0, 360)`. A jump from 350° to 10° is `+20`,
/// the reverse jump is `-20`. Exactly ±180 is returned unchanged.
#[inline]
pub fn wrap_delta_degrees(previous: f64, current: f64) -> f64 {
    let mut delta = current - previous;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Unsigned angle between two vectors in degrees, in `[0, 180]`.
///
/// Returns `None` when either vector has zero (or non-finite) magnitude. The
/// cosine is clamped to `[-1, 1]` before `acos`.
pub fn vector_angle_degrees(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let na = a.norm();
    let nb = b.norm();
    if !(na.is_finite() && nb.is_finite()) || na <= f64::EPSILON || nb <= f64::EPSILON {
        return None;
    }
    let cos = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
