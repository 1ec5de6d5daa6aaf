//! Core types and angle arithmetic for tracking a marker-covered box.
//!
//! This crate is deliberately small. It knows nothing about faces, reference
//! sets or per-session state; it only defines the per-marker observation
//! record handed over by the detection stage and the wraparound-safe angle
//! helpers every tracking component relies on.

mod angle;
mod logger;
mod observation;

pub use angle::{normalize_degrees, vector_angle_degrees, wrap_delta_degrees};
pub use observation::{MarkerObservation, MarkerObservationRecord, ObservationError, TagId};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level_filter};
