//! Per-frame tracking engine.
//!
//! Wires pose fusion, the rotation tracker, the reference resolver and the
//! visibility-cycle detector together behind one stateful object per box.

mod params;
mod pipeline;
mod result;

pub use params::TrackerParams;
pub use pipeline::BoxTracker;
pub use result::{FrameReport, SessionSummary};
