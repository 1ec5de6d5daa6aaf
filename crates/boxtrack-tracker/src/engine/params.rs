use serde::{Deserialize, Serialize};

use crate::cycle::CycleParams;
use crate::fusion::FusionParams;
use crate::resolver::ResolverParams;
use crate::rotation::RotationParams;

/// Configuration for [`super::BoxTracker`].
///
/// Every field has a default, so partial JSON objects are accepted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerParams {
    #[serde(default)]
    pub fusion: FusionParams,
    #[serde(default)]
    pub rotation: RotationParams,
    #[serde(default)]
    pub cycle: CycleParams,
    #[serde(default)]
    pub resolver: ResolverParams,
    /// Record the first complete observation of a tag missing from the
    /// reference set as a new reference snapshot.
    #[serde(default)]
    pub learn_unseen_reference_tags: bool,
}
