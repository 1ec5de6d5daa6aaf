//! Coarse rotation corroboration: a cycle completes once every expected
//! face marker has been seen at least once since the previous cycle.
//!
//! This counter is independent of the heading-based rotation count and the
//! two are expected to drift apart under partial visibility.

use std::collections::BTreeSet;

use boxtrack_core::TagId;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleParams {
    /// Distinct markers that make up one full rotation. Values below 1
    /// behave like 1.
    pub expected_markers: usize,
}

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            expected_markers: 4,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    pub seen_tags_since_cycle: BTreeSet<TagId>,
    pub cycle_count: u64,
}

#[derive(Clone, Debug, Default)]
pub struct VisibilityCycleDetector {
    params: CycleParams,
    tag_filter: Option<BTreeSet<TagId>>,
    state: CycleState,
}

impl VisibilityCycleDetector {
    pub fn new(params: CycleParams) -> Self {
        Self {
            params,
            tag_filter: None,
            state: CycleState::default(),
        }
    }

    /// Only count tags from `tags`; everything else is ignored.
    pub fn with_tag_filter(mut self, tags: BTreeSet<TagId>) -> Self {
        self.tag_filter = Some(tags);
        self
    }

    #[inline]
    pub fn state(&self) -> &CycleState {
        &self.state
    }

    #[inline]
    pub fn cycle_count(&self) -> u64 {
        self.state.cycle_count
    }

    /// Add the tags visible in one frame. Returns how many cycles completed.
    ///
    /// Tags are inserted in ascending order and the target is checked after
    /// every insert, so leftovers of a completing frame seed the next cycle.
    pub fn update(&mut self, visible: impl IntoIterator<Item = TagId>) -> u32 {
        let expected = self.params.expected_markers.max(1);
        let tags: BTreeSet<TagId> = visible
            .into_iter()
            .filter(|t| self.tag_filter.as_ref().is_none_or(|f| f.contains(t)))
            .collect();

        let mut completed = 0;
        for tag in tags {
            self.state.seen_tags_since_cycle.insert(tag);
            if self.state.seen_tags_since_cycle.len() >= expected {
                self.state.seen_tags_since_cycle.clear();
                self.state.cycle_count += 1;
                completed += 1;
                info!("visibility cycle {} complete", self.state.cycle_count);
            }
        }
        completed
    }
}
