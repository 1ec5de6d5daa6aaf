//! Physical box description: named faces, their marker corner slots, and the
//! adjacency table relating markers across faces.

use std::collections::{BTreeMap, BTreeSet};

use boxtrack_core::TagId;
use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyError, AdjacencyPair, FaceAdjacency};

/// Marker position on a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerSlot {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CornerSlot {
    pub const ALL: [CornerSlot; 4] = [
        CornerSlot::TopLeft,
        CornerSlot::TopRight,
        CornerSlot::BottomLeft,
        CornerSlot::BottomRight,
    ];
}

/// Up to four markers glued to one face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceCorners {
    #[serde(default)]
    pub top_left: Option<TagId>,
    #[serde(default)]
    pub top_right: Option<TagId>,
    #[serde(default)]
    pub bottom_left: Option<TagId>,
    #[serde(default)]
    pub bottom_right: Option<TagId>,
}

impl FaceCorners {
    #[inline]
    pub fn get(&self, slot: CornerSlot) -> Option<TagId> {
        match slot {
            CornerSlot::TopLeft => self.top_left,
            CornerSlot::TopRight => self.top_right,
            CornerSlot::BottomLeft => self.bottom_left,
            CornerSlot::BottomRight => self.bottom_right,
        }
    }

    /// Occupied slots in `TL, TR, BL, BR` order.
    pub fn occupied(&self) -> impl Iterator<Item = (CornerSlot, TagId)> + '_ {
        CornerSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|tag| (slot, tag)))
    }
}

/// A named physical face.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub name: String,
    #[serde(default)]
    pub corners: FaceCorners,
}

impl Face {
    /// Face with a single marker on the top-left slot.
    pub fn single(name: impl Into<String>, tag_id: TagId) -> Self {
        Self {
            name: name.into(),
            corners: FaceCorners {
                top_left: Some(tag_id),
                ..FaceCorners::default()
            },
        }
    }
}

/// Serializable layout description, as found in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxLayoutSpec {
    pub faces: Vec<Face>,
    #[serde(default)]
    pub adjacency: Vec<AdjacencyPair>,
}

impl Default for BoxLayoutSpec {
    /// The tracked box: four faces around the rotation axis, one marker each.
    /// Neighbouring faces meet at 90 deg, opposite faces are 180 deg apart.
    fn default() -> Self {
        Self {
            faces: vec![
                Face::single("right", 0),
                Face::single("bottom", 1),
                Face::single("left", 24),
                Face::single("top", 25),
            ],
            adjacency: vec![
                AdjacencyPair::new(0, 1, 90.0),
                AdjacencyPair::new(1, 24, 90.0),
                AdjacencyPair::new(24, 25, 90.0),
                AdjacencyPair::new(25, 0, 90.0),
                AdjacencyPair::new(0, 24, 180.0),
                AdjacencyPair::new(1, 25, 180.0),
            ],
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("face #{index} has an empty name")]
    EmptyFaceName { index: usize },
    #[error("face name {name:?} is used twice")]
    DuplicateFace { name: String },
    #[error("tag {tag_id} is placed on both {first} and {second}")]
    TagOnTwoSlots {
        tag_id: TagId,
        first: String,
        second: String,
    },
    #[error(transparent)]
    Adjacency(#[from] AdjacencyError),
}

/// Validated layout with a tag -> face index.
#[derive(Clone, Debug)]
pub struct BoxLayout {
    faces: Vec<Face>,
    tag_slots: BTreeMap<TagId, (usize, CornerSlot)>,
    adjacency: FaceAdjacency,
}

impl BoxLayout {
    pub fn new(spec: BoxLayoutSpec) -> Result<Self, LayoutError> {
        let mut names = BTreeSet::new();
        let mut tag_slots: BTreeMap<TagId, (usize, CornerSlot)> = BTreeMap::new();

        for (index, face) in spec.faces.iter().enumerate() {
            if face.name.trim().is_empty() {
                return Err(LayoutError::EmptyFaceName { index });
            }
            if !names.insert(face.name.as_str()) {
                return Err(LayoutError::DuplicateFace {
                    name: face.name.clone(),
                });
            }
            for (slot, tag_id) in face.corners.occupied() {
                if let Some(&(prev_face, prev_slot)) = tag_slots.get(&tag_id) {
                    return Err(LayoutError::TagOnTwoSlots {
                        tag_id,
                        first: slot_label(&spec.faces[prev_face], prev_slot),
                        second: slot_label(face, slot),
                    });
                }
                tag_slots.insert(tag_id, (index, slot));
            }
        }

        let adjacency = FaceAdjacency::from_undirected(spec.adjacency)?;

        Ok(Self {
            faces: spec.faces,
            tag_slots,
            adjacency,
        })
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn adjacency(&self) -> &FaceAdjacency {
        &self.adjacency
    }

    /// Face and slot carrying `tag_id`, if the tag is part of the layout.
    pub fn face_of(&self, tag_id: TagId) -> Option<(&Face, CornerSlot)> {
        self.tag_slots
            .get(&tag_id)
            .map(|&(index, slot)| (&self.faces[index], slot))
    }

    /// Names of the faces showing at least one of `tags`, sorted and unique.
    pub fn faces_for_tags(&self, tags: impl IntoIterator<Item = TagId>) -> Vec<String> {
        let names: BTreeSet<&str> = tags
            .into_iter()
            .filter_map(|t| self.face_of(t))
            .map(|(face, _)| face.name.as_str())
            .collect();
        names.into_iter().map(str::to_owned).collect()
    }

    /// Every tag placed on some face.
    pub fn face_tags(&self) -> BTreeSet<TagId> {
        self.tag_slots.keys().copied().collect()
    }

    /// Serializable form of this layout.
    pub fn to_spec(&self) -> BoxLayoutSpec {
        BoxLayoutSpec {
            faces: self.faces.clone(),
            adjacency: self.adjacency.undirected_pairs(),
        }
    }
}

fn slot_label(face: &Face, slot: CornerSlot) -> String {
    format!("{}/{:?}", face.name, slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid_and_symmetric() {
        let layout = BoxLayout::new(BoxLayoutSpec::default()).unwrap();
        assert_eq!(layout.faces().len(), 4);
        assert_eq!(layout.face_tags(), BTreeSet::from([0, 1, 24, 25]));
        assert_eq!(layout.adjacency().len(), 12);
        assert_eq!(layout.adjacency().related(24).len(), 3);
    }

    #[test]
    fn visible_faces_are_named_sorted_and_unique() {
        let layout = BoxLayout::new(BoxLayoutSpec::default()).unwrap();
        let faces = layout.faces_for_tags([25, 0, 99, 25]);
        assert_eq!(faces, vec!["right".to_string(), "top".to_string()]);
    }

    #[test]
    fn face_lookup_reports_slot() {
        let spec = BoxLayoutSpec {
            faces: vec![Face {
                name: "front".into(),
                corners: FaceCorners {
                    top_left: Some(10),
                    bottom_right: Some(13),
                    ..FaceCorners::default()
                },
            }],
            adjacency: Vec::new(),
        };
        let layout = BoxLayout::new(spec).unwrap();
        let (face, slot) = layout.face_of(13).unwrap();
        assert_eq!(face.name, "front");
        assert_eq!(slot, CornerSlot::BottomRight);
        assert!(layout.face_of(11).is_none());
    }

    #[test]
    fn tag_on_two_faces_is_rejected() {
        let spec = BoxLayoutSpec {
            faces: vec![Face::single("a", 1), Face::single("b", 1)],
            adjacency: Vec::new(),
        };
        assert!(matches!(
            BoxLayout::new(spec),
            Err(LayoutError::TagOnTwoSlots { tag_id: 1, .. })
        ));
    }

    #[test]
    fn duplicate_face_name_is_rejected() {
        let spec = BoxLayoutSpec {
            faces: vec![Face::single("top", 1), Face::single("top", 2)],
            adjacency: Vec::new(),
        };
        assert_eq!(
            BoxLayout::new(spec).unwrap_err(),
            LayoutError::DuplicateFace { name: "top".into() }
        );
    }

    #[test]
    fn spec_roundtrips_through_json() {
        let json = serde_json::to_string(&BoxLayoutSpec::default()).unwrap();
        let back: BoxLayoutSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BoxLayoutSpec::default());
    }
}
