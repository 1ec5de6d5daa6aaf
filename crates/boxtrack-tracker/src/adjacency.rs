//! Static face-adjacency model.
//!
//! An edge `a -> (b, θ)` says the box edge carrying marker `a` touches (or
//! directly opposes) the edge carrying marker `b`, offset by the fixed
//! dihedral angle `θ`. Every edge must be stored in both directions with the
//! same angle; asymmetric tables are rejected at construction.

use std::collections::BTreeMap;

use boxtrack_core::{normalize_degrees, TagId};
use serde::{Deserialize, Serialize};

const ANGLE_EPS_DEG: f64 = 1e-9;

/// One directed adjacency relation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyEdge {
    pub source: TagId,
    pub target: TagId,
    pub angle_deg: f64,
}

/// Undirected relation as written in configuration files.
///
/// Expands to `a -> b` and `b -> a`, both with `angle_deg`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyPair {
    pub a: TagId,
    pub b: TagId,
    pub angle_deg: f64,
}

impl AdjacencyPair {
    pub fn new(a: TagId, b: TagId, angle_deg: f64) -> Self {
        Self { a, b, angle_deg }
    }
}

/// A marker related to the queried one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjacentTag {
    pub tag_id: TagId,
    pub angle_deg: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AdjacencyError {
    #[error("edge {from_tag} -> {to_tag} has non-finite angle")]
    NonFiniteAngle { from_tag: TagId, to_tag: TagId },
    #[error("tag {tag_id} is listed as adjacent to itself")]
    SelfLoop { tag_id: TagId },
    #[error("edge {from_tag} -> {to_tag} is listed more than once")]
    DuplicateEdge { from_tag: TagId, to_tag: TagId },
    #[error("edge {from_tag} -> {to_tag} ({angle_deg} deg) has no matching reverse edge")]
    Asymmetric {
        from_tag: TagId,
        to_tag: TagId,
        angle_deg: f64,
    },
}

/// Validated, symmetric adjacency multimap.
///
/// Lookups of unknown tags return an empty slice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceAdjacency {
    related: BTreeMap<TagId, Vec<AdjacentTag>>,
}

impl FaceAdjacency {
    /// Build from directed edges. Both directions must be present.
    pub fn new(edges: impl IntoIterator<Item = AdjacencyEdge>) -> Result<Self, AdjacencyError> {
        let mut related: BTreeMap<TagId, Vec<AdjacentTag>> = BTreeMap::new();
        for edge in edges {
            let AdjacencyEdge { source, target, .. } = edge;
            if !edge.angle_deg.is_finite() {
                return Err(AdjacencyError::NonFiniteAngle {
                    from_tag: source,
                    to_tag: target,
                });
            }
            if source == target {
                return Err(AdjacencyError::SelfLoop { tag_id: source });
            }
            let list = related.entry(source).or_default();
            if list.iter().any(|r| r.tag_id == target) {
                return Err(AdjacencyError::DuplicateEdge {
                    from_tag: source,
                    to_tag: target,
                });
            }
            list.push(AdjacentTag {
                tag_id: target,
                angle_deg: normalize_degrees(edge.angle_deg),
            });
        }

        let model = Self { related };
        model.check_symmetric()?;
        Ok(model)
    }

    /// Build from undirected pairs, storing each in both directions.
    pub fn from_undirected(
        pairs: impl IntoIterator<Item = AdjacencyPair>,
    ) -> Result<Self, AdjacencyError> {
        Self::new(pairs.into_iter().flat_map(|p| {
            [
                AdjacencyEdge {
                    source: p.a,
                    target: p.b,
                    angle_deg: p.angle_deg,
                },
                AdjacencyEdge {
                    source: p.b,
                    target: p.a,
                    angle_deg: p.angle_deg,
                },
            ]
        }))
    }

    fn check_symmetric(&self) -> Result<(), AdjacencyError> {
        for (&source, list) in &self.related {
            for rel in list {
                let reverse_ok = self.related(rel.tag_id).iter().any(|back| {
                    back.tag_id == source && angles_match(back.angle_deg, rel.angle_deg)
                });
                if !reverse_ok {
                    return Err(AdjacencyError::Asymmetric {
                        from_tag: source,
                        to_tag: rel.tag_id,
                        angle_deg: rel.angle_deg,
                    });
                }
            }
        }
        Ok(())
    }

    /// Markers related to `tag_id`, in the order they were declared.
    pub fn related(&self, tag_id: TagId) -> &[AdjacentTag] {
        self.related.get(&tag_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All directed edges, ordered by source tag.
    pub fn edges(&self) -> impl Iterator<Item = AdjacencyEdge> + '_ {
        self.related.iter().flat_map(|(&source, list)| {
            list.iter().map(move |r| AdjacencyEdge {
                source,
                target: r.tag_id,
                angle_deg: r.angle_deg,
            })
        })
    }

    /// One pair per undirected relation (`a < b`), suitable for writing back
    /// to a configuration file.
    pub fn undirected_pairs(&self) -> Vec<AdjacencyPair> {
        self.edges()
            .filter(|e| e.source < e.target)
            .map(|e| AdjacencyPair::new(e.source, e.target, e.angle_deg))
            .collect()
    }

    /// Number of directed edges.
    pub fn len(&self) -> usize {
        self.related.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.related.is_empty()
    }
}

fn angles_match(a: f64, b: f64) -> bool {
    boxtrack_core::wrap_delta_degrees(a, b).abs() <= ANGLE_EPS_DEG
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: TagId, target: TagId, angle_deg: f64) -> AdjacencyEdge {
        AdjacencyEdge {
            source,
            target,
            angle_deg,
        }
    }

    #[test]
    fn lookup_works_from_either_side() {
        let adj = FaceAdjacency::from_undirected([AdjacencyPair::new(3, 24, 90.0)]).unwrap();
        assert_eq!(
            adj.related(3),
            &[AdjacentTag {
                tag_id: 24,
                angle_deg: 90.0
            }]
        );
        assert_eq!(
            adj.related(24),
            &[AdjacentTag {
                tag_id: 3,
                angle_deg: 90.0
            }]
        );
        assert_eq!(adj.len(), 2);
    }

    #[test]
    fn unknown_tag_has_no_relations() {
        let adj = FaceAdjacency::from_undirected([AdjacencyPair::new(0, 1, 90.0)]).unwrap();
        assert!(adj.related(42).is_empty());
    }

    #[test]
    fn one_directional_edge_fails_fast() {
        let err = FaceAdjacency::new([edge(0, 1, 90.0)]).unwrap_err();
        assert_eq!(
            err,
            AdjacencyError::Asymmetric {
                from_tag: 0,
                to_tag: 1,
                angle_deg: 90.0
            }
        );
    }

    #[test]
    fn reverse_edge_with_other_angle_is_asymmetric() {
        let err = FaceAdjacency::new([edge(0, 1, 90.0), edge(1, 0, 180.0)]).unwrap_err();
        assert!(matches!(err, AdjacencyError::Asymmetric { .. }));
    }

    #[test]
    fn duplicate_key_is_rejected_instead_of_overwritten() {
        let err = FaceAdjacency::new([
            edge(0, 1, 90.0),
            edge(1, 0, 90.0),
            edge(0, 1, 180.0),
        ])
        .unwrap_err();
        assert_eq!(err, AdjacencyError::DuplicateEdge {
                from_tag: 0,
                to_tag: 1
            });
    }

    #[test]
    fn multimap_keeps_every_relation_of_a_tag() {
        let adj = FaceAdjacency::from_undirected([
            AdjacencyPair::new(0, 1, 90.0),
            AdjacencyPair::new(0, 24, 180.0),
            AdjacencyPair::new(0, 25, 90.0),
        ])
        .unwrap();
        let ids: Vec<TagId> = adj.related(0).iter().map(|r| r.tag_id).collect();
        assert_eq!(ids, vec![1, 24, 25]);
    }

    #[test]
    fn self_loop_and_nan_are_rejected() {
        assert_eq!(
            FaceAdjacency::new([edge(5, 5, 0.0)]).unwrap_err(),
            AdjacencyError::SelfLoop { tag_id: 5 }
        );
        assert!(matches!(
            FaceAdjacency::new([edge(5, 6, f64::NAN)]).unwrap_err(),
            AdjacencyError::NonFiniteAngle {
                from_tag: 5,
                to_tag: 6
            }
        ));
    }

    #[test]
    fn undirected_pairs_roundtrip_the_table() {
        let pairs = vec![AdjacencyPair::new(0, 1, 90.0), AdjacencyPair::new(1, 24, 90.0)];
        let adj = FaceAdjacency::from_undirected(pairs.clone()).unwrap();
        assert_eq!(adj.undirected_pairs(), pairs);
    }
}
