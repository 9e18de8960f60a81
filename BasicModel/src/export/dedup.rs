//! Attribute deduplication
//!
//! Groups the face corners of every source vertex into permutations: the
//! distinct (normal, UV tuple, color tuple) combinations seen at that vertex.
//! A vertex with more than one permutation sits on a seam or hard edge and
//! is split by the vertex buffer builder.
//!
//! Corners are visited in face order, then corner order. Each corner is
//! compared against the vertex's existing permutations in creation order and
//! joins the first exact match (component-wise `==`, no epsilon). This is
//! `O(V * P^2)` in the worst case with `P` permutations per vertex. `P` is
//! the seam multiplicity and stays small, and a linear scan keeps the
//! permutation order (and with it the output vertex order) stable.

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::snapshot::{Corner, MeshSnapshot};

/// A (face, corner slot) location in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerRef {
    pub face: usize,
    pub slot: usize,
}

/// Attribute values compared between corners.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeKey {
    pub normal: Vec3,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec3>,
}

impl AttributeKey {
    fn from_corner(corner: &Corner) -> Self {
        Self {
            normal: corner.normal,
            uvs: corner.uvs.clone(),
            colors: corner.colors.clone(),
        }
    }

    fn matches(&self, corner: &Corner) -> bool {
        self.normal == corner.normal && self.uvs == corner.uvs && self.colors == corner.colors
    }
}

/// One distinct attribute combination of a vertex and the corners sharing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Permutation {
    pub key: AttributeKey,
    pub corners: Vec<CornerRef>,
}

/// Result of deduplicating one snapshot.
#[derive(Debug, Clone, Default)]
pub struct VertexPermutations {
    /// Permutations per source vertex, in creation order. Empty for loose vertices.
    pub per_vertex: Vec<Vec<Permutation>>,
    /// For every face corner, the index of the permutation it joined.
    pub corner_permutation: Vec<Vec<usize>>,
}

impl VertexPermutations {
    /// Vertex count after splitting; loose vertices keep their slot.
    pub fn split_vertex_count(&self) -> usize {
        self.per_vertex.iter().map(|p| p.len().max(1)).sum()
    }

    /// Source vertices that carry more than one permutation.
    pub fn seam_vertex_count(&self) -> usize {
        self.per_vertex.iter().filter(|p| p.len() > 1).count()
    }
}

/// Partition every vertex's corners into attribute permutations.
pub fn deduplicate(snapshot: &MeshSnapshot) -> Result<VertexPermutations> {
    let mut per_vertex: Vec<Vec<Permutation>> = vec![Vec::new(); snapshot.vertices.len()];
    let mut corner_permutation = Vec::with_capacity(snapshot.faces.len());

    for (face_index, face) in snapshot.faces.iter().enumerate() {
        let mut face_permutations = Vec::with_capacity(face.corners.len());

        for (slot, corner) in face.corners.iter().enumerate() {
            let Some(permutations) = per_vertex.get_mut(corner.vertex as usize) else {
                return Err(Error::CornerVertexOutOfRange {
                    mesh: snapshot.name.clone(),
                    face: face_index,
                    vertex: corner.vertex,
                    vertex_count: snapshot.vertices.len(),
                });
            };

            let location = CornerRef {
                face: face_index,
                slot,
            };
            let index = match permutations.iter().position(|p| p.key.matches(corner)) {
                Some(index) => {
                    permutations[index].corners.push(location);
                    index
                }
                None => {
                    permutations.push(Permutation {
                        key: AttributeKey::from_corner(corner),
                        corners: vec![location],
                    });
                    permutations.len() - 1
                }
            };
            face_permutations.push(index);
        }

        corner_permutation.push(face_permutations);
    }

    let result = VertexPermutations {
        per_vertex,
        corner_permutation,
    };

    tracing::debug!(
        "Deduplicated '{}': {} vertices, {} after splitting ({} on seams)",
        snapshot.name,
        snapshot.vertices.len(),
        result.split_vertex_count(),
        result.seam_vertex_count()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corner(vertex: u32, u: f32) -> Corner {
        Corner::new(vertex, Vec3::Z).with_uvs(vec![Vec2::new(u, 0.0)])
    }

    fn two_triangles(second_uv: f32) -> MeshSnapshot {
        let mut mesh = MeshSnapshot::new("Pair", 1, 0);
        for _ in 0..4 {
            mesh.add_vertex(Vec3::ZERO, Vec3::Z);
        }
        mesh.add_face(0, vec![corner(0, 0.0), corner(1, 0.0), corner(2, 0.0)]);
        mesh.add_face(0, vec![corner(0, second_uv), corner(2, 0.0), corner(3, 0.0)]);
        mesh
    }

    #[test]
    fn test_shared_attributes_make_one_permutation() {
        let result = deduplicate(&two_triangles(0.0)).unwrap();
        assert_eq!(result.per_vertex[0].len(), 1);
        assert_eq!(
            result.per_vertex[0][0].corners,
            vec![CornerRef { face: 0, slot: 0 }, CornerRef { face: 1, slot: 0 }]
        );
        assert_eq!(result.split_vertex_count(), 4);
        assert_eq!(result.seam_vertex_count(), 0);
    }

    #[test]
    fn test_uv_seam_makes_two_permutations() {
        let result = deduplicate(&two_triangles(0.5)).unwrap();
        assert_eq!(result.per_vertex[0].len(), 2);
        assert_eq!(result.corner_permutation, vec![vec![0, 0, 0], vec![1, 0, 0]]);
        assert_eq!(result.split_vertex_count(), 5);
    }

    #[test]
    fn test_first_match_in_creation_order() {
        let mut mesh = MeshSnapshot::new("Fan", 1, 0);
        for _ in 0..3 {
            mesh.add_vertex(Vec3::ZERO, Vec3::Z);
        }
        for u in [0.0, 0.5, 0.0, 0.5] {
            mesh.add_face(0, vec![corner(0, u), corner(1, 0.0), corner(2, 0.0)]);
        }

        let result = deduplicate(&mesh).unwrap();
        let faces: Vec<Vec<usize>> = result.per_vertex[0]
            .iter()
            .map(|p| p.corners.iter().map(|c| c.face).collect())
            .collect();
        assert_eq!(faces, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn test_normals_and_colors_split() {
        let mut mesh = MeshSnapshot::new("Edge", 0, 1);
        for _ in 0..3 {
            mesh.add_vertex(Vec3::ZERO, Vec3::Z);
        }
        let plain = |v: u32, n: Vec3, c: Vec3| Corner::new(v, n).with_colors(vec![c]);
        mesh.add_face(
            0,
            vec![
                plain(0, Vec3::Z, Vec3::ONE),
                plain(1, Vec3::Z, Vec3::ONE),
                plain(2, Vec3::Z, Vec3::ONE),
            ],
        );
        // hard edge at vertex 0, color change at vertex 1
        mesh.add_face(
            0,
            vec![
                plain(0, Vec3::X, Vec3::ONE),
                plain(1, Vec3::Z, Vec3::ZERO),
                plain(2, Vec3::Z, Vec3::ONE),
            ],
        );

        let result = deduplicate(&mesh).unwrap();
        assert_eq!(result.per_vertex[0].len(), 2);
        assert_eq!(result.per_vertex[1].len(), 2);
        assert_eq!(result.per_vertex[2].len(), 1);
    }

    #[test]
    fn test_loose_vertex_has_no_permutations() {
        let mut mesh = two_triangles(0.0);
        mesh.add_vertex(Vec3::ONE, Vec3::Y);
        let result = deduplicate(&mesh).unwrap();
        assert!(result.per_vertex[4].is_empty());
        assert_eq!(result.split_vertex_count(), 5);
    }
}
