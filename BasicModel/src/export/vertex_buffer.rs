//! Final vertex buffer construction
//!
//! Runs in two passes over the permutations from [`deduplicate`](super::dedup::deduplicate):
//! first every (source vertex, permutation) pair is assigned its final vertex
//! id, then face corners are rewritten by looking those ids up. Faces are
//! never touched while the id table is being built.
//!
//! The first permutation of a vertex keeps the vertex's original slot; each
//! further permutation is appended after all source vertices.

use bmformat::bmf::BmVertex;

use super::dedup::VertexPermutations;
use crate::snapshot::MeshSnapshot;

/// Final vertex id for every (source vertex, permutation) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexRemap {
    ids: Vec<Vec<u32>>,
    vertex_count: usize,
}

impl VertexRemap {
    pub fn build(permutations: &VertexPermutations) -> Self {
        let source_count = permutations.per_vertex.len();
        let mut next = source_count as u32;

        let ids = permutations
            .per_vertex
            .iter()
            .enumerate()
            .map(|(vertex, perms)| {
                let mut ids = Vec::with_capacity(perms.len().max(1));
                ids.push(vertex as u32);
                for _ in perms.iter().skip(1) {
                    ids.push(next);
                    next += 1;
                }
                ids
            })
            .collect();

        Self {
            ids,
            vertex_count: next as usize,
        }
    }

    pub fn get(&self, vertex: u32, permutation: usize) -> Option<u32> {
        self.ids.get(vertex as usize)?.get(permutation).copied()
    }

    /// Number of vertices in the final buffer.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Materialize the final vertices.
///
/// Every vertex carries exactly `uv_channels` UV pairs and the snapshot's
/// color channels. Loose vertices keep their smooth normal and zeroed
/// UV and color values.
pub fn build_vertices(
    snapshot: &MeshSnapshot,
    permutations: &VertexPermutations,
    remap: &VertexRemap,
    uv_channels: usize,
) -> Vec<BmVertex> {
    let color_channels = snapshot.color_channel_count;
    let mut vertices: Vec<BmVertex> = snapshot
        .vertices
        .iter()
        .map(|v| BmVertex::new(v.position, v.normal, uv_channels, color_channels))
        .collect();
    vertices.resize(remap.vertex_count(), BmVertex::default());

    for (vertex, perms) in permutations.per_vertex.iter().enumerate() {
        let position = snapshot.vertices[vertex].position;
        for (index, perm) in perms.iter().enumerate() {
            let Some(id) = remap.get(vertex as u32, index) else {
                continue;
            };
            vertices[id as usize] = BmVertex {
                position,
                normal: perm.key.normal,
                uvs: perm.key.uvs.clone(),
                colors: perm.key.colors.clone(),
            };
        }
    }

    vertices
}

/// Final vertex index of every face corner, per face.
pub fn rewrite_corners(
    snapshot: &MeshSnapshot,
    permutations: &VertexPermutations,
    remap: &VertexRemap,
) -> Vec<Vec<u32>> {
    snapshot
        .faces
        .iter()
        .zip(&permutations.corner_permutation)
        .map(|(face, perm_indices)| {
            face.corners
                .iter()
                .zip(perm_indices)
                .map(|(corner, &perm)| remap.get(corner.vertex, perm).unwrap_or(corner.vertex))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::dedup::deduplicate;
    use crate::snapshot::Corner;
    use glam::{Vec2, Vec3};
    use pretty_assertions::assert_eq;

    /// Two triangles sharing the edge 0-2 with a UV seam on vertex 0.
    fn seam_mesh() -> MeshSnapshot {
        let mut mesh = MeshSnapshot::new("Seam", 1, 0);
        mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0), Vec3::Z);
        mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0), Vec3::Z);
        mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);

        let c = |v: u32, u: f32| Corner::new(v, Vec3::Z).with_uvs(vec![Vec2::new(u, 0.0)]);
        mesh.add_face(0, vec![c(0, 0.0), c(1, 0.1), c(2, 0.2)]);
        mesh.add_face(0, vec![c(0, 0.9), c(2, 0.2), c(3, 0.3)]);
        mesh
    }

    #[test]
    fn test_seam_vertex_is_cloned() {
        let mesh = seam_mesh();
        let perms = deduplicate(&mesh).unwrap();
        let remap = VertexRemap::build(&perms);
        assert_eq!(remap.vertex_count(), 5);
        assert_eq!(remap.get(0, 0), Some(0));
        assert_eq!(remap.get(0, 1), Some(4));

        let vertices = build_vertices(&mesh, &perms, &remap, 1);
        assert_eq!(vertices.len(), 5);
        assert_eq!(vertices[4].position, Vec3::ZERO);
        assert_eq!(vertices[0].uvs, vec![Vec2::new(0.0, 0.0)]);
        assert_eq!(vertices[4].uvs, vec![Vec2::new(0.9, 0.0)]);

        let faces = rewrite_corners(&mesh, &perms, &remap);
        assert_eq!(faces, vec![vec![0, 1, 2], vec![4, 2, 3]]);
    }

    #[test]
    fn test_every_corner_resolves_to_its_own_attributes() {
        let mesh = seam_mesh();
        let perms = deduplicate(&mesh).unwrap();
        let remap = VertexRemap::build(&perms);
        let vertices = build_vertices(&mesh, &perms, &remap, 1);
        let faces = rewrite_corners(&mesh, &perms, &remap);

        for (face, indices) in mesh.faces.iter().zip(&faces) {
            for (corner, &index) in face.corners.iter().zip(indices) {
                let vertex = &vertices[index as usize];
                assert_eq!(vertex.normal, corner.normal);
                assert_eq!(vertex.uvs, corner.uvs);
                assert_eq!(vertex.position, mesh.vertices[corner.vertex as usize].position);
            }
        }
    }

    #[test]
    fn test_loose_vertex_keeps_defaults() {
        let mut mesh = seam_mesh();
        mesh.add_vertex(Vec3::ONE, Vec3::Y);
        let perms = deduplicate(&mesh).unwrap();
        let remap = VertexRemap::build(&perms);
        let vertices = build_vertices(&mesh, &perms, &remap, 1);

        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[4], BmVertex::new(Vec3::ONE, Vec3::Y, 1, 0));
        // clones go after every source vertex
        assert_eq!(vertices[5].uvs, vec![Vec2::new(0.9, 0.0)]);
    }
}
