//! Triangulation and per-material grouping

use bmformat::bmf::BmSubMesh;
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::snapshot::MeshSnapshot;

/// Bucket the faces of `snapshot` into triangle lists keyed by material index.
///
/// `face_indices` holds the final vertex index of every corner, as returned by
/// [`rewrite_corners`](super::vertex_buffer::rewrite_corners). Triangles are
/// kept as they are; quads are fanned into `(c0, c1, c2)` and `(c0, c2, c3)`.
/// Any other corner count fails the mesh. Buckets keep the order in which
/// their material was first seen.
pub fn group_submeshes(
    snapshot: &MeshSnapshot,
    face_indices: &[Vec<u32>],
) -> Result<IndexMap<u32, BmSubMesh>> {
    let mut submeshes: IndexMap<u32, BmSubMesh> = IndexMap::new();

    for (face_index, (face, indices)) in snapshot.faces.iter().zip(face_indices).enumerate() {
        let submesh = submeshes
            .entry(face.material_index)
            .or_insert_with(|| BmSubMesh {
                material_name: snapshot
                    .material_name(face.material_index)
                    .unwrap_or_default()
                    .to_string(),
                ..BmSubMesh::new(face.material_index)
            });

        match indices.as_slice() {
            &[a, b, c] => submesh.indices.extend([a, b, c]),
            &[a, b, c, d] => submesh.indices.extend([a, b, c, a, c, d]),
            other => {
                return Err(Error::UnsupportedFaceCorners {
                    mesh: snapshot.name.clone(),
                    face: face_index,
                    corners: other.len(),
                });
            }
        }
    }

    tracing::debug!(
        "Grouped '{}' into {} submeshes",
        snapshot.name,
        submeshes.len()
    );

    Ok(submeshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Corner;
    use glam::Vec3;
    use pretty_assertions::assert_eq;

    fn mesh_with_faces(faces: &[(u32, &[u32])]) -> (MeshSnapshot, Vec<Vec<u32>>) {
        let mut mesh = MeshSnapshot::new("Faces", 0, 0);
        mesh.material_names = vec!["Stone".to_string(), "Wood".to_string()];
        for _ in 0..8 {
            mesh.add_vertex(Vec3::ZERO, Vec3::Z);
        }
        for &(material, corners) in faces {
            mesh.add_face(
                material,
                corners.iter().map(|&v| Corner::new(v, Vec3::Z)).collect(),
            );
        }
        let indices = faces.iter().map(|(_, c)| c.to_vec()).collect();
        (mesh, indices)
    }

    #[test]
    fn test_quad_fan() {
        let (mesh, indices) = mesh_with_faces(&[(0, &[0, 1, 2, 3])]);
        let submeshes = group_submeshes(&mesh, &indices).unwrap();
        assert_eq!(submeshes[&0].indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(submeshes[&0].material_name, "Stone");
    }

    #[test]
    fn test_buckets_in_first_seen_order() {
        let (mesh, indices) = mesh_with_faces(&[
            (1, &[0, 1, 2]),
            (0, &[3, 4, 5]),
            (1, &[5, 6, 7]),
            (2, &[0, 2, 4]),
        ]);
        let submeshes = group_submeshes(&mesh, &indices).unwrap();

        let keys: Vec<u32> = submeshes.keys().copied().collect();
        assert_eq!(keys, vec![1, 0, 2]);
        assert_eq!(submeshes[&1].indices, vec![0, 1, 2, 5, 6, 7]);
        assert_eq!(submeshes[&2].material_name, "");
        assert!(submeshes.values().all(|s| s.indices.len() % 3 == 0));
    }

    #[test]
    fn test_ngon_is_rejected() {
        let (mesh, indices) = mesh_with_faces(&[(0, &[0, 1, 2]), (0, &[0, 1, 2, 3, 4])]);
        let err = group_submeshes(&mesh, &indices).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFaceCorners { face: 1, corners: 5, .. }
        ));
    }

    #[test]
    fn test_degenerate_face_is_rejected() {
        let (mesh, indices) = mesh_with_faces(&[(0, &[0, 1])]);
        assert!(matches!(
            group_submeshes(&mesh, &indices),
            Err(Error::UnsupportedFaceCorners { corners: 2, .. })
        ));
    }
}
