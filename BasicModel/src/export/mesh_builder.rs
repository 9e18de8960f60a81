//! Snapshot to [`BmMesh`] conversion

use bmformat::bmf::{BmMesh, interleaved_layout};

use super::dedup::deduplicate;
use super::index_type::select_index_type;
use super::submesh::group_submeshes;
use super::vertex_buffer::{VertexRemap, build_vertices, rewrite_corners};
use super::{ExportContext, MeshSummary};
use crate::error::Result;
use crate::snapshot::MeshSnapshot;

/// Run one snapshot through the whole pipeline.
///
/// The snapshot is validated, its UV channels are conformed to the
/// configured count, vertices are split on attribute seams, faces are
/// triangulated into per-material submeshes and the index width is chosen.
/// The mesh name is only registered with the context once everything else
/// has succeeded.
pub fn build_mesh(mut snapshot: MeshSnapshot, context: &mut ExportContext<'_>) -> Result<(BmMesh, MeshSummary)> {
    let options = context.options;
    let uv_channels = options.uv_channel_count;

    snapshot.validate()?;
    if snapshot.uv_channel_count != uv_channels {
        tracing::debug!(
            "Conforming '{}' from {} to {} UV channels",
            snapshot.name,
            snapshot.uv_channel_count,
            uv_channels
        );
        snapshot.conform_uv_channels(uv_channels);
    }

    let permutations = deduplicate(&snapshot)?;
    let remap = VertexRemap::build(&permutations);
    let vertices = build_vertices(&snapshot, &permutations, &remap, uv_channels);
    let face_indices = rewrite_corners(&snapshot, &permutations, &remap);
    let submeshes = group_submeshes(&snapshot, &face_indices)?;
    let index_type = select_index_type(options.index_type, vertices.len(), &snapshot.name)?;
    let attributes = interleaved_layout(uv_channels)?;

    let name = context.names.assign(snapshot.display_name());

    let mesh = BmMesh {
        name,
        vertices,
        interleaved: options.interleaved,
        index_type,
        submeshes,
        attributes,
    };

    let summary = MeshSummary {
        source_name: snapshot.name.clone(),
        name: mesh.name.clone(),
        source_vertex_count: snapshot.vertices.len(),
        vertex_count: mesh.vertices.len(),
        triangle_count: mesh.triangle_count(),
        submesh_count: mesh.submeshes.len(),
        index_type,
        uv_channels,
        color_channels_omitted: snapshot.color_channel_count,
    };

    if summary.color_channels_omitted > 0 {
        tracing::warn!(
            "Mesh '{}' has {} color channels; vertex colors are not written to BMF files",
            mesh.name,
            summary.color_channels_omitted
        );
    }

    tracing::info!(
        "Built mesh '{}': {} -> {} vertices, {} triangles, {} submeshes, {:?} indices",
        mesh.name,
        summary.source_vertex_count,
        summary.vertex_count,
        summary.triangle_count,
        summary.submesh_count,
        index_type
    );

    Ok((mesh, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::options::{ExportOptions, IndexTypeMode};
    use crate::snapshot::Corner;
    use bmformat::bmf::{AttrMap, IndexType};
    use glam::{Vec2, Vec3};
    use pretty_assertions::assert_eq;

    fn quad(name: &str, uv_channels: usize) -> MeshSnapshot {
        let mut mesh = MeshSnapshot::new(name, uv_channels, 0);
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        for p in positions {
            mesh.add_vertex(p, Vec3::Z);
        }
        let corners = (0..4u32)
            .map(|v| {
                let uv = positions[v as usize].truncate();
                Corner::new(v, Vec3::Z).with_uvs(vec![uv; uv_channels])
            })
            .collect();
        mesh.add_face(0, corners);
        mesh
    }

    #[test]
    fn test_quad_builds_two_triangles() {
        let options = ExportOptions::default();
        let mut context = ExportContext::new(&options);
        let (mesh, summary) = build_mesh(quad("Quad", 1), &mut context).unwrap();

        assert_eq!(mesh.name, "Quad");
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.index_type, IndexType::UInt16);
        assert_eq!(mesh.submeshes[&0].indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.attributes.len(), 3);
        assert_eq!(mesh.attributes[2].attr_map, AttrMap::TexCoord1);

        assert_eq!(summary.triangle_count, 2);
        assert_eq!(summary.color_channels_omitted, 0);
    }

    #[test]
    fn test_uv_channels_follow_options() {
        let options = ExportOptions {
            uv_channel_count: 2,
            ..ExportOptions::default()
        };
        let mut context = ExportContext::new(&options);
        let (mesh, _) = build_mesh(quad("Quad", 1), &mut context).unwrap();

        assert_eq!(mesh.uv_channel_count(), 2);
        assert_eq!(mesh.vertices[2].uvs, vec![Vec2::ONE, Vec2::ZERO]);
        assert_eq!(mesh.attributes.len(), 4);
    }

    #[test]
    fn test_colors_are_reported_as_omitted() {
        let options = ExportOptions::default();
        let mut context = ExportContext::new(&options);
        let mut snapshot = quad("Painted", 1);
        snapshot.color_channel_count = 1;
        for corner in &mut snapshot.faces[0].corners {
            corner.colors = vec![Vec3::X];
        }

        let (mesh, summary) = build_mesh(snapshot, &mut context).unwrap();
        assert_eq!(summary.color_channels_omitted, 1);
        assert_eq!(mesh.vertices[0].colors, vec![Vec3::X]);
    }

    #[test]
    fn test_failed_mesh_does_not_claim_a_name() {
        let options = ExportOptions {
            index_type: IndexTypeMode::UInt16,
            ..ExportOptions::default()
        };
        let mut context = ExportContext::new(&options);
        let mut bad = quad("Cube", 1);
        bad.faces[0].corners.pop();
        bad.faces[0].corners.pop();

        assert!(matches!(
            build_mesh(bad, &mut context),
            Err(Error::UnsupportedFaceCorners { corners: 2, .. })
        ));
        assert!(context.names.is_empty());
    }

    #[test]
    fn test_unnamed_mesh_gets_default_name() {
        let options = ExportOptions::default();
        let mut context = ExportContext::new(&options);
        let (mesh, summary) = build_mesh(quad("", 1), &mut context).unwrap();
        assert_eq!(mesh.name, "DEFAULT_NAME");
        assert_eq!(summary.source_name, "");
    }
}
