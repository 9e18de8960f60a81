//! Finalized mesh snapshots handed to the export pipeline.
//!
//! A snapshot is what a host application produces after evaluating
//! modifiers and applying the coordinate transform: shared vertex positions
//! plus faces whose corners carry their own normal, UV and color values.
//! The same vertex may carry different values at different corners (UV
//! seams, hard edges); the pipeline splits those apart.

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};

/// Name used for meshes the host leaves unnamed.
pub const DEFAULT_MESH_NAME: &str = "DEFAULT_NAME";

/// A shared source vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SnapshotVertex {
    pub position: Vec3,
    /// Smooth vertex normal; only kept for vertices no face references.
    pub normal: Vec3,
}

/// One face corner and the attribute values local to that face.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Corner {
    /// Index into [`MeshSnapshot::vertices`].
    pub vertex: u32,
    pub normal: Vec3,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec3>,
}

impl Corner {
    pub fn new(vertex: u32, normal: Vec3) -> Self {
        Self {
            vertex,
            normal,
            uvs: Vec::new(),
            colors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        self.colors = colors;
        self
    }
}

/// A polygon with its material slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapshotFace {
    pub material_index: u32,
    pub corners: Vec<Corner>,
}

/// A finalized mesh as delivered by a [`MeshSource`](crate::export::MeshSource).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshSnapshot {
    pub name: String,
    pub vertices: Vec<SnapshotVertex>,
    pub faces: Vec<SnapshotFace>,
    /// Material names by material index; may be shorter than the highest index used.
    pub material_names: Vec<String>,
    /// UV channels every corner carries.
    pub uv_channel_count: usize,
    /// Color channels every corner carries.
    pub color_channel_count: usize,
}

impl MeshSnapshot {
    pub fn new(name: impl Into<String>, uv_channel_count: usize, color_channel_count: usize) -> Self {
        Self {
            name: name.into(),
            uv_channel_count,
            color_channel_count,
            ..Self::default()
        }
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        self.vertices.push(SnapshotVertex { position, normal });
        (self.vertices.len() - 1) as u32
    }

    pub fn add_face(&mut self, material_index: u32, corners: Vec<Corner>) {
        self.faces.push(SnapshotFace {
            material_index,
            corners,
        });
    }

    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(|f| f.corners.len()).sum()
    }

    pub fn material_name(&self, material_index: u32) -> Option<&str> {
        self.material_names
            .get(material_index as usize)
            .map(String::as_str)
    }

    /// Name to export under; falls back to [`DEFAULT_MESH_NAME`].
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_MESH_NAME
        } else {
            &self.name
        }
    }

    /// Check that every corner references an existing vertex and carries the
    /// declared number of UV and color channels.
    pub fn validate(&self) -> Result<()> {
        for (face_index, face) in self.faces.iter().enumerate() {
            for corner in &face.corners {
                if corner.vertex as usize >= self.vertices.len() {
                    return Err(Error::CornerVertexOutOfRange {
                        mesh: self.name.clone(),
                        face: face_index,
                        vertex: corner.vertex,
                        vertex_count: self.vertices.len(),
                    });
                }
                self.check_channels(face_index, "UV", self.uv_channel_count, corner.uvs.len())?;
                self.check_channels(
                    face_index,
                    "color",
                    self.color_channel_count,
                    corner.colors.len(),
                )?;
            }
        }
        Ok(())
    }

    fn check_channels(&self, face: usize, kind: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            return Ok(());
        }
        Err(Error::InconsistentChannels {
            mesh: self.name.clone(),
            face,
            kind,
            expected,
            found,
        })
    }

    /// Drop or zero-fill corner UV channels so every corner carries `count`.
    pub(crate) fn conform_uv_channels(&mut self, count: usize) {
        if self.uv_channel_count == count {
            return;
        }
        for corner in self.faces.iter_mut().flat_map(|f| f.corners.iter_mut()) {
            corner.uvs.resize(count, Vec2::ZERO);
        }
        self.uv_channel_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshSnapshot {
        let mut mesh = MeshSnapshot::new("Tri", 1, 0);
        for x in 0..3 {
            mesh.add_vertex(Vec3::new(x as f32, 0.0, 0.0), Vec3::Z);
        }
        mesh.add_face(
            0,
            (0..3)
                .map(|v| Corner::new(v, Vec3::Z).with_uvs(vec![Vec2::ZERO]))
                .collect(),
        );
        mesh
    }

    #[test]
    fn test_valid_snapshot() {
        let mesh = triangle();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.corner_count(), 3);
    }

    #[test]
    fn test_corner_out_of_range() {
        let mut mesh = triangle();
        mesh.faces[0].corners[2].vertex = 9;
        assert!(matches!(
            mesh.validate(),
            Err(Error::CornerVertexOutOfRange { vertex: 9, vertex_count: 3, .. })
        ));
    }

    #[test]
    fn test_missing_uv_channel() {
        let mut mesh = triangle();
        mesh.faces[0].corners[1].uvs.clear();
        assert!(matches!(
            mesh.validate(),
            Err(Error::InconsistentChannels { kind: "UV", expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn test_conform_uv_channels() {
        let mut mesh = triangle();
        mesh.conform_uv_channels(3);
        assert_eq!(mesh.uv_channel_count, 3);
        assert!(mesh.faces[0].corners.iter().all(|c| c.uvs.len() == 3));
        assert!(mesh.validate().is_ok());

        mesh.conform_uv_channels(0);
        assert!(mesh.faces[0].corners.iter().all(|c| c.uvs.is_empty()));
    }

    #[test]
    fn test_default_name() {
        let mesh = MeshSnapshot::new("", 0, 0);
        assert_eq!(mesh.display_name(), DEFAULT_MESH_NAME);
    }
}
