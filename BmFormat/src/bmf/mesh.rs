//! Mesh data as stored in a mesh block

use glam::{Vec2, Vec3};
use indexmap::IndexMap;

use super::{AttrMap, BaseType, IndexType, MAX_VERTEX_ATTRIBS, MESH_NAME_SIZE, VertexAttr};
use crate::encoder::BinaryEncoder;
use crate::error::{Error, Result};

/// A final, deduplicated vertex.
///
/// Every vertex of a mesh carries the same number of UV and color channels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BmVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec3>,
}

impl BmVertex {
    /// A vertex with zeroed UV and color channels.
    pub fn new(position: Vec3, normal: Vec3, uv_channels: usize, color_channels: usize) -> Self {
        Self {
            position,
            normal,
            uvs: vec![Vec2::ZERO; uv_channels],
            colors: vec![Vec3::ZERO; color_channels],
        }
    }
}

/// A material-grouped triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BmSubMesh {
    /// Material slot the triangles were assigned to in the source mesh.
    pub material_index: u32,
    /// Material name, tracked but not serialized.
    pub material_name: String,
    /// Material id written to the submesh header (always 0 for now).
    pub material_id: u16,
    /// Triangle list; always a multiple of 3.
    pub indices: Vec<u32>,
}

impl BmSubMesh {
    pub fn new(material_index: u32) -> Self {
        Self {
            material_index,
            ..Self::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn write_header(&self, stream: &mut BinaryEncoder, index_offset: u32) -> Result<()> {
        stream.write_u32(index_offset);
        stream.write_u32(checked_u32("submesh index", self.indices.len())?);
        stream.write_u16(self.material_id);
        Ok(())
    }
}

/// A mesh ready to be written into a mesh block.
#[derive(Debug, Clone, PartialEq)]
pub struct BmMesh {
    /// Sanitized name; written into a 64-byte field.
    pub name: String,
    pub vertices: Vec<BmVertex>,
    /// Vertex data stored per vertex rather than as one stream per attribute.
    pub interleaved: bool,
    pub index_type: IndexType,
    /// Submeshes keyed by material index, in first-seen order.
    pub submeshes: IndexMap<u32, BmSubMesh>,
    /// Populated attribute descriptors, in the order the vertex data is laid out.
    pub attributes: Vec<VertexAttr>,
}

impl BmMesh {
    pub fn index_count(&self) -> usize {
        self.submeshes.values().map(|s| s.indices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    pub fn uv_channel_count(&self) -> usize {
        self.vertices.first().map_or(0, |v| v.uvs.len())
    }

    /// Bytes one vertex occupies in the vertex data region.
    pub fn vertex_stride(&self) -> usize {
        self.attributes.iter().map(VertexAttr::byte_size).sum()
    }

    /// Append this mesh (header, submesh headers, vertex data, index data).
    pub fn write(&self, stream: &mut BinaryEncoder) -> Result<()> {
        self.write_header(stream)?;

        let mut index_offset = 0u32;
        for submesh in self.submeshes.values() {
            submesh.write_header(stream, index_offset)?;
            index_offset += checked_u32("submesh index", submesh.indices.len())?;
        }

        if self.interleaved {
            for vertex in &self.vertices {
                for attr in &self.attributes {
                    write_attribute(stream, vertex, attr)?;
                }
            }
        } else {
            for attr in &self.attributes {
                for vertex in &self.vertices {
                    write_attribute(stream, vertex, attr)?;
                }
            }
        }

        for submesh in self.submeshes.values() {
            self.write_indices(stream, submesh)?;
        }

        tracing::debug!(
            "Wrote mesh '{}': {} vertices, {} indices, {} submeshes",
            self.name,
            self.vertices.len(),
            index_offset,
            self.submeshes.len()
        );

        Ok(())
    }

    fn write_header(&self, stream: &mut BinaryEncoder) -> Result<()> {
        if self.attributes.len() > MAX_VERTEX_ATTRIBS {
            return Err(Error::TooManyAttributes {
                count: self.attributes.len(),
                max: MAX_VERTEX_ATTRIBS,
            });
        }

        stream.write_string(&self.name, Some(MESH_NAME_SIZE));
        stream.write_u32(checked_u32("vertex", self.vertices.len())?);
        stream.write_bool(self.interleaved);
        stream.write_u32(checked_u32("index", self.index_count())?);
        stream.write_u8(self.index_type.tag());
        stream.write_u16(checked_u16("vertex attribute", self.attributes.len())?);

        // Fixed table: unpopulated slots carry the unknown sentinel.
        for slot in 0..MAX_VERTEX_ATTRIBS {
            self.attributes
                .get(slot)
                .unwrap_or(&VertexAttr::UNKNOWN)
                .write(stream);
        }

        stream.write_u16(checked_u16("submesh", self.submeshes.len())?);
        Ok(())
    }

    fn write_indices(&self, stream: &mut BinaryEncoder, submesh: &BmSubMesh) -> Result<()> {
        let vertex_limit = self.vertices.len().saturating_sub(1) as u32;
        let limit = vertex_limit.min(self.index_type.max_index());

        for &index in &submesh.indices {
            if index > limit || self.vertices.is_empty() {
                return Err(Error::IndexOutOfRange {
                    mesh: self.name.clone(),
                    index,
                    limit,
                });
            }
            match self.index_type {
                IndexType::UInt8 => stream.write_u8(index as u8),
                IndexType::UInt16 => stream.write_u16(index as u16),
                IndexType::UInt32 => stream.write_u32(index),
            }
        }
        Ok(())
    }
}

fn write_attribute(stream: &mut BinaryEncoder, vertex: &BmVertex, attr: &VertexAttr) -> Result<()> {
    let unsupported = || Error::UnsupportedAttribute { attr: *attr };

    if attr.base_type != BaseType::Float {
        return Err(unsupported());
    }

    match (attr.attr_map, attr.components) {
        (AttrMap::Position, 3) => stream.write(&vertex.position),
        (AttrMap::Normal, 3) => stream.write(&vertex.normal),
        (map, 2) if map.tex_coord_channel().is_some() => {
            let uv = map
                .tex_coord_channel()
                .and_then(|channel| vertex.uvs.get(channel))
                .ok_or_else(unsupported)?;
            stream.write(uv);
        }
        (map, 3) if map.color_channel().is_some() => {
            let color = map
                .color_channel()
                .and_then(|channel| vertex.colors.get(channel))
                .ok_or_else(unsupported)?;
            stream.write(color);
        }
        _ => return Err(unsupported()),
    }
    Ok(())
}

fn checked_u32(what: &'static str, count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| Error::CountOverflow { what, count })
}

pub(super) fn checked_u16(what: &'static str, count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| Error::CountOverflow { what, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmf::interleaved_layout;

    fn triangle_mesh(index_type: IndexType) -> BmMesh {
        let vertices = (0..3)
            .map(|i| {
                let mut v = BmVertex::new(Vec3::splat(i as f32), Vec3::Z, 1, 0);
                v.uvs[0] = Vec2::new(i as f32, 0.5);
                v
            })
            .collect();
        let mut submeshes = IndexMap::new();
        submeshes.insert(
            0,
            BmSubMesh {
                indices: vec![0, 1, 2],
                ..BmSubMesh::new(0)
            },
        );
        BmMesh {
            name: "Tri".to_string(),
            vertices,
            interleaved: true,
            index_type,
            submeshes,
            attributes: interleaved_layout(1).unwrap(),
        }
    }

    #[test]
    fn test_mesh_byte_size() {
        let mesh = triangle_mesh(IndexType::UInt16);
        let mut enc = BinaryEncoder::new();
        mesh.write(&mut enc).unwrap();

        let header = 64 + 4 + 1 + 4 + 1 + 2 + 96 + 2;
        let submeshes = 10;
        let vertices = 3 * mesh.vertex_stride();
        let indices = 3 * 2;
        assert_eq!(mesh.vertex_stride(), 32);
        assert_eq!(enc.len(), header + submeshes + vertices + indices);
    }

    #[test]
    fn test_unused_attribute_slots_are_unknown() {
        let mesh = triangle_mesh(IndexType::UInt16);
        let mut enc = BinaryEncoder::new();
        mesh.write(&mut enc).unwrap();

        let table_start = 64 + 4 + 1 + 4 + 1 + 2;
        let table = &enc.as_bytes()[table_start..table_start + 96];
        assert_eq!(&table[..3], &[9, 3, AttrMap::Position as u8]);
        assert!(table[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_index_exceeding_width_is_rejected() {
        let mut mesh = triangle_mesh(IndexType::UInt8);
        mesh.vertices
            .resize(300, BmVertex::new(Vec3::ZERO, Vec3::Z, 1, 0));
        mesh.submeshes.get_mut(&0).unwrap().indices = vec![0, 1, 299];

        let mut enc = BinaryEncoder::new();
        let err = mesh.write(&mut enc).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 299, limit: 255, .. }));
    }

    #[test]
    fn test_index_past_vertex_list_is_rejected() {
        let mut mesh = triangle_mesh(IndexType::UInt32);
        mesh.submeshes.get_mut(&0).unwrap().indices = vec![0, 1, 3];
        let mut enc = BinaryEncoder::new();
        assert!(mesh.write(&mut enc).is_err());
    }

    #[test]
    fn test_planar_layout_groups_streams() {
        let mut mesh = triangle_mesh(IndexType::UInt16);
        mesh.interleaved = false;
        let mut enc = BinaryEncoder::new();
        mesh.write(&mut enc).unwrap();

        let data_start = 64 + 4 + 1 + 4 + 1 + 2 + 96 + 2 + 10;
        let bytes = enc.as_bytes();
        // Second vertex position follows the first directly.
        let second = f32::from_le_bytes(bytes[data_start + 12..data_start + 16].try_into().unwrap());
        assert_eq!(second, 1.0);
    }

    #[test]
    fn test_tangent_descriptor_is_unsupported() {
        let mut mesh = triangle_mesh(IndexType::UInt16);
        mesh.attributes
            .push(VertexAttr::new(BaseType::Float, 4, AttrMap::Tangent));
        let mut enc = BinaryEncoder::new();
        assert!(matches!(
            mesh.write(&mut enc),
            Err(Error::UnsupportedAttribute { .. })
        ));
    }
}
