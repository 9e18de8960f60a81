//! `.bmf` file reading and parsing
//!
//! The reader mirrors the writer field for field. Vertex layout is taken
//! from the attribute descriptor table, so any Float/integer attribute
//! combination a writer declares can be decoded.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Vec2, Vec3};
use indexmap::IndexMap;
use serde::Serialize;

use super::{
    AttrMap, BLOCK_HEADER_SIZE, BM_FILE_ID, BM_VERSION_MAJOR, BaseType, BlockType, BmMesh,
    BmSubMesh, BmVertex, FileHeader, HEADER_SIZE, IndexType, MAX_VERTEX_ATTRIBS, MESH_NAME_SIZE,
    VertexAttr,
};
use crate::error::{Error, Result};

/// A decoded BMF file.
#[derive(Debug, Clone)]
pub struct BmFile {
    pub header: FileHeader,
    /// Every block in file order, including ones this reader skipped.
    pub blocks: Vec<BlockInfo>,
    /// Meshes from all mesh data blocks, in file order.
    pub meshes: Vec<BmMesh>,
}

/// Location and type of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub block_type: u16,
    /// `None` for block types this reader does not know.
    pub kind: Option<BlockType>,
    /// Byte offset of the payload within the file.
    pub offset: usize,
    pub length: u32,
}

/// Serializable summary of a file, for inspection output.
#[derive(Debug, Clone, Serialize)]
pub struct BmfInfo {
    pub version: String,
    pub blocks: Vec<BlockInfo>,
    pub meshes: Vec<MeshInfo>,
}

/// Serializable summary of one mesh.
#[derive(Debug, Clone, Serialize)]
pub struct MeshInfo {
    pub name: String,
    pub vertex_count: usize,
    pub index_count: usize,
    pub triangle_count: usize,
    pub index_type: IndexType,
    pub interleaved: bool,
    pub uv_channels: usize,
    pub attributes: Vec<VertexAttr>,
    /// Index count of each submesh, in file order.
    pub submesh_index_counts: Vec<usize>,
}

impl BmFile {
    pub fn info(&self) -> BmfInfo {
        BmfInfo {
            version: format!("{}.{}", self.header.version_major, self.header.version_minor),
            blocks: self.blocks.clone(),
            meshes: self
                .meshes
                .iter()
                .map(|mesh| MeshInfo {
                    name: mesh.name.clone(),
                    vertex_count: mesh.vertices.len(),
                    index_count: mesh.index_count(),
                    triangle_count: mesh.triangle_count(),
                    index_type: mesh.index_type,
                    interleaved: mesh.interleaved,
                    uv_channels: mesh.uv_channel_count(),
                    attributes: mesh.attributes.clone(),
                    submesh_index_counts: mesh.submeshes.values().map(|s| s.indices.len()).collect(),
                })
                .collect(),
        }
    }
}

/// Read a .bmf file from disk
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, or any error from
/// [`parse_bmf_bytes`].
pub fn read_bmf<P: AsRef<Path>>(path: P) -> Result<BmFile> {
    let data = fs::read(path)?;
    parse_bmf_bytes(&data)
}

/// Parse .bmf data from bytes
///
/// # Errors
///
/// Returns [`Error::InvalidMagic`] if the data does not start with the BMF
/// magic, [`Error::UnsupportedVersion`] for a newer major version, and
/// [`Error::TruncatedBlock`] / [`Error::UnexpectedEof`] for short data,
/// including counts that promise more data than the block holds.
pub fn parse_bmf_bytes(data: &[u8]) -> Result<BmFile> {
    let mut reader = ByteReader::new(data);

    let header = FileHeader {
        file_id: reader.u32()?,
        version_major: reader.u16()?,
        version_minor: reader.u16()?,
    };

    if header.file_id != BM_FILE_ID {
        return Err(Error::InvalidMagic {
            expected: BM_FILE_ID,
            found: header.file_id,
        });
    }
    if header.version_major > BM_VERSION_MAJOR {
        return Err(Error::UnsupportedVersion {
            major: header.version_major,
            minor: header.version_minor,
        });
    }

    tracing::debug!(
        "Read BMF header version {}.{}",
        header.version_major,
        header.version_minor
    );

    let mut blocks = Vec::new();
    let mut meshes = Vec::new();
    let mut pos = HEADER_SIZE;

    while data.len() - pos >= BLOCK_HEADER_SIZE {
        let mut block_header = ByteReader::new(&data[pos..pos + BLOCK_HEADER_SIZE]);
        let block_type = block_header.u16()?;
        let length = block_header.u32()?;
        pos += BLOCK_HEADER_SIZE;

        let available = data.len() - pos;
        if length as usize > available {
            return Err(Error::TruncatedBlock {
                block_type,
                declared: length,
                available,
            });
        }

        let payload = &data[pos..pos + length as usize];
        let kind = BlockType::from_tag(block_type);

        match kind {
            Some(BlockType::MeshData) => meshes.extend(parse_mesh_block(payload)?),
            _ => tracing::debug!("Skipping block type {} ({} bytes)", block_type, length),
        }

        blocks.push(BlockInfo {
            block_type,
            kind,
            offset: pos,
            length,
        });
        pos += length as usize;
    }

    Ok(BmFile {
        header,
        blocks,
        meshes,
    })
}

fn parse_mesh_block(payload: &[u8]) -> Result<Vec<BmMesh>> {
    let mut reader = ByteReader::new(payload);
    let mesh_count = reader.u16()?;
    reader.expect_records(mesh_count as usize, MESH_HEADER_SIZE)?;

    let mut meshes = Vec::with_capacity(mesh_count as usize);
    for _ in 0..mesh_count {
        meshes.push(parse_mesh(&mut reader)?);
    }

    tracing::debug!("Found {} meshes in mesh block", meshes.len());
    Ok(meshes)
}

/// Fixed part of a mesh record: name, counts, index type and descriptor table.
const MESH_HEADER_SIZE: usize = MESH_NAME_SIZE + 4 + 1 + 4 + 1 + 2 + MAX_VERTEX_ATTRIBS * 3 + 2;

/// Submesh header: index offset, index count and material id.
const SUBMESH_HEADER_SIZE: usize = 4 + 4 + 2;

struct SubMeshHeader {
    index_offset: u32,
    index_count: u32,
    material_id: u16,
}

fn parse_mesh(reader: &mut ByteReader<'_>) -> Result<BmMesh> {
    let name_bytes = reader.bytes(MESH_NAME_SIZE)?;
    let name_len = name_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(MESH_NAME_SIZE);
    let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

    let vertex_count = reader.u32()? as usize;
    let interleaved = reader.u8()? != 0;
    let index_count = reader.u32()? as usize;
    let index_type = IndexType::from_tag(reader.u8()?)?;

    let attr_count = reader.u16()? as usize;
    if attr_count > MAX_VERTEX_ATTRIBS {
        return Err(Error::TooManyAttributes {
            count: attr_count,
            max: MAX_VERTEX_ATTRIBS,
        });
    }
    let mut attributes = Vec::with_capacity(attr_count);
    for slot in 0..MAX_VERTEX_ATTRIBS {
        let attr = VertexAttr {
            base_type: BaseType::from_tag(reader.u8()?)?,
            components: reader.u8()?,
            attr_map: AttrMap::from_tag(reader.u8()?)?,
        };
        if slot < attr_count {
            attributes.push(attr);
        }
    }

    let submesh_count = reader.u16()?;
    reader.expect_records(submesh_count as usize, SUBMESH_HEADER_SIZE)?;
    let mut headers = Vec::with_capacity(submesh_count as usize);
    for _ in 0..submesh_count {
        headers.push(SubMeshHeader {
            index_offset: reader.u32()?,
            index_count: reader.u32()?,
            material_id: reader.u16()?,
        });
    }

    let uv_channels = attributes
        .iter()
        .filter_map(|a| a.attr_map.tex_coord_channel())
        .map(|c| c + 1)
        .max()
        .unwrap_or(0);
    let color_channels = attributes
        .iter()
        .filter_map(|a| a.attr_map.color_channel())
        .map(|c| c + 1)
        .max()
        .unwrap_or(0);

    // Counts come straight from the file; check them before allocating
    let stride: usize = attributes.iter().map(VertexAttr::byte_size).sum();
    if stride == 0 && vertex_count > 0 {
        return Err(Error::EmptyVertexLayout { vertex_count });
    }
    reader.expect_records(vertex_count, stride)?;
    reader.expect_records(index_count, index_type.byte_size())?;

    let mut vertices =
        vec![BmVertex::new(Vec3::ZERO, Vec3::ZERO, uv_channels, color_channels); vertex_count];
    if interleaved {
        for vertex in &mut vertices {
            for attr in &attributes {
                read_attribute(reader, attr, vertex)?;
            }
        }
    } else {
        for attr in &attributes {
            for vertex in &mut vertices {
                read_attribute(reader, attr, vertex)?;
            }
        }
    }

    let mut indices = Vec::with_capacity(index_count);
    for _ in 0..index_count {
        indices.push(match index_type {
            IndexType::UInt8 => u32::from(reader.u8()?),
            IndexType::UInt16 => u32::from(reader.u16()?),
            IndexType::UInt32 => reader.u32()?,
        });
    }

    let mut submeshes = IndexMap::with_capacity(headers.len());
    for (ordinal, header) in headers.iter().enumerate() {
        let start = header.index_offset as usize;
        let end = start + header.index_count as usize;
        let range = indices.get(start..end).ok_or(Error::SubmeshRangeInvalid {
            offset: header.index_offset,
            count: header.index_count,
            total: index_count as u32,
        })?;

        // Material indices are not stored; submeshes are keyed by position.
        let key = ordinal as u32;
        submeshes.insert(
            key,
            BmSubMesh {
                material_index: key,
                material_name: String::new(),
                material_id: header.material_id,
                indices: range.to_vec(),
            },
        );
    }

    tracing::debug!(
        "Read mesh '{}' with {} vertices, {} submeshes",
        name,
        vertex_count,
        submeshes.len()
    );

    Ok(BmMesh {
        name,
        vertices,
        interleaved,
        index_type,
        submeshes,
        attributes,
    })
}

fn read_attribute(reader: &mut ByteReader<'_>, attr: &VertexAttr, vertex: &mut BmVertex) -> Result<()> {
    let mut values = [0.0f32; 4];
    for i in 0..attr.components as usize {
        let value = reader.component(attr.base_type)?;
        if let Some(slot) = values.get_mut(i) {
            *slot = value;
        }
    }

    let vec3 = Vec3::new(values[0], values[1], values[2]);
    match attr.attr_map {
        AttrMap::Position => vertex.position = vec3,
        AttrMap::Normal => vertex.normal = vec3,
        map => {
            if let Some(uv) = map.tex_coord_channel().and_then(|c| vertex.uvs.get_mut(c)) {
                *uv = Vec2::new(values[0], values[1]);
            } else if let Some(color) = map.color_channel().and_then(|c| vertex.colors.get_mut(c)) {
                *color = vec3;
            }
        }
    }
    Ok(())
}

/// Little-endian cursor that reports running out of data as [`Error::UnexpectedEof`].
struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| Error::UnexpectedEof)
    }

    fn u16(&mut self) -> Result<u16> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| Error::UnexpectedEof)
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::UnexpectedEof)
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    /// Fail with [`Error::UnexpectedEof`] unless `count` records of
    /// `record_size` bytes are still available.
    fn expect_records(&self, count: usize, record_size: usize) -> Result<()> {
        match count.checked_mul(record_size) {
            Some(needed) if needed <= self.remaining() => Ok(()),
            _ => Err(Error::UnexpectedEof),
        }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let slice = data.get(start..start + len).ok_or(Error::UnexpectedEof)?;
        self.cursor.set_position((start + len) as u64);
        Ok(slice)
    }

    /// Read one attribute component and widen it to `f32`.
    fn component(&mut self, base_type: BaseType) -> Result<f32> {
        let c = &mut self.cursor;
        let value = match base_type {
            BaseType::Unknown => 0.0,
            BaseType::Int8 => f32::from(c.read_i8().map_err(|_| Error::UnexpectedEof)?),
            BaseType::UInt8 => f32::from(c.read_u8().map_err(|_| Error::UnexpectedEof)?),
            BaseType::Int16 => f32::from(c.read_i16::<LittleEndian>().map_err(|_| Error::UnexpectedEof)?),
            BaseType::UInt16 => f32::from(c.read_u16::<LittleEndian>().map_err(|_| Error::UnexpectedEof)?),
            BaseType::Int32 => c.read_i32::<LittleEndian>().map_err(|_| Error::UnexpectedEof)? as f32,
            BaseType::UInt32 => c.read_u32::<LittleEndian>().map_err(|_| Error::UnexpectedEof)? as f32,
            BaseType::Int64 => c.read_i64::<LittleEndian>().map_err(|_| Error::UnexpectedEof)? as f32,
            BaseType::UInt64 => c.read_u64::<LittleEndian>().map_err(|_| Error::UnexpectedEof)? as f32,
            BaseType::Float => c.read_f32::<LittleEndian>().map_err(|_| Error::UnexpectedEof)?,
            BaseType::Double => c.read_f64::<LittleEndian>().map_err(|_| Error::UnexpectedEof)? as f32,
        };
        Ok(value)
    }
}
