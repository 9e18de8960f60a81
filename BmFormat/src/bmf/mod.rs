//! Basic Model Format (.bmf)
//!
//! A small block-framed container for static meshes. A file is a fixed
//! header followed by any number of blocks:
//!
//! ```text
//! u32 magic ("BMDL")  u16 version_major  u16 version_minor
//! { u16 block_type  u32 payload_length  payload[payload_length] }*
//! ```
//!
//! Readers skip block types they do not understand by their length, so new
//! block kinds can be added without breaking older readers. Only mesh data
//! blocks are produced today.

mod mesh;
mod reader;
mod writer;

pub use mesh::{BmMesh, BmSubMesh, BmVertex};
pub use reader::{BlockInfo, BmFile, BmfInfo, MeshInfo, parse_bmf_bytes, read_bmf};
pub use writer::{BmFileWriter, write_block, write_mesh_block};

use serde::Serialize;

use crate::encoder::BinaryEncoder;
use crate::error::{Error, Result};

/// "BMDL" magic signature (little-endian)
pub const BM_FILE_ID: u32 = 0x4C44_4D42;

pub const BM_VERSION_MAJOR: u16 = 0;
pub const BM_VERSION_MINOR: u16 = 1;

/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 8;

/// Size of a block header (type + payload length)
pub const BLOCK_HEADER_SIZE: usize = 6;

/// Fixed size of the mesh name field
pub const MESH_NAME_SIZE: usize = 64;

/// Number of attribute descriptor slots in every mesh header
pub const MAX_VERTEX_ATTRIBS: usize = 32;

/// Number of texture coordinate semantics (`TexCoord1`..`TexCoord4`)
pub const MAX_UV_CHANNELS: usize = 4;

/// Block type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum BlockType {
    MeshData = 0,
    MaterialData = 8,
    SceneData = 16,
    ExtensionData = 24,
    AnimationData = 32,
}

impl BlockType {
    pub fn tag(self) -> u16 {
        self as u16
    }

    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::MeshData),
            8 => Some(Self::MaterialData),
            16 => Some(Self::SceneData),
            24 => Some(Self::ExtensionData),
            32 => Some(Self::AnimationData),
            _ => None,
        }
    }
}

/// Width of the elements in a mesh index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum IndexType {
    UInt8 = 0,
    UInt16 = 1,
    UInt32 = 2,
}

impl IndexType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::UInt8),
            1 => Ok(Self::UInt16),
            2 => Ok(Self::UInt32),
            _ => Err(Error::InvalidIndexType(tag)),
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
        }
    }

    /// Largest index value representable at this width.
    pub fn max_index(self) -> u32 {
        match self {
            Self::UInt8 => u32::from(u8::MAX),
            Self::UInt16 => u32::from(u16::MAX),
            Self::UInt32 => u32::MAX,
        }
    }
}

/// Numeric type of one attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum BaseType {
    Unknown = 0,
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,
    Float = 9,
    Double = 10,
}

impl BaseType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => Self::Unknown,
            1 => Self::Int8,
            2 => Self::UInt8,
            3 => Self::Int16,
            4 => Self::UInt16,
            5 => Self::Int32,
            6 => Self::UInt32,
            7 => Self::Int64,
            8 => Self::UInt64,
            9 => Self::Float,
            10 => Self::Double,
            _ => return Err(Error::InvalidBaseType(tag)),
        })
    }

    pub fn byte_size(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float => 4,
            Self::Int64 | Self::UInt64 | Self::Double => 8,
        }
    }
}

/// Semantic of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum AttrMap {
    Unknown = 0,
    Position = 1,
    Normal = 2,
    Tangent = 3,
    BiTangent = 4,

    Color1 = 8,
    Color2 = 9,
    Color3 = 10,
    Color4 = 11,

    Color32_1 = 16,
    Color32_2 = 17,
    Color32_3 = 18,
    Color32_4 = 19,

    TexCoord1 = 24,
    TexCoord2 = 25,
    TexCoord3 = 26,
    TexCoord4 = 27,
}

impl AttrMap {
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => Self::Unknown,
            1 => Self::Position,
            2 => Self::Normal,
            3 => Self::Tangent,
            4 => Self::BiTangent,
            8 => Self::Color1,
            9 => Self::Color2,
            10 => Self::Color3,
            11 => Self::Color4,
            16 => Self::Color32_1,
            17 => Self::Color32_2,
            18 => Self::Color32_3,
            19 => Self::Color32_4,
            24 => Self::TexCoord1,
            25 => Self::TexCoord2,
            26 => Self::TexCoord3,
            27 => Self::TexCoord4,
            _ => return Err(Error::InvalidAttrMap(tag)),
        })
    }

    /// Texture coordinate semantic for a zero-based UV channel.
    pub fn tex_coord(channel: usize) -> Option<Self> {
        match channel {
            0 => Some(Self::TexCoord1),
            1 => Some(Self::TexCoord2),
            2 => Some(Self::TexCoord3),
            3 => Some(Self::TexCoord4),
            _ => None,
        }
    }

    /// Zero-based UV channel for a texture coordinate semantic.
    pub fn tex_coord_channel(self) -> Option<usize> {
        match self {
            Self::TexCoord1 => Some(0),
            Self::TexCoord2 => Some(1),
            Self::TexCoord3 => Some(2),
            Self::TexCoord4 => Some(3),
            _ => None,
        }
    }

    /// Zero-based color channel for a float color semantic.
    pub fn color_channel(self) -> Option<usize> {
        match self {
            Self::Color1 => Some(0),
            Self::Color2 => Some(1),
            Self::Color3 => Some(2),
            Self::Color4 => Some(3),
            _ => None,
        }
    }
}

/// One slot of the vertex attribute descriptor table (3 bytes on disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VertexAttr {
    pub base_type: BaseType,
    pub components: u8,
    pub attr_map: AttrMap,
}

impl VertexAttr {
    /// Sentinel written into unpopulated descriptor slots.
    pub const UNKNOWN: Self = Self {
        base_type: BaseType::Unknown,
        components: 0,
        attr_map: AttrMap::Unknown,
    };

    pub const fn new(base_type: BaseType, components: u8, attr_map: AttrMap) -> Self {
        Self {
            base_type,
            components,
            attr_map,
        }
    }

    /// Bytes one vertex spends on this attribute.
    pub fn byte_size(&self) -> usize {
        self.base_type.byte_size() * self.components as usize
    }

    pub fn write(&self, stream: &mut BinaryEncoder) {
        stream.write_u8(self.base_type as u8);
        stream.write_u8(self.components);
        stream.write_u8(self.attr_map as u8);
    }
}

impl Default for VertexAttr {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Fixed file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub file_id: u32,
    pub version_major: u16,
    pub version_minor: u16,
}

impl FileHeader {
    pub fn write(&self, stream: &mut BinaryEncoder) {
        stream.write_u32(self.file_id);
        stream.write_u16(self.version_major);
        stream.write_u16(self.version_minor);
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            file_id: BM_FILE_ID,
            version_major: BM_VERSION_MAJOR,
            version_minor: BM_VERSION_MINOR,
        }
    }
}

/// Descriptors for the interleaved layout the writer emits:
/// position, normal, then one texture coordinate pair per UV channel.
pub fn interleaved_layout(uv_channels: usize) -> Result<Vec<VertexAttr>> {
    if uv_channels > MAX_UV_CHANNELS {
        return Err(Error::TooManyUvChannels {
            count: uv_channels,
            max: MAX_UV_CHANNELS,
        });
    }

    let mut attributes = vec![
        VertexAttr::new(BaseType::Float, 3, AttrMap::Position),
        VertexAttr::new(BaseType::Float, 3, AttrMap::Normal),
    ];
    attributes.extend(
        (0..uv_channels)
            .filter_map(AttrMap::tex_coord)
            .map(|map| VertexAttr::new(BaseType::Float, 2, map)),
    );
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_spells_bmdl() {
        assert_eq!(BM_FILE_ID, 1279544642);
        assert_eq!(&BM_FILE_ID.to_le_bytes(), b"BMDL");
    }

    #[test]
    fn test_header_layout() {
        let mut enc = BinaryEncoder::new();
        FileHeader::default().write(&mut enc);
        assert_eq!(enc.len(), HEADER_SIZE);
        assert_eq!(&enc.as_bytes()[..4], b"BMDL");
    }

    #[test]
    fn test_interleaved_layout() {
        let layout = interleaved_layout(2).unwrap();
        assert_eq!(layout.len(), 4);
        assert_eq!(layout[2].attr_map, AttrMap::TexCoord1);
        assert_eq!(layout[3].attr_map, AttrMap::TexCoord2);
        assert_eq!(layout.iter().map(VertexAttr::byte_size).sum::<usize>(), 40);

        assert!(matches!(
            interleaved_layout(5),
            Err(Error::TooManyUvChannels { count: 5, .. })
        ));
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in [0u8, 1, 2] {
            assert_eq!(IndexType::from_tag(tag).unwrap().tag(), tag);
        }
        assert!(IndexType::from_tag(3).is_err());
        assert_eq!(BlockType::from_tag(24), Some(BlockType::ExtensionData));
        assert_eq!(BlockType::from_tag(5), None);
        assert_eq!(AttrMap::from_tag(26).unwrap().tex_coord_channel(), Some(2));
    }
}
