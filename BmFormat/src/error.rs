//! Error types for `BmFormat`

use thiserror::Error;

/// The error type for `BmFormat` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Header Errors ====================
    /// The file is not a BMF file (magic mismatch).
    #[error("invalid BMF magic: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic {
        /// The magic the reader expects.
        expected: u32,
        /// The magic found in the data.
        found: u32,
    },

    /// The file major version is newer than this reader understands.
    #[error("unsupported BMF version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version found in the file.
        major: u16,
        /// Minor version found in the file.
        minor: u16,
    },

    // ==================== Block Errors ====================
    /// A block declares more payload bytes than remain in the file.
    #[error("block of type {block_type} declares {declared} bytes but only {available} remain")]
    TruncatedBlock {
        /// The block type tag.
        block_type: u16,
        /// Payload length from the block header.
        declared: u32,
        /// Bytes actually left in the data.
        available: usize,
    },

    /// Unexpected end of data inside a block payload.
    #[error("unexpected end of data")]
    UnexpectedEof,

    // ==================== Mesh Errors ====================
    /// Unknown index width tag.
    #[error("invalid index type tag: {0}")]
    InvalidIndexType(u8),

    /// Unknown attribute base type tag.
    #[error("invalid attribute base type: {0}")]
    InvalidBaseType(u8),

    /// Unknown attribute semantic tag.
    #[error("invalid attribute mapping: {0}")]
    InvalidAttrMap(u8),

    /// An index does not fit the mesh's index width or points past the vertex list.
    #[error("index {index} out of range for mesh '{mesh}' (limit {limit})")]
    IndexOutOfRange {
        /// The mesh name.
        mesh: String,
        /// The offending index.
        index: u32,
        /// Largest value the index may take.
        limit: u32,
    },

    /// A submesh index range points outside the mesh index buffer.
    #[error("submesh range {offset}..{offset}+{count} exceeds index buffer of {total}")]
    SubmeshRangeInvalid {
        /// Index offset from the submesh header.
        offset: u32,
        /// Index count from the submesh header.
        count: u32,
        /// Total indices in the mesh.
        total: u32,
    },

    /// A descriptor names data the writer cannot produce from a [`BmVertex`].
    ///
    /// [`BmVertex`]: crate::bmf::BmVertex
    #[error("unsupported vertex attribute {attr:?}")]
    UnsupportedAttribute {
        /// The offending descriptor.
        attr: crate::bmf::VertexAttr,
    },

    /// A mesh declares vertices but no attribute that gives them any data.
    #[error("mesh declares {vertex_count} vertices but no vertex attributes")]
    EmptyVertexLayout {
        /// Vertex count from the mesh header.
        vertex_count: usize,
    },

    /// More vertex attributes than the fixed descriptor table holds.
    #[error("too many vertex attributes: {count} (max {max})")]
    TooManyAttributes {
        /// Number of attributes requested.
        count: usize,
        /// Size of the descriptor table.
        max: usize,
    },

    /// More UV channels than there are texture coordinate semantics.
    #[error("too many UV channels: {count} (max {max})")]
    TooManyUvChannels {
        /// Number of channels requested.
        count: usize,
        /// Number of texture coordinate semantics.
        max: usize,
    },

    /// A count does not fit its fixed-width field.
    #[error("{what} count {count} does not fit in the file field")]
    CountOverflow {
        /// What was being counted.
        what: &'static str,
        /// The actual count.
        count: usize,
    },
}

/// A specialized Result type for `BmFormat` operations.
pub type Result<T> = std::result::Result<T, Error>;
