//! Error types for `BasicModel`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for export operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    #[error("BMF error: {0}")]
    Format(#[from] bmformat::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Mesh Topology Errors ====================
    /// A face has a corner count other than 3 or 4.
    #[error("mesh '{mesh}': face {face} has {corners} corners (only triangles and quads are supported)")]
    UnsupportedFaceCorners {
        mesh: String,
        face: usize,
        corners: usize,
    },

    /// A face corner references a vertex that does not exist.
    #[error("mesh '{mesh}': face {face} references vertex {vertex} but the mesh has {vertex_count}")]
    CornerVertexOutOfRange {
        mesh: String,
        face: usize,
        vertex: u32,
        vertex_count: usize,
    },

    /// Corners of one mesh disagree on how many UV or color channels they carry.
    #[error("mesh '{mesh}': face {face} carries {found} {kind} channels, expected {expected}")]
    InconsistentChannels {
        mesh: String,
        face: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    // ==================== Index Width Errors ====================
    /// The requested index width cannot address every vertex.
    #[error("mesh '{mesh}' has {vertex_count} vertices, too many for {index_type:?} indices")]
    IndexWidthOverflow {
        mesh: String,
        vertex_count: usize,
        index_type: bmformat::bmf::IndexType,
    },

    // ==================== Configuration / Source Errors ====================
    #[error("invalid export options: {0}")]
    Config(String),

    #[error("failed to parse export options: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to load glTF {path}: {message}")]
    GltfLoad { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a mesh source could not produce a snapshot.
///
/// These never fail an export: the object is skipped and listed in the
/// [`ExportReport`](crate::export::ExportReport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    #[error("object has no mesh data")]
    NoMesh,

    #[error("primitive {primitive} uses unsupported mode {mode}")]
    UnsupportedPrimitive { primitive: usize, mode: String },

    #[error("primitive {primitive} has no vertex positions")]
    MissingPositions { primitive: usize },

    #[error("{0}")]
    Other(String),
}
