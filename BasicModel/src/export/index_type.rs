//! Index width selection

use bmformat::bmf::IndexType;

use crate::error::{Error, Result};
use crate::options::IndexTypeMode;

/// Pick the index width for a mesh with `vertex_count` final vertices.
///
/// `Auto` picks 16-bit indices up to 65 535 vertices and 32-bit beyond that.
/// An explicit width only has to hold the largest index (`vertex_count - 1`);
/// one that cannot address every vertex is an error rather than a silently
/// wrapped index buffer. 8-bit indices are never chosen.
pub fn select_index_type(mode: IndexTypeMode, vertex_count: usize, mesh: &str) -> Result<IndexType> {
    let index_type = match mode {
        IndexTypeMode::Auto if vertex_count <= IndexType::UInt16.max_index() as usize => IndexType::UInt16,
        IndexTypeMode::Auto | IndexTypeMode::UInt32 => IndexType::UInt32,
        IndexTypeMode::UInt16 => IndexType::UInt16,
    };

    if !addresses(index_type, vertex_count) {
        return Err(Error::IndexWidthOverflow {
            mesh: mesh.to_string(),
            vertex_count,
            index_type,
        });
    }

    Ok(index_type)
}

fn addresses(index_type: IndexType, vertex_count: usize) -> bool {
    vertex_count.saturating_sub(1) <= index_type.max_index() as usize
}
