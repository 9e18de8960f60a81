//! # BmFormat
//!
//! Reading and writing of the Basic Model Format (`.bmf`), a versioned,
//! block-framed binary container for static triangle meshes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bmformat::bmf::{BmFileWriter, read_bmf};
//!
//! // Write a file with an (empty) mesh block
//! let mut writer = BmFileWriter::new();
//! writer.add_mesh_block(&[])?;
//! writer.write("empty.bmf")?;
//!
//! // Read it back
//! let file = read_bmf("empty.bmf")?;
//! println!("{} meshes", file.meshes.len());
//! # Ok::<(), bmformat::Error>(())
//! ```

pub mod bmf;
pub mod encoder;
pub mod error;

// Re-exports for convenience
pub use encoder::{BinaryEncoder, Encodable};
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::bmf::{
        AttrMap, BaseType, BlockType, BmFile, BmFileWriter, BmMesh, BmSubMesh, BmVertex,
        FileHeader, IndexType, VertexAttr, parse_bmf_bytes, read_bmf,
    };
    pub use crate::encoder::{BinaryEncoder, Encodable};
    pub use crate::error::{Error, Result};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
