//! # BasicModel
//!
//! Exports static meshes to the Basic Model Format (`.bmf`).
//!
//! Host scene objects implement [`MeshSource`](export::MeshSource) and hand
//! over finalized [`MeshSnapshot`](snapshot::MeshSnapshot)s. The pipeline
//! splits vertices along normal, UV and color seams, triangulates faces into
//! per-material submeshes, picks the index width and writes the file with
//! [`bmformat`].
//!
//! ## Quick Start
//!
//! ### Exporting a glTF scene
//!
//! ```no_run
//! use basicmodel::export::export_to_file;
//! use basicmodel::gltf_source::load_gltf;
//! use basicmodel::options::ExportOptions;
//!
//! let objects = load_gltf("scene.glb")?;
//! let report = export_to_file("scene.bmf", &objects, &ExportOptions::default())?;
//! println!("{} meshes, {} triangles", report.meshes.len(), report.triangle_count());
//! # Ok::<(), basicmodel::Error>(())
//! ```
//!
//! ### Exporting your own mesh data
//!
//! ```
//! use basicmodel::prelude::*;
//! use glam::Vec3;
//!
//! struct Triangle;
//!
//! impl MeshSource for Triangle {
//!     fn name(&self) -> &str {
//!         "Triangle"
//!     }
//!
//!     fn materialize(&self, request: &MaterializeRequest) -> std::result::Result<MeshSnapshot, MaterializeError> {
//!         let mut mesh = MeshSnapshot::new("Triangle", 0, 0);
//!         for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
//!             mesh.add_vertex(request.transform.transform_point3(p), Vec3::Z);
//!         }
//!         mesh.add_face(0, (0..3).map(|v| Corner::new(v, Vec3::Z)).collect());
//!         Ok(mesh)
//!     }
//! }
//!
//! let (bytes, report) = export_to_bytes(&[Triangle], &ExportOptions::default())?;
//! assert_eq!(report.triangle_count(), 1);
//! assert_eq!(&bytes[0..4], b"BMDL");
//! # Ok::<(), basicmodel::Error>(())
//! ```

pub mod error;
pub mod export;
pub mod gltf_source;
pub mod names;
pub mod options;
pub mod snapshot;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use error::{Error, MaterializeError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, MaterializeError, Result};
    pub use crate::export::{
        ExportReport, MaterializeRequest, MeshSource, MeshSummary, export_to_bytes, export_to_file,
    };
    pub use crate::names::NameSanitizer;
    pub use crate::options::{AxisPreset, ExportOptions, IndexTypeMode};
    pub use crate::snapshot::{Corner, MeshSnapshot, SnapshotFace, SnapshotVertex};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
