//! Export pipeline
//!
//! Turns host scene objects into a BMF file:
//!
//! 1. Objects are filtered by visibility and, with `export_selected`, by selection.
//! 2. Each object is materialized into a [`MeshSnapshot`]. Objects that fail
//!    here are skipped and listed in the [`ExportReport`].
//! 3. Every snapshot goes through [`build_mesh`]: attribute deduplication,
//!    vertex splitting, triangulation into submeshes, index width selection
//!    and name sanitizing.
//! 4. The meshes are written into one mesh block and the file is assembled
//!    in memory. Nothing touches the disk until every mesh has succeeded.
//!
//! All per-run state lives in an [`ExportContext`] that is dropped when the
//! export returns.

mod dedup;
mod index_type;
mod mesh_builder;
mod submesh;
mod vertex_buffer;

use std::fs;
use std::path::Path;

use bmformat::bmf::{BmFileWriter, IndexType};
use glam::Mat4;
use serde::Serialize;

use crate::error::{MaterializeError, Result};
use crate::names::NameSanitizer;
use crate::options::ExportOptions;
use crate::snapshot::MeshSnapshot;

pub use dedup::{AttributeKey, CornerRef, Permutation, VertexPermutations, deduplicate};
pub use index_type::select_index_type;
pub use mesh_builder::build_mesh;
pub use submesh::group_submeshes;
pub use vertex_buffer::{VertexRemap, build_vertices, rewrite_corners};

/// What a mesh source is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterializeRequest {
    /// Applied to positions; normals use its inverse transpose.
    pub transform: Mat4,
    /// UV channels to collect per corner. The pipeline conforms whatever
    /// the source returns to this count.
    pub uv_channel_count: usize,
    /// Most color channels to collect per corner.
    pub color_channel_count: usize,
}

impl MaterializeRequest {
    pub fn from_options(options: &ExportOptions) -> Self {
        Self {
            transform: options.transform(),
            uv_channel_count: options.uv_channel_count,
            color_channel_count: options.color_channel_count,
        }
    }
}

/// A scene object that can be exported.
pub trait MeshSource {
    fn name(&self) -> &str;

    fn is_visible(&self) -> bool {
        true
    }

    fn is_selected(&self) -> bool {
        false
    }

    /// Evaluate the object into a finalized, transformed mesh.
    fn materialize(&self, request: &MaterializeRequest) -> std::result::Result<MeshSnapshot, MaterializeError>;
}

impl<T: MeshSource + ?Sized> MeshSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_visible(&self) -> bool {
        (**self).is_visible()
    }

    fn is_selected(&self) -> bool {
        (**self).is_selected()
    }

    fn materialize(&self, request: &MaterializeRequest) -> std::result::Result<MeshSnapshot, MaterializeError> {
        (**self).materialize(request)
    }
}

/// State scoped to one export run.
#[derive(Debug)]
pub struct ExportContext<'a> {
    pub options: &'a ExportOptions,
    pub names: NameSanitizer,
    pub report: ExportReport,
}

impl<'a> ExportContext<'a> {
    pub fn new(options: &'a ExportOptions) -> Self {
        Self {
            options,
            names: NameSanitizer::new(),
            report: ExportReport::default(),
        }
    }

    /// Whether `source` passes the visibility and selection filter.
    pub fn accepts<S: MeshSource + ?Sized>(&self, source: &S) -> bool {
        source.is_visible() && (!self.options.export_selected || source.is_selected())
    }
}

/// Per-mesh outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshSummary {
    /// Object name as the source reported it.
    pub source_name: String,
    /// Sanitized name written to the file.
    pub name: String,
    pub source_vertex_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub submesh_count: usize,
    pub index_type: IndexType,
    pub uv_channels: usize,
    /// Color channels the mesh carried that the file format could not store.
    pub color_channels_omitted: usize,
}

/// An object that was left out of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedObject {
    pub name: String,
    pub reason: String,
}

/// Diagnostics for one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub meshes: Vec<MeshSummary>,
    /// Objects whose materialization failed.
    pub skipped: Vec<SkippedObject>,
    /// Objects rejected by the visibility or selection filter.
    pub filtered: usize,
    /// Size of the produced file in bytes.
    pub byte_size: usize,
}

impl ExportReport {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count).sum()
    }

    pub fn has_omitted_colors(&self) -> bool {
        self.meshes.iter().any(|m| m.color_channels_omitted > 0)
    }
}

/// Export `sources` into the bytes of a BMF file.
///
/// An empty selection is not an error; it produces a file whose mesh block
/// holds zero meshes.
///
/// # Errors
/// Returns an error if the options are invalid or any materialized mesh
/// fails the pipeline (unsupported face, index width overflow, ...).
pub fn export_to_bytes<S: MeshSource>(sources: &[S], options: &ExportOptions) -> Result<(Vec<u8>, ExportReport)> {
    options.validate()?;
    if options.merge_objects {
        tracing::debug!("merge_objects is not supported; meshes are written separately");
    }

    let mut context = ExportContext::new(options);
    let request = MaterializeRequest::from_options(options);
    let mut meshes = Vec::new();

    for source in sources {
        if !context.accepts(source) {
            context.report.filtered += 1;
            continue;
        }

        let snapshot = match source.materialize(&request) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("Skipping '{}': {}", source.name(), err);
                context.report.skipped.push(SkippedObject {
                    name: source.name().to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let (mesh, summary) = build_mesh(snapshot, &mut context)?;
        meshes.push(mesh);
        context.report.meshes.push(summary);
    }

    let mut writer = BmFileWriter::new();
    writer.add_mesh_block(&meshes)?;
    let bytes = writer.build()?;

    let mut report = context.report;
    report.byte_size = bytes.len();

    tracing::info!(
        "Exported {} meshes ({} triangles), skipped {}, {} bytes",
        report.meshes.len(),
        report.triangle_count(),
        report.skipped.len(),
        report.byte_size
    );

    Ok((bytes, report))
}

/// Export `sources` to a BMF file at `path`, replacing any existing file.
///
/// The file is only written once the whole export has succeeded.
///
/// # Errors
/// Returns an error if the export fails or the file cannot be written.
pub fn export_to_file<S: MeshSource, P: AsRef<Path>>(
    path: P,
    sources: &[S],
    options: &ExportOptions,
) -> Result<ExportReport> {
    let path = path.as_ref();
    let (bytes, report) = export_to_bytes(sources, options)?;
    fs::write(path, &bytes)?;
    tracing::info!("Wrote {}", path.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Corner;
    use glam::Vec3;
    use pretty_assertions::assert_eq;

    struct Fixture {
        name: &'static str,
        visible: bool,
        selected: bool,
        broken: bool,
    }

    impl Fixture {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                visible: true,
                selected: false,
                broken: false,
            }
        }
    }

    impl MeshSource for Fixture {
        fn name(&self) -> &str {
            self.name
        }

        fn is_visible(&self) -> bool {
            self.visible
        }

        fn is_selected(&self) -> bool {
            self.selected
        }

        fn materialize(&self, request: &MaterializeRequest) -> std::result::Result<MeshSnapshot, MaterializeError> {
            if self.broken {
                return Err(MaterializeError::NoMesh);
            }
            let mut mesh = MeshSnapshot::new(self.name, 0, 0);
            for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
                mesh.add_vertex(request.transform.transform_point3(p), Vec3::Z);
            }
            mesh.add_face(0, (0..3).map(|v| Corner::new(v, Vec3::Z)).collect());
            Ok(mesh)
        }
    }

    #[test]
    fn test_selection_filter() {
        let mut selected = Fixture::new("Picked");
        selected.selected = true;
        let mut hidden = Fixture::new("Hidden");
        hidden.visible = false;
        hidden.selected = true;
        let sources = vec![Fixture::new("Other"), selected, hidden];

        let options = ExportOptions {
            export_selected: true,
            ..ExportOptions::default()
        };
        let (_, report) = export_to_bytes(&sources, &options).unwrap();
        let names: Vec<&str> = report.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Picked"]);
        assert_eq!(report.filtered, 2);

        let (_, report) = export_to_bytes(&sources, &ExportOptions::default()).unwrap();
        assert_eq!(report.meshes.len(), 2);
        assert_eq!(report.filtered, 1);
    }

    #[test]
    fn test_materialize_failure_is_skipped() {
        let mut broken = Fixture::new("Broken");
        broken.broken = true;
        let sources = vec![broken, Fixture::new("Fine")];

        let (_, report) = export_to_bytes(&sources, &ExportOptions::default()).unwrap();
        assert_eq!(report.meshes.len(), 1);
        assert_eq!(
            report.skipped,
            vec![SkippedObject {
                name: "Broken".to_string(),
                reason: "object has no mesh data".to_string(),
            }]
        );
    }

    #[test]
    fn test_boxed_sources() {
        let sources: Vec<Box<dyn MeshSource>> = vec![Box::new(Fixture::new("A")), Box::new(Fixture::new("A"))];
        let (_, report) = export_to_bytes(&sources, &ExportOptions::default()).unwrap();
        assert_eq!(report.meshes[1].name, "A.000");
        assert_eq!(report.triangle_count(), 2);
    }

    #[test]
    fn test_names_do_not_leak_between_runs() {
        let sources = vec![Fixture::new("Cube")];
        let (first, _) = export_to_bytes(&sources, &ExportOptions::default()).unwrap();
        let (second, report) = export_to_bytes(&sources, &ExportOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(report.meshes[0].name, "Cube");
    }

    #[test]
    fn test_invalid_options_fail_early() {
        let options = ExportOptions {
            uv_channel_count: 5,
            ..ExportOptions::default()
        };
        assert!(export_to_bytes::<Fixture>(&[], &options).is_err());
    }
}
