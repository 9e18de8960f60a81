//! glTF mesh source
//!
//! Loads glTF/GLB files and exposes every mesh-carrying node as a
//! [`MeshSource`]. Primitive data is copied out of the document at load time,
//! so a [`GltfObject`] owns everything it needs to materialize.
//!
//! glTF stores one vertex per unique attribute combination. Materializing
//! welds vertices with identical source positions back into shared vertices
//! and keeps the per-vertex attributes on the corners, so seams are split
//! again by the export pipeline exactly like mesh data from a DCC tool.

use std::collections::HashMap;
use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3};
use gltf::mesh::Mode;
use indexmap::IndexMap;

use crate::error::{Error, MaterializeError, Result};
use crate::export::{MaterializeRequest, MeshSource};
use crate::snapshot::{Corner, MeshSnapshot};

/// Color used for corners of primitives that lack a color set.
const DEFAULT_COLOR: Vec3 = Vec3::ONE;

// ============================================================================
// Data Structures
// ============================================================================

/// Attribute data of one primitive, copied out of the glTF buffers.
#[derive(Debug, Clone)]
struct PrimitiveData {
    mode: Mode,
    material: Option<usize>,
    material_name: String,
    positions: Option<Vec<Vec3>>,
    normals: Option<Vec<Vec3>>,
    uv_sets: Vec<Vec<Vec2>>,
    color_sets: Vec<Vec<Vec3>>,
    indices: Option<Vec<u32>>,
}

/// A glTF node with a mesh, positioned by its world transform.
#[derive(Debug, Clone)]
pub struct GltfObject {
    name: String,
    world: Mat4,
    selected: bool,
    primitives: Vec<PrimitiveData>,
}

impl GltfObject {
    pub fn world_transform(&self) -> Mat4 {
        self.world
    }
}

/// Mark the objects whose name is in `names` as selected.
pub fn select_by_name(objects: &mut [GltfObject], names: &[String]) {
    for object in objects {
        object.selected = names.iter().any(|n| n == &object.name);
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load every mesh node of a glTF or GLB file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<Vec<GltfObject>> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path).map_err(|e| Error::GltfLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let objects = load_document(&document, &buffers);
    tracing::info!("Loaded {} mesh objects from {}", objects.len(), path.display());
    Ok(objects)
}

/// Load every mesh node from in-memory glTF or GLB data.
///
/// # Errors
/// Returns an error if the data cannot be parsed.
pub fn load_gltf_slice(data: &[u8]) -> Result<Vec<GltfObject>> {
    let (document, buffers, _images) = gltf::import_slice(data).map_err(|e| Error::GltfLoad {
        path: "<memory>".into(),
        message: e.to_string(),
    })?;

    Ok(load_document(&document, &buffers))
}

fn load_document(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<GltfObject> {
    let mut objects = Vec::new();

    let scene = document.default_scene().or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, Mat4::IDENTITY, buffers, &mut objects);
            }
        }
        // No scene: treat every node as a root
        None => {
            for node in document.nodes() {
                collect_node_flat(&node, buffers, &mut objects);
            }
        }
    }

    objects
}

fn collect_node(node: &gltf::Node, parent: Mat4, buffers: &[gltf::buffer::Data], objects: &mut Vec<GltfObject>) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        objects.push(load_object(node, &mesh, world, buffers));
    }
    for child in node.children() {
        collect_node(&child, world, buffers, objects);
    }
}

fn collect_node_flat(node: &gltf::Node, buffers: &[gltf::buffer::Data], objects: &mut Vec<GltfObject>) {
    if let Some(mesh) = node.mesh() {
        let local = Mat4::from_cols_array_2d(&node.transform().matrix());
        objects.push(load_object(node, &mesh, local, buffers));
    }
}

fn load_object(node: &gltf::Node, mesh: &gltf::Mesh, world: Mat4, buffers: &[gltf::buffer::Data]) -> GltfObject {
    let name = node.name().or_else(|| mesh.name()).unwrap_or("Mesh").to_string();
    let primitives = mesh
        .primitives()
        .map(|primitive| load_primitive(&primitive, buffers))
        .collect();

    GltfObject {
        name,
        world,
        selected: false,
        primitives,
    }
}

fn load_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> PrimitiveData {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &**data));

    let positions = reader
        .read_positions()
        .map(|iter| iter.map(Vec3::from).collect());
    let normals = reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from).collect());
    let uv_sets = (0..)
        .map_while(|set| reader.read_tex_coords(set))
        .map(|iter| iter.into_f32().map(Vec2::from).collect())
        .collect();
    let color_sets = (0..)
        .map_while(|set| reader.read_colors(set))
        .map(|iter| iter.into_rgb_f32().map(Vec3::from).collect())
        .collect();
    let indices = reader.read_indices().map(|iter| iter.into_u32().collect());

    let material = primitive.material();
    let material_name = material
        .name()
        .map(str::to_string)
        .or_else(|| material.index().map(|i| format!("Material{i}")))
        .unwrap_or_default();

    PrimitiveData {
        mode: primitive.mode(),
        material: material.index(),
        material_name,
        positions,
        normals,
        uv_sets,
        color_sets,
        indices,
    }
}

// ============================================================================
// Materializing
// ============================================================================

impl MeshSource for GltfObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn materialize(&self, request: &MaterializeRequest) -> std::result::Result<MeshSnapshot, MaterializeError> {
        if self.primitives.is_empty() {
            return Err(MaterializeError::NoMesh);
        }

        let transform = request.transform * self.world;
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

        let color_channels = self
            .primitives
            .iter()
            .map(|p| p.color_sets.len())
            .max()
            .unwrap_or(0)
            .min(request.color_channel_count);

        let mut snapshot = MeshSnapshot::new(self.name.clone(), request.uv_channel_count, color_channels);
        let mut welded: HashMap<[u32; 3], u32> = HashMap::new();
        let mut materials: IndexMap<Option<usize>, String> = IndexMap::new();

        for (index, primitive) in self.primitives.iter().enumerate() {
            if primitive.mode != Mode::Triangles {
                return Err(MaterializeError::UnsupportedPrimitive {
                    primitive: index,
                    mode: format!("{:?}", primitive.mode),
                });
            }
            let positions = primitive
                .positions
                .as_ref()
                .ok_or(MaterializeError::MissingPositions { primitive: index })?;

            let (material_index, _) = materials.insert_full(primitive.material, primitive.material_name.clone());

            // Source vertex -> welded snapshot vertex
            let vertex_ids: Vec<u32> = positions
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    *welded.entry(p.to_array().map(f32::to_bits)).or_insert_with(|| {
                        let normal = primitive
                            .normals
                            .as_ref()
                            .and_then(|n| n.get(i))
                            .map_or(Vec3::ZERO, |&n| (normal_matrix * n).normalize_or_zero());
                        snapshot.add_vertex(transform.transform_point3(p), normal)
                    })
                })
                .collect();

            let indices: Vec<u32> = match &primitive.indices {
                Some(indices) => indices.clone(),
                None => (0..positions.len() as u32).collect(),
            };

            for triangle in indices.chunks_exact(3) {
                if let Some(&bad) = triangle.iter().find(|&&i| i as usize >= positions.len()) {
                    return Err(MaterializeError::Other(format!(
                        "primitive {index} index {bad} exceeds {} vertices",
                        positions.len()
                    )));
                }

                let flat_normal = {
                    let [a, b, c] = [0, 1, 2].map(|k| positions[triangle[k] as usize]);
                    (normal_matrix * (b - a).cross(c - a)).normalize_or_zero()
                };

                let corners = triangle
                    .iter()
                    .map(|&i| {
                        let i = i as usize;
                        let normal = primitive
                            .normals
                            .as_ref()
                            .and_then(|n| n.get(i))
                            .map_or(flat_normal, |&n| (normal_matrix * n).normalize_or_zero());
                        Corner {
                            vertex: vertex_ids[i],
                            normal,
                            uvs: corner_uvs(primitive, i, request.uv_channel_count),
                            colors: corner_colors(primitive, i, color_channels),
                        }
                    })
                    .collect();

                snapshot.add_face(material_index as u32, corners);
            }
        }

        snapshot.material_names = materials.into_values().collect();

        tracing::debug!(
            "Materialized '{}': {} primitives, {} welded vertices, {} faces",
            self.name,
            self.primitives.len(),
            snapshot.vertices.len(),
            snapshot.faces.len()
        );

        Ok(snapshot)
    }
}

/// UVs of one source vertex, flipped to a bottom-left origin.
/// Missing sets are zero-filled.
fn corner_uvs(primitive: &PrimitiveData, vertex: usize, channels: usize) -> Vec<Vec2> {
    (0..channels)
        .map(|set| {
            primitive
                .uv_sets
                .get(set)
                .and_then(|uvs| uvs.get(vertex))
                .map_or(Vec2::ZERO, |uv| Vec2::new(uv.x, 1.0 - uv.y))
        })
        .collect()
}

fn corner_colors(primitive: &PrimitiveData, vertex: usize, channels: usize) -> Vec<Vec3> {
    (0..channels)
        .map(|set| {
            primitive
                .color_sets
                .get(set)
                .and_then(|colors| colors.get(vertex))
                .copied()
                .unwrap_or(DEFAULT_COLOR)
        })
        .collect()
}
