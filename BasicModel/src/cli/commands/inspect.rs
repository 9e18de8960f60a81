//! CLI command for inspecting BMF files

use std::path::Path;

use bmformat::bmf::{BmfInfo, read_bmf};

pub fn execute(path: &Path, json: bool) -> anyhow::Result<()> {
    let info = read_bmf(path)?.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(path, &info);
    }

    Ok(())
}

fn print_info(path: &Path, info: &BmfInfo) {
    println!("File: {}", path.display());
    println!("Version: {}", info.version);

    println!("Blocks: {}", info.blocks.len());
    for block in &info.blocks {
        let kind = block
            .kind
            .map_or_else(|| format!("Unknown({})", block.block_type), |k| format!("{k:?}"));
        println!("  {kind} at {} ({} bytes)", block.offset, block.length);
    }

    println!("Meshes: {}", info.meshes.len());
    for mesh in &info.meshes {
        println!("  {}", mesh.name);
        println!(
            "    {} vertices, {} triangles, {:?} indices, {}",
            mesh.vertex_count,
            mesh.triangle_count,
            mesh.index_type,
            if mesh.interleaved { "interleaved" } else { "planar" }
        );
        println!("    UV channels: {}", mesh.uv_channels);

        let attributes: Vec<String> = mesh
            .attributes
            .iter()
            .map(|a| format!("{:?}x{} {:?}", a.base_type, a.components, a.attr_map))
            .collect();
        println!("    Attributes: {}", attributes.join(", "));

        for (i, count) in mesh.submesh_index_counts.iter().enumerate() {
            println!("    Submesh {i}: {} triangles", count / 3);
        }
    }
}
