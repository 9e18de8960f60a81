//! CLI command for exporting glTF scenes to BMF

use anyhow::Context;

use super::ExportArgs;
use crate::export::{ExportReport, MeshSource, export_to_file};
use crate::gltf_source::{load_gltf, select_by_name};
use crate::options::ExportOptions;

pub fn execute(args: &ExportArgs) -> anyhow::Result<()> {
    let options = build_options(args)?;

    let mut objects = load_gltf(&args.input)?;
    if !args.select.is_empty() {
        select_by_name(&mut objects, &args.select);
        for name in &args.select {
            if !objects.iter().any(|o| o.name() == name) {
                println!("Warning: no object named '{name}'");
            }
        }
    }

    let report = export_to_file(&args.output, &objects, &options)
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    print_report(&report);
    println!("Wrote {}", args.output.display());

    Ok(())
}

/// Options from the config file (or defaults) with flag overrides applied.
fn build_options(args: &ExportArgs) -> anyhow::Result<ExportOptions> {
    let mut options = match &args.config {
        Some(path) => ExportOptions::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExportOptions::default(),
    };

    if let Some(index_type) = args.index_type {
        options.index_type = index_type;
    }
    if let Some(count) = args.uv_channels {
        options.uv_channel_count = count;
    }
    if let Some(count) = args.color_channels {
        options.color_channel_count = count;
    }
    if let Some(axis) = args.axis {
        options.axis = axis;
        options.coordinate_transform = None;
    }
    if !args.select.is_empty() {
        options.export_selected = true;
    }
    if args.merge_objects {
        options.merge_objects = true;
    }
    if args.planar {
        options.interleaved = false;
    }

    options.validate()?;
    Ok(options)
}

fn print_report(report: &ExportReport) {
    println!("Meshes: {}", report.meshes.len());
    for mesh in &report.meshes {
        let renamed = if mesh.name == mesh.source_name {
            String::new()
        } else {
            format!(" (from '{}')", mesh.source_name)
        };
        println!(
            "  {}{}: {} -> {} vertices, {} triangles, {} submeshes, {:?}",
            mesh.name,
            renamed,
            mesh.source_vertex_count,
            mesh.vertex_count,
            mesh.triangle_count,
            mesh.submesh_count,
            mesh.index_type
        );
    }

    if !report.skipped.is_empty() {
        println!("Skipped: {}", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.name, skipped.reason);
        }
    }

    if report.filtered > 0 {
        println!("Filtered out: {}", report.filtered);
    }

    if report.has_omitted_colors() {
        println!("Note: vertex colors are not stored in BMF files and were left out");
    }

    println!(
        "Total: {} vertices, {} triangles, {} bytes",
        report.vertex_count(),
        report.triangle_count(),
        report.byte_size
    );
}
