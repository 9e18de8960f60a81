use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::options::{AxisPreset, IndexTypeMode};

pub mod export;
pub mod inspect;

#[derive(Subcommand)]
pub enum Commands {
    /// Export the meshes of a glTF/GLB file to BMF
    Export(ExportArgs),

    /// Print the header, blocks and meshes of a BMF file
    Inspect {
        /// BMF file to read
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Source glTF or GLB file
    pub input: PathBuf,

    /// Destination BMF file (overwritten)
    #[arg(short, long)]
    pub output: PathBuf,

    /// TOML file with export options; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Index width: auto, uint16 or uint32
    #[arg(long)]
    pub index_type: Option<IndexTypeMode>,

    /// UV channels written per vertex (0-4)
    #[arg(long)]
    pub uv_channels: Option<usize>,

    /// Color channels collected per corner
    #[arg(long)]
    pub color_channels: Option<usize>,

    /// Up axis of the output: y-up or z-up
    #[arg(long)]
    pub axis: Option<AxisPreset>,

    /// Only export objects with these names (repeatable)
    #[arg(long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// Merge all objects into one mesh (accepted, not supported yet)
    #[arg(long)]
    pub merge_objects: bool,

    /// Write one vertex stream per attribute instead of interleaved vertices
    #[arg(long)]
    pub planar: bool,
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Export(args) => export::execute(args),
            Commands::Inspect { file, json } => inspect::execute(file, *json),
        }
    }
}
