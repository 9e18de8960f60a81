//! Export configuration
//!
//! Options can be built in code, loaded from a TOML file, or assembled by
//! the CLI. Every field has a default, so a TOML file only needs the keys it
//! changes:
//!
//! ```toml
//! export_selected = true
//! uv_channel_count = 2
//! index_type = "uint32"
//! axis = "z-up"
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use bmformat::bmf::MAX_UV_CHANNELS;
use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Most color sets a mesh source will collect per corner.
pub const MAX_COLOR_CHANNELS: usize = 4;

/// How the index element width is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexTypeMode {
    /// Smallest width that addresses every final vertex.
    #[default]
    Auto,
    UInt16,
    UInt32,
}

impl FromStr for IndexTypeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "uint16" | "u16" | "16" => Ok(Self::UInt16),
            "uint32" | "u32" | "32" => Ok(Self::UInt32),
            _ => Err(format!("Invalid index type '{s}'. Valid values: auto, uint16, uint32")),
        }
    }
}

/// Up axis of the exported data. Sources are read Y-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisPreset {
    #[default]
    YUp,
    ZUp,
}

impl AxisPreset {
    pub fn matrix(self) -> Mat4 {
        match self {
            Self::YUp => Mat4::IDENTITY,
            // +Y becomes +Z, +Z becomes -Y
            Self::ZUp => Mat4::from_cols(Vec4::X, Vec4::Z, -Vec4::Y, Vec4::W),
        }
    }
}

impl FromStr for AxisPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "y-up" | "y" => Ok(Self::YUp),
            "z-up" | "z" => Ok(Self::ZUp),
            _ => Err(format!("Invalid axis '{s}'. Valid values: y-up, z-up")),
        }
    }
}

/// Options consumed by the export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Only export objects the host marks as selected.
    pub export_selected: bool,
    /// Accepted for compatibility; meshes are always written separately.
    pub merge_objects: bool,
    /// UV channels written per vertex. Extra source channels are dropped,
    /// missing ones are zero-filled.
    pub uv_channel_count: usize,
    /// Color sets collected per corner. Colors take part in vertex splitting
    /// but are not written to the file.
    pub color_channel_count: usize,
    pub index_type: IndexTypeMode,
    /// Write vertex data per vertex instead of one stream per attribute.
    pub interleaved: bool,
    pub axis: AxisPreset,
    /// Row-major 4x4 matrix applied to positions and normals by the mesh
    /// source. Overrides `axis` when set.
    pub coordinate_transform: Option<[[f32; 4]; 4]>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            export_selected: false,
            merge_objects: false,
            uv_channel_count: 1,
            color_channel_count: 1,
            index_type: IndexTypeMode::Auto,
            interleaved: true,
            axis: AxisPreset::YUp,
            coordinate_transform: None,
        }
    }
}

impl ExportOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uv_channel_count > MAX_UV_CHANNELS {
            return Err(Error::Config(format!(
                "uv_channel_count {} exceeds the {} texture coordinate slots",
                self.uv_channel_count, MAX_UV_CHANNELS
            )));
        }
        if self.color_channel_count > MAX_COLOR_CHANNELS {
            return Err(Error::Config(format!(
                "color_channel_count {} exceeds {}",
                self.color_channel_count, MAX_COLOR_CHANNELS
            )));
        }
        if let Some(rows) = &self.coordinate_transform {
            if rows.iter().flatten().any(|v| !v.is_finite()) {
                return Err(Error::Config(
                    "coordinate_transform contains non-finite values".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The matrix mesh sources apply before handing data to the pipeline.
    pub fn transform(&self) -> Mat4 {
        match &self.coordinate_transform {
            // glam is column-major
            Some(rows) => Mat4::from_cols_array_2d(rows).transpose(),
            None => self.axis.matrix(),
        }
    }
}
