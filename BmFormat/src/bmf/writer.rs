//! BMF file composition and writing

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::mesh::{BmMesh, checked_u16};
use super::{BLOCK_HEADER_SIZE, BlockType, FileHeader, HEADER_SIZE};
use crate::encoder::BinaryEncoder;
use crate::error::{Error, Result};

/// Frame `block` as a typed, length-prefixed block and append it to `stream`.
pub fn write_block(stream: &mut BinaryEncoder, block: &BinaryEncoder, block_type: BlockType) -> Result<()> {
    let length = u32::try_from(block.len()).map_err(|_| Error::CountOverflow {
        what: "block byte",
        count: block.len(),
    })?;

    stream.write_u16(block_type.tag());
    stream.write_u32(length);
    stream.write(block);
    Ok(())
}

/// Write a mesh block payload: mesh count followed by every mesh.
pub fn write_mesh_block(meshes: &[BmMesh], stream: &mut BinaryEncoder) -> Result<()> {
    stream.write_u16(checked_u16("mesh", meshes.len())?);
    for mesh in meshes {
        mesh.write(stream)?;
    }
    Ok(())
}

/// Composes a file header and its blocks into the final byte sequence.
#[derive(Debug, Default)]
pub struct BmFileWriter {
    header: FileHeader,
    blocks: Vec<(BlockType, BinaryEncoder)>,
}

impl BmFileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(header: FileHeader) -> Self {
        Self {
            header,
            blocks: Vec::new(),
        }
    }

    /// Add a pre-encoded block payload.
    pub fn add_block(&mut self, block_type: BlockType, payload: BinaryEncoder) {
        self.blocks.push((block_type, payload));
    }

    /// Encode `meshes` into a mesh data block and add it.
    pub fn add_mesh_block(&mut self, meshes: &[BmMesh]) -> Result<()> {
        let mut payload = BinaryEncoder::new();
        write_mesh_block(meshes, &mut payload)?;
        self.add_block(BlockType::MeshData, payload);
        Ok(())
    }

    /// Build the complete file in memory.
    pub fn build(&self) -> Result<Vec<u8>> {
        let capacity = HEADER_SIZE
            + self
                .blocks
                .iter()
                .map(|(_, b)| BLOCK_HEADER_SIZE + b.len())
                .sum::<usize>();

        let mut stream = BinaryEncoder::with_capacity(capacity);
        self.header.write(&mut stream);
        for (block_type, payload) in &self.blocks {
            write_block(&mut stream, payload, *block_type)?;
        }
        Ok(stream.into_bytes())
    }

    /// Build the file and write it to `path`, replacing any existing file.
    ///
    /// Nothing is written if building fails.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.build()?;
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;

        tracing::info!(
            "Wrote {} bytes ({} blocks) to {}",
            bytes.len(),
            self.blocks.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_framing() {
        let mut payload = BinaryEncoder::new();
        payload.write_bytes(&[1, 2, 3]);

        let mut stream = BinaryEncoder::new();
        write_block(&mut stream, &payload, BlockType::SceneData).unwrap();

        assert_eq!(stream.as_bytes(), &[16, 0, 3, 0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_mesh_block() {
        let mut writer = BmFileWriter::new();
        writer.add_mesh_block(&[]).unwrap();
        let bytes = writer.build().unwrap();

        assert_eq!(
            bytes,
            vec![b'B', b'M', b'D', b'L', 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 0, 0]
        );
    }
}
