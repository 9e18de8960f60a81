//! Append-only little-endian byte buffer.
//!
//! Every multi-byte field in a BMF file is little-endian. The encoder never
//! seeks; blocks are built in their own encoder and spliced into the parent
//! once their length is known.

use glam::{Vec2, Vec3, Vec4};

/// A value that knows how to append itself to a [`BinaryEncoder`].
pub trait Encodable {
    fn encode(&self, encoder: &mut BinaryEncoder);
}

/// An append-only byte buffer with fixed-width primitive writers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryEncoder {
    data: Vec<u8>,
}

impl BinaryEncoder {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw contents written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn write_i8(&mut self, v: i8) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.data.push(u8::from(v));
    }

    pub fn write_f32(&mut self, v: f32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a string as ASCII.
    ///
    /// With `fixed_size`, exactly that many bytes are written: the string is
    /// truncated or zero-padded to fit and no terminator is guaranteed.
    /// Without it, the string is followed by a single null terminator.
    /// Each non-ASCII character is written as a single `?`.
    pub fn write_string(&mut self, value: &str, fixed_size: Option<usize>) {
        let ascii = value
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' });

        match fixed_size {
            Some(size) => {
                let start = self.data.len();
                self.data.extend(ascii.take(size));
                let written = self.data.len() - start;
                self.data.extend(std::iter::repeat_n(0u8, size - written));
            }
            None => {
                self.data.extend(ascii);
                self.data.push(0); // Null terminator
            }
        }
    }

    /// Append any [`Encodable`] value.
    pub fn write<E: Encodable + ?Sized>(&mut self, value: &E) {
        value.encode(self);
    }
}

impl Encodable for Vec2 {
    fn encode(&self, encoder: &mut BinaryEncoder) {
        encoder.write_f32(self.x);
        encoder.write_f32(self.y);
    }
}

impl Encodable for Vec3 {
    fn encode(&self, encoder: &mut BinaryEncoder) {
        encoder.write_f32(self.x);
        encoder.write_f32(self.y);
        encoder.write_f32(self.z);
    }
}

impl Encodable for Vec4 {
    fn encode(&self, encoder: &mut BinaryEncoder) {
        encoder.write_f32(self.x);
        encoder.write_f32(self.y);
        encoder.write_f32(self.z);
        encoder.write_f32(self.w);
    }
}

// Nested buffers are spliced in as-is.
impl Encodable for BinaryEncoder {
    fn encode(&self, encoder: &mut BinaryEncoder) {
        encoder.write_bytes(&self.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitives_little_endian() {
        let mut enc = BinaryEncoder::new();
        enc.write_u16(0x0102);
        enc.write_u32(0x0304_0506);
        enc.write_i16(-2);
        enc.write_bool(true);
        enc.write_i8(-1);

        assert_eq!(
            enc.as_bytes(),
            &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0xFE, 0xFF, 0x01, 0xFF]
        );
    }

    #[test]
    fn test_float_bits() {
        let mut enc = BinaryEncoder::new();
        enc.write_f32(1.0);
        assert_eq!(enc.as_bytes(), &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_fixed_string_pads_and_truncates() {
        let mut enc = BinaryEncoder::new();
        enc.write_string("Cube", Some(8));
        assert_eq!(enc.as_bytes(), b"Cube\0\0\0\0");

        let mut enc = BinaryEncoder::new();
        enc.write_string("LongerThanFour", Some(4));
        assert_eq!(enc.as_bytes(), b"Long");
    }

    #[test]
    fn test_non_ascii_is_one_byte_per_char() {
        let mut enc = BinaryEncoder::new();
        enc.write_string("Café", Some(6));
        assert_eq!(enc.as_bytes(), b"Caf?\0\0");

        let mut enc = BinaryEncoder::new();
        enc.write_string("Ω€", None);
        assert_eq!(enc.as_bytes(), b"??\0");
    }

    #[test]
    fn test_terminated_string() {
        let mut enc = BinaryEncoder::new();
        enc.write_string("abc", None);
        assert_eq!(enc.len(), 4);
        assert_eq!(enc.as_bytes(), b"abc\0");
    }

    #[test]
    fn test_vectors_and_nested_buffer() {
        let mut inner = BinaryEncoder::new();
        inner.write(&Vec2::new(1.0, 2.0));

        let mut outer = BinaryEncoder::new();
        outer.write_u8(7);
        outer.write(&inner);
        outer.write(&Vec3::ZERO);
        outer.write(&Vec4::ONE);

        assert_eq!(outer.len(), 1 + 8 + 12 + 16);
        assert_eq!(&outer.as_bytes()[1..9], inner.as_bytes());
    }
}
