//! Numeric storage formats and their byte codecs.
//!
//! [`AttributeFormat`] is the format table (byte and bit width per scalar
//! component). Reading and writing go through a single [`FormatCodec`]
//! per implemented format, shared by every attribute buffer path.
//!
//! All encodings are little-endian.

use crate::error::{MeshError, MeshResult};

/// Scalar storage format of one attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeFormat {
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Half-precision float. Not yet implemented.
    Float16,
    /// Single-precision float.
    Float32,
    /// 8-bit normalized integer. Not yet implemented.
    Norm8,
    /// 16-bit normalized integer. Not yet implemented.
    Norm16,
}

impl AttributeFormat {
    /// Every recognized format, in raw tag order.
    pub const ALL: [Self; 7] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Float16,
        Self::Float32,
        Self::Norm8,
        Self::Norm16,
    ];

    /// Get the size in bytes of one component.
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Int8 | Self::Norm8 => 1,
            Self::Int16 | Self::Float16 | Self::Norm16 => 2,
            Self::Int32 | Self::Float32 => 4,
        }
    }

    /// Get the size in bits of one component.
    pub fn bit_size(&self) -> usize {
        self.byte_size() * 8
    }

    /// Check whether values can be read and written in this format.
    pub fn is_implemented(&self) -> bool {
        !matches!(self, Self::Float16 | Self::Norm8 | Self::Norm16)
    }

    /// Get the codec for this format.
    ///
    /// Fails with [`MeshError::NotImplemented`] for the placeholder formats.
    pub fn codec(&self) -> MeshResult<&'static dyn FormatCodec> {
        match self {
            Self::Int8 => Ok(&Int8Codec),
            Self::Int16 => Ok(&Int16Codec),
            Self::Int32 => Ok(&Int32Codec),
            Self::Float32 => Ok(&Float32Codec),
            Self::Float16 | Self::Norm8 | Self::Norm16 => Err(MeshError::NotImplemented(*self)),
        }
    }
}

impl TryFrom<u32> for AttributeFormat {
    type Error = MeshError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(MeshError::UnknownFormat(raw))
    }
}

impl From<AttributeFormat> for u32 {
    fn from(format: AttributeFormat) -> Self {
        match format {
            AttributeFormat::Int8 => 0,
            AttributeFormat::Int16 => 1,
            AttributeFormat::Int32 => 2,
            AttributeFormat::Float16 => 3,
            AttributeFormat::Float32 => 4,
            AttributeFormat::Norm8 => 5,
            AttributeFormat::Norm16 => 6,
        }
    }
}

impl std::fmt::Display for AttributeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Float16 => "FLOAT16",
            Self::Float32 => "FLOAT32",
            Self::Norm8 => "NORM8",
            Self::Norm16 => "NORM16",
        };
        f.write_str(name)
    }
}

/// Encoder/decoder for one scalar component.
///
/// Callers bounds-check `offset + format().byte_size()` against the slice
/// before calling; the codecs index the slice directly.
pub trait FormatCodec: Sync {
    /// The format this codec implements.
    fn format(&self) -> AttributeFormat;

    /// Write `value` at `offset`.
    fn encode(&self, bytes: &mut [u8], offset: usize, value: f32);

    /// Read the value stored at `offset`.
    fn decode(&self, bytes: &[u8], offset: usize) -> f32;
}

/// Truncate toward zero. Non-finite values become 0; the integer codecs
/// then wrap modulo their width.
fn to_integer(value: f32) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

struct Int8Codec;

impl FormatCodec for Int8Codec {
    fn format(&self) -> AttributeFormat {
        AttributeFormat::Int8
    }

    fn encode(&self, bytes: &mut [u8], offset: usize, value: f32) {
        bytes[offset] = (to_integer(value) as i8) as u8;
    }

    fn decode(&self, bytes: &[u8], offset: usize) -> f32 {
        bytes[offset] as i8 as f32
    }
}

struct Int16Codec;

impl FormatCodec for Int16Codec {
    fn format(&self) -> AttributeFormat {
        AttributeFormat::Int16
    }

    fn encode(&self, bytes: &mut [u8], offset: usize, value: f32) {
        bytes[offset..offset + 2].copy_from_slice(&(to_integer(value) as i16).to_le_bytes());
    }

    fn decode(&self, bytes: &[u8], offset: usize) -> f32 {
        i16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as f32
    }
}

struct Int32Codec;

impl FormatCodec for Int32Codec {
    fn format(&self) -> AttributeFormat {
        AttributeFormat::Int32
    }

    fn encode(&self, bytes: &mut [u8], offset: usize, value: f32) {
        bytes[offset..offset + 4].copy_from_slice(&(to_integer(value) as i32).to_le_bytes());
    }

    fn decode(&self, bytes: &[u8], offset: usize) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[offset..offset + 4]);
        i32::from_le_bytes(raw) as f32
    }
}

struct Float32Codec;

impl FormatCodec for Float32Codec {
    fn format(&self) -> AttributeFormat {
        AttributeFormat::Float32
    }

    fn encode(&self, bytes: &mut [u8], offset: usize, value: f32) {
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn decode(&self, bytes: &[u8], offset: usize) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[offset..offset + 4]);
        f32::from_le_bytes(raw)
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexFormat {
    /// 16-bit unsigned integers (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned integers (max ~4 billion vertices).
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Map a typed view's element width to an index format.
    pub fn from_element_size(element_size: usize) -> Option<Self> {
        match element_size {
            2 => Some(Self::Uint16),
            4 => Some(Self::Uint32),
            _ => None,
        }
    }

    /// Largest index representable without truncation.
    pub fn max_index(&self) -> u32 {
        match self {
            Self::Uint16 => u16::MAX as u32,
            Self::Uint32 => u32::MAX,
        }
    }

    /// Append `index` to `out`. `Uint16` keeps the low 16 bits.
    pub(crate) fn write(&self, out: &mut Vec<u8>, index: u32) {
        match self {
            Self::Uint16 => out.extend_from_slice(&(index as u16).to_le_bytes()),
            Self::Uint32 => out.extend_from_slice(&index.to_le_bytes()),
        }
    }

    /// Read the index stored at `offset`.
    pub(crate) fn read(&self, bytes: &[u8], offset: usize) -> u32 {
        match self {
            Self::Uint16 => u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as u32,
            Self::Uint32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&bytes[offset..offset + 4]);
                u32::from_le_bytes(raw)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sizes() {
        assert_eq!(AttributeFormat::Int8.byte_size(), 1);
        assert_eq!(AttributeFormat::Int16.byte_size(), 2);
        assert_eq!(AttributeFormat::Int32.byte_size(), 4);
        assert_eq!(AttributeFormat::Float16.byte_size(), 2);
        assert_eq!(AttributeFormat::Float32.byte_size(), 4);
        assert_eq!(AttributeFormat::Norm8.byte_size(), 1);
        assert_eq!(AttributeFormat::Norm16.byte_size(), 2);

        for format in AttributeFormat::ALL {
            assert_eq!(format.bit_size(), format.byte_size() * 8);
        }
    }

    #[test]
    fn test_raw_format_tags() {
        for format in AttributeFormat::ALL {
            let raw: u32 = format.into();
            assert_eq!(AttributeFormat::try_from(raw), Ok(format));
        }
        assert_eq!(
            AttributeFormat::try_from(42),
            Err(MeshError::UnknownFormat(42))
        );
    }

    #[test]
    fn test_placeholder_formats_are_not_implemented() {
        for format in [
            AttributeFormat::Float16,
            AttributeFormat::Norm8,
            AttributeFormat::Norm16,
        ] {
            assert!(!format.is_implemented());
            assert_eq!(
                format.codec().err(),
                Some(MeshError::NotImplemented(format))
            );
        }
    }

    #[test]
    fn test_codec_matches_format() {
        for format in AttributeFormat::ALL.into_iter().filter(|f| f.is_implemented()) {
            assert_eq!(format.codec().unwrap().format(), format);
        }
    }

    #[test]
    fn test_integer_codecs_truncate_and_wrap() {
        let mut bytes = [0u8; 4];

        let int8 = AttributeFormat::Int8.codec().unwrap();
        int8.encode(&mut bytes, 0, 200.0);
        assert_eq!(int8.decode(&bytes, 0), -56.0);
        int8.encode(&mut bytes, 0, -3.9);
        assert_eq!(int8.decode(&bytes, 0), -3.0);

        let int16 = AttributeFormat::Int16.codec().unwrap();
        int16.encode(&mut bytes, 2, 40000.0);
        assert_eq!(int16.decode(&bytes, 2), -25536.0);

        let int32 = AttributeFormat::Int32.codec().unwrap();
        int32.encode(&mut bytes, 0, f32::NAN);
        assert_eq!(int32.decode(&bytes, 0), 0.0);
        int32.encode(&mut bytes, 0, 123456.7);
        assert_eq!(int32.decode(&bytes, 0), 123456.0);
    }

    #[test]
    fn test_float32_codec_is_little_endian() {
        let mut bytes = [0u8; 8];
        let codec = AttributeFormat::Float32.codec().unwrap();
        codec.encode(&mut bytes, 4, 1.5);
        assert_eq!(&bytes[4..], &1.5f32.to_le_bytes());
        assert_eq!(codec.decode(&bytes, 4), 1.5);
    }

    #[test]
    fn test_index_format_size() {
        assert_eq!(IndexFormat::Uint16.size(), 2);
        assert_eq!(IndexFormat::Uint32.size(), 4);
        assert_eq!(IndexFormat::from_element_size(2), Some(IndexFormat::Uint16));
        assert_eq!(IndexFormat::from_element_size(4), Some(IndexFormat::Uint32));
        assert_eq!(IndexFormat::from_element_size(1), None);
    }

    #[test]
    fn test_index_format_narrowing_keeps_low_bits() {
        let mut bytes = Vec::new();
        IndexFormat::Uint16.write(&mut bytes, 70000);
        assert_eq!(bytes.len(), 2);
        assert_eq!(IndexFormat::Uint16.read(&bytes, 0), 70000 - 65536);
    }
}
