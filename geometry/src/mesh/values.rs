//! Logical vertex values and the input shapes accepted by writers.
//!
//! Writers take a [`VertexData`] or [`IndexData`]: a closed set of shapes
//! resolved once at the call boundary, so the packing loops never inspect
//! element types at runtime.

use crate::math::{Vec2, Vec3, Vec4};

use super::layout::Arity;

/// A decoded logical attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexValue {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl VertexValue {
    /// Shape of this value.
    pub fn arity(&self) -> Arity {
        match self {
            Self::Scalar(_) => Arity::Scalar,
            Self::Vec2(_) => Arity::Vec2,
            Self::Vec3(_) => Arity::Vec3,
            Self::Vec4(_) => Arity::Vec4,
        }
    }

    /// Get the number, if this is a scalar.
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the vector, if this is a `Vec2`.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the vector, if this is a `Vec3`.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the vector, if this is a `Vec4`.
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for VertexValue {
    fn from(v: f32) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec2> for VertexValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for VertexValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for VertexValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

/// Vertex data accepted by `set_vertex_data`.
///
/// `Raw` and `View` are already-encoded bytes copied verbatim into the
/// attribute buffer starting at byte 0. The logical variants are encoded
/// per vertex using the attribute's format and must match its arity.
#[derive(Debug, Clone, Copy)]
pub enum VertexData<'a> {
    /// Encoded bytes.
    Raw(&'a [u8]),
    /// Window `offset..offset + len` of a larger encoded byte region.
    View {
        bytes: &'a [u8],
        offset: usize,
        len: usize,
    },
    /// One plain number per vertex.
    Scalars(&'a [f32]),
    Vec2(&'a [Vec2]),
    Vec3(&'a [Vec3]),
    Vec4(&'a [Vec4]),
}

impl<'a> VertexData<'a> {
    /// Create a windowed view over encoded bytes.
    pub fn view(bytes: &'a [u8], offset: usize, len: usize) -> Self {
        Self::View { bytes, offset, len }
    }

    /// Shape of the logical values, or `None` for encoded bytes.
    pub fn arity(&self) -> Option<Arity> {
        match self {
            Self::Raw(_) | Self::View { .. } => None,
            Self::Scalars(_) => Some(Arity::Scalar),
            Self::Vec2(_) => Some(Arity::Vec2),
            Self::Vec3(_) => Some(Arity::Vec3),
            Self::Vec4(_) => Some(Arity::Vec4),
        }
    }

    /// Number of logical values, or bytes for encoded data.
    pub fn len(&self) -> usize {
        match self {
            Self::Raw(bytes) => bytes.len(),
            Self::View { len, .. } => *len,
            Self::Scalars(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! impl_vertex_data_from {
    ($ty:ty, $variant:ident) => {
        impl<'a> From<&'a [$ty]> for VertexData<'a> {
            fn from(values: &'a [$ty]) -> Self {
                Self::$variant(values)
            }
        }

        impl<'a> From<&'a Vec<$ty>> for VertexData<'a> {
            fn from(values: &'a Vec<$ty>) -> Self {
                Self::$variant(values.as_slice())
            }
        }

        impl<'a, const N: usize> From<&'a [$ty; N]> for VertexData<'a> {
            fn from(values: &'a [$ty; N]) -> Self {
                Self::$variant(values.as_slice())
            }
        }
    };
}

impl_vertex_data_from!(u8, Raw);
impl_vertex_data_from!(f32, Scalars);
impl_vertex_data_from!(Vec2, Vec2);
impl_vertex_data_from!(Vec3, Vec3);
impl_vertex_data_from!(Vec4, Vec4);

/// An owned array of logical values of one arity.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexValues {
    Scalars(Vec<f32>),
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
}

impl VertexValues {
    /// Shape of the stored values.
    pub fn arity(&self) -> Arity {
        match self {
            Self::Scalars(_) => Arity::Scalar,
            Self::Vec2(_) => Arity::Vec2,
            Self::Vec3(_) => Arity::Vec3,
            Self::Vec4(_) => Arity::Vec4,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Scalars(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at `index`.
    pub fn get(&self, index: usize) -> Option<VertexValue> {
        match self {
            Self::Scalars(v) => v.get(index).copied().map(VertexValue::Scalar),
            Self::Vec2(v) => v.get(index).copied().map(VertexValue::Vec2),
            Self::Vec3(v) => v.get(index).copied().map(VertexValue::Vec3),
            Self::Vec4(v) => v.get(index).copied().map(VertexValue::Vec4),
        }
    }

    /// Borrow as writer input.
    pub fn as_data(&self) -> VertexData<'_> {
        match self {
            Self::Scalars(v) => VertexData::Scalars(v),
            Self::Vec2(v) => VertexData::Vec2(v),
            Self::Vec3(v) => VertexData::Vec3(v),
            Self::Vec4(v) => VertexData::Vec4(v),
        }
    }

    /// Collect decoded values of a known arity.
    ///
    /// Values of any other shape are skipped.
    pub fn collect_from(arity: Arity, values: impl Iterator<Item = VertexValue>) -> Self {
        match arity {
            Arity::Scalar => Self::Scalars(values.filter_map(|v| v.as_scalar()).collect()),
            Arity::Vec2 => Self::Vec2(values.filter_map(|v| v.as_vec2()).collect()),
            Arity::Vec3 => Self::Vec3(values.filter_map(|v| v.as_vec3()).collect()),
            Arity::Vec4 => Self::Vec4(values.filter_map(|v| v.as_vec4()).collect()),
        }
    }
}

impl<'a> From<&'a VertexValues> for VertexData<'a> {
    fn from(values: &'a VertexValues) -> Self {
        values.as_data()
    }
}

/// Index data accepted by `Mesh::set_index_data`.
#[derive(Debug, Clone, Copy)]
pub enum IndexData<'a> {
    /// Bytes already encoded in the mesh's current index format.
    Raw(&'a [u8]),
    /// 16-bit typed view; switches the mesh to `Uint16`.
    U16(&'a [u16]),
    /// 32-bit typed view; switches the mesh to `Uint32`.
    U32(&'a [u32]),
    /// Typed view whose element width is only known at runtime (e.g. an
    /// importer's accessor). Widths other than 2 and 4 are rejected.
    Typed { bytes: &'a [u8], element_size: usize },
    /// Logical indices encoded with the mesh's current index format.
    Values(&'a [u32]),
}

impl<'a> From<&'a [u16]> for IndexData<'a> {
    fn from(indices: &'a [u16]) -> Self {
        Self::U16(indices)
    }
}

impl<'a> From<&'a [u32]> for IndexData<'a> {
    fn from(indices: &'a [u32]) -> Self {
        Self::U32(indices)
    }
}
