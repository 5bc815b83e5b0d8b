//! Vertex layout definitions for meshes.
//!
//! A [`VertexLayout`] (the mesh's *vertex state*) describes how attributes
//! are interleaved across one or more vertex buffers. Each buffer has an
//! explicit stride or one inferred from its attributes, and each attribute
//! names its semantic, scalar [`AttributeFormat`], [`Arity`], byte offset and
//! the buffer slot it lives in.
//!
//! Layouts are shared via `Arc` since there are typically only a few
//! combinations across many meshes. A mesh reads its layout once per
//! `Mesh::set_vertex_state` call; editing a layout afterwards has no effect
//! until it is installed again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use redlilium_geometry::mesh::{VertexAttribute, VertexBufferLayout, VertexLayout};
//!
//! // Buffer 0: static texcoords, buffer 1: dynamic position + normal.
//! let layout = Arc::new(
//!     VertexLayout::new()
//!         .with_buffer(VertexBufferLayout::new(8))
//!         .with_buffer(VertexBufferLayout::inferred())
//!         .with_attribute(VertexAttribute::texcoord0(0).at_buffer(0))
//!         .with_attribute(VertexAttribute::position(0).at_buffer(1))
//!         .with_attribute(VertexAttribute::normal(12).at_buffer(1)),
//! );
//! assert_eq!(layout.buffer_stride(1), 24);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{MeshError, MeshResult};

use super::format::AttributeFormat;

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexAttributeSemantic {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Vertex tangent (w = handedness).
    Tangent,
    /// Vertex bitangent.
    Bitangent,
    /// Texture coordinates set 0.
    TexCoord0,
    /// Texture coordinates set 1.
    TexCoord1,
    /// Vertex color.
    Color,
    /// Bone indices for skinning.
    Joints,
    /// Bone weights for skinning.
    Weights,
    /// User-defined attribute identified by index.
    Custom(u32),
}

impl std::fmt::Display for VertexAttributeSemantic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Number of components of a logical attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arity {
    /// One plain number per vertex.
    Scalar,
    /// `x, y`.
    Vec2,
    /// `x, y, z`.
    Vec3,
    /// `x, y, z, w`.
    Vec4,
}

impl Arity {
    /// Map a component count (1-4) to an arity.
    pub fn from_component_count(count: u32) -> MeshResult<Self> {
        match count {
            1 => Ok(Self::Scalar),
            2 => Ok(Self::Vec2),
            3 => Ok(Self::Vec3),
            4 => Ok(Self::Vec4),
            other => Err(MeshError::InvalidComponentCount(other)),
        }
    }

    /// Number of scalar components.
    pub fn component_count(&self) -> u32 {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Scalar => "Number",
            Self::Vec2 => "Vec2",
            Self::Vec3 => "Vec3",
            Self::Vec4 => "Vec4",
        };
        f.write_str(name)
    }
}

/// Describes a single vertex buffer binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexBufferLayout {
    /// Stride in bytes between consecutive elements. `None` infers the
    /// tightest stride from the buffer's attributes.
    pub stride: Option<u32>,
}

impl VertexBufferLayout {
    /// Create a new vertex buffer layout with an explicit stride.
    ///
    /// The stride may exceed the attributes' extent to declare padding.
    pub fn new(stride: u32) -> Self {
        Self {
            stride: Some(stride),
        }
    }

    /// Create a vertex buffer layout whose stride is inferred.
    pub fn inferred() -> Self {
        Self { stride: None }
    }
}

/// A single vertex attribute description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexAttribute {
    /// Semantic meaning of this attribute. `None` marks a reserved slot
    /// with no meaning of its own.
    pub semantic: Option<VertexAttributeSemantic>,
    /// Scalar storage format of each component.
    pub format: AttributeFormat,
    /// Number of components per vertex.
    pub arity: Arity,
    /// Byte offset within one stride.
    pub offset: u32,
    /// Index of the vertex buffer this attribute reads from.
    pub buffer_index: u32,
}

impl VertexAttribute {
    /// Create a new vertex attribute.
    pub fn new(
        semantic: VertexAttributeSemantic,
        format: AttributeFormat,
        arity: Arity,
        offset: u32,
        buffer_index: u32,
    ) -> Self {
        Self {
            semantic: Some(semantic),
            format,
            arity,
            offset,
            buffer_index,
        }
    }

    /// Create a reserved slot at buffer 0.
    pub fn reserved(format: AttributeFormat, arity: Arity, offset: u32) -> Self {
        Self {
            semantic: None,
            format,
            arity,
            offset,
            buffer_index: 0,
        }
    }

    /// Create a position attribute (float32 x3) at buffer 0.
    pub fn position(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::Position, Arity::Vec3, offset)
    }

    /// Create a normal attribute (float32 x3) at buffer 0.
    pub fn normal(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::Normal, Arity::Vec3, offset)
    }

    /// Create a tangent attribute (float32 x4) at buffer 0.
    pub fn tangent(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::Tangent, Arity::Vec4, offset)
    }

    /// Create a bitangent attribute (float32 x3) at buffer 0.
    pub fn bitangent(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::Bitangent, Arity::Vec3, offset)
    }

    /// Create a texcoord0 attribute (float32 x2) at buffer 0.
    pub fn texcoord0(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::TexCoord0, Arity::Vec2, offset)
    }

    /// Create a texcoord1 attribute (float32 x2) at buffer 0.
    pub fn texcoord1(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::TexCoord1, Arity::Vec2, offset)
    }

    /// Create a color attribute (float32 x4) at buffer 0.
    pub fn color(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::Color, Arity::Vec4, offset)
    }

    /// Create a joints attribute (int16 x4) at buffer 0.
    pub fn joints(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Joints,
            AttributeFormat::Int16,
            Arity::Vec4,
            offset,
            0,
        )
    }

    /// Create a weights attribute (float32 x4) at buffer 0.
    pub fn weights(offset: u32) -> Self {
        Self::float32(VertexAttributeSemantic::Weights, Arity::Vec4, offset)
    }

    fn float32(semantic: VertexAttributeSemantic, arity: Arity, offset: u32) -> Self {
        Self::new(semantic, AttributeFormat::Float32, arity, offset, 0)
    }

    /// Set the buffer index for this attribute.
    pub fn at_buffer(mut self, buffer_index: u32) -> Self {
        self.buffer_index = buffer_index;
        self
    }

    /// Number of scalar components.
    pub fn component_count(&self) -> u32 {
        self.arity.component_count()
    }

    /// Bytes occupied by one vertex's value of this attribute.
    pub fn byte_size(&self) -> usize {
        self.format.byte_size() * self.arity.component_count() as usize
    }

    /// First byte past this attribute within a stride.
    pub fn end(&self) -> usize {
        self.offset as usize + self.byte_size()
    }
}

/// Smallest stride that fits every attribute: `max(offset + size)`.
pub fn infer_stride<'a>(attributes: impl IntoIterator<Item = &'a VertexAttribute>) -> u32 {
    attributes
        .into_iter()
        .map(|attr| attr.end() as u32)
        .max()
        .unwrap_or(0)
}

/// Describes the layout of vertex data across one or more buffers.
///
/// # Single Buffer Example
///
/// ```
/// use std::sync::Arc;
/// use redlilium_geometry::mesh::{VertexAttribute, VertexBufferLayout, VertexLayout};
///
/// let layout = Arc::new(VertexLayout::new()
///     .with_buffer(VertexBufferLayout::new(32))
///     .with_attribute(VertexAttribute::position(0))
///     .with_attribute(VertexAttribute::normal(12))
///     .with_attribute(VertexAttribute::texcoord0(24)));
/// assert!(layout.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexLayout {
    /// Descriptions of each vertex buffer binding.
    pub buffers: Vec<VertexBufferLayout>,
    /// The vertex attributes, each referencing a buffer by index.
    pub attributes: Vec<VertexAttribute>,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl VertexLayout {
    /// Create a new empty vertex layout.
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            attributes: Vec::new(),
            label: None,
        }
    }

    /// Add a vertex buffer binding.
    pub fn with_buffer(mut self, buffer: VertexBufferLayout) -> Self {
        self.buffers.push(buffer);
        self
    }

    /// Add a vertex attribute.
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of vertex buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Get a buffer layout by index.
    pub fn buffer(&self, index: usize) -> Option<&VertexBufferLayout> {
        self.buffers.get(index)
    }

    /// Get the stride for a specific buffer, inferring it when not explicit.
    pub fn buffer_stride(&self, buffer_index: usize) -> u32 {
        match self.buffers.get(buffer_index) {
            Some(VertexBufferLayout {
                stride: Some(stride),
            }) => *stride,
            Some(_) => self.inferred_stride(buffer_index),
            None => 0,
        }
    }

    /// Get the tightest stride for a buffer's attributes.
    pub fn inferred_stride(&self, buffer_index: usize) -> u32 {
        infer_stride(self.attributes_for_buffer(buffer_index as u32))
    }

    /// Check if this layout has a specific semantic.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes
            .iter()
            .any(|attr| attr.semantic == Some(semantic))
    }

    /// Get all attributes for a specific buffer.
    pub fn attributes_for_buffer(
        &self,
        buffer_index: u32,
    ) -> impl Iterator<Item = &VertexAttribute> {
        self.attributes
            .iter()
            .filter(move |attr| attr.buffer_index == buffer_index)
    }

    /// Validate the layout.
    ///
    /// Every attribute must reference a defined buffer and each semantic may
    /// appear only once.
    pub fn validate(&self) -> MeshResult<()> {
        let mut seen = HashSet::new();
        for attr in &self.attributes {
            if attr.buffer_index as usize >= self.buffers.len() {
                return Err(MeshError::InvalidLayout(format!(
                    "attribute {:?} references buffer {} but only {} buffers defined",
                    attr.semantic,
                    attr.buffer_index,
                    self.buffers.len()
                )));
            }
            if let Some(semantic) = attr.semantic
                && !seen.insert(semantic)
            {
                return Err(MeshError::InvalidLayout(format!(
                    "attribute {semantic} is declared more than once"
                )));
            }
        }
        Ok(())
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Common Layouts
// ============================================================================

impl VertexLayout {
    /// Position-only layout (12 bytes per vertex, single buffer).
    pub fn position_only() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(12))
                .with_attribute(VertexAttribute::position(0))
                .with_label("position_only"),
        )
    }

    /// Position + normal layout (24 bytes per vertex, single buffer).
    pub fn position_normal() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(24))
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_label("position_normal"),
        )
    }

    /// Position + texcoord layout (20 bytes per vertex, single buffer).
    pub fn position_uv() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(20))
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::texcoord0(12))
                .with_label("position_uv"),
        )
    }

    /// Position + normal + texcoord layout (32 bytes per vertex, single buffer).
    pub fn position_normal_uv() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(32))
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::texcoord0(24))
                .with_label("position_normal_uv"),
        )
    }

    /// Full PBR layout: position + normal + tangent + texcoord (48 bytes, single buffer).
    pub fn pbr() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(48))
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::normal(12))
                .with_attribute(VertexAttribute::tangent(24))
                .with_attribute(VertexAttribute::texcoord0(40))
                .with_label("pbr"),
        )
    }

    /// Animated PBR layout with static, dynamic, and skinning buffers.
    ///
    /// - Buffer 0 (static, 8 bytes): texcoord
    /// - Buffer 1 (dynamic, 40 bytes): position, normal, tangent
    /// - Buffer 2 (static, 24 bytes): joints, weights
    pub fn animated_pbr() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(8))
                .with_buffer(VertexBufferLayout::new(40))
                .with_buffer(VertexBufferLayout::inferred())
                .with_attribute(VertexAttribute::texcoord0(0).at_buffer(0))
                .with_attribute(VertexAttribute::position(0).at_buffer(1))
                .with_attribute(VertexAttribute::normal(12).at_buffer(1))
                .with_attribute(VertexAttribute::tangent(24).at_buffer(1))
                .with_attribute(VertexAttribute::joints(0).at_buffer(2))
                .with_attribute(VertexAttribute::weights(8).at_buffer(2))
                .with_label("animated_pbr"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_component_counts() {
        for count in 1..=4 {
            let arity = Arity::from_component_count(count).unwrap();
            assert_eq!(arity.component_count(), count);
        }
        assert_eq!(
            Arity::from_component_count(5),
            Err(MeshError::InvalidComponentCount(5))
        );
        assert_eq!(Arity::Scalar.to_string(), "Number");
    }

    #[test]
    fn test_attribute_extent() {
        let normal = VertexAttribute::normal(12);
        assert_eq!(normal.byte_size(), 12);
        assert_eq!(normal.end(), 24);

        let joints = VertexAttribute::joints(4);
        assert_eq!(joints.byte_size(), 8);
        assert_eq!(joints.end(), 12);
    }

    #[test]
    fn test_infer_stride_uses_furthest_attribute() {
        // Declared out of order: the furthest end wins, not the last one.
        let attrs = [
            VertexAttribute::texcoord0(24),
            VertexAttribute::position(0),
            VertexAttribute::reserved(AttributeFormat::Int8, Arity::Vec4, 32),
        ];
        assert_eq!(infer_stride(&attrs), 36);
        assert_eq!(infer_stride(&[]), 0);
    }

    #[test]
    fn test_vertex_buffer_layout() {
        let buffer = VertexBufferLayout::new(32);
        assert_eq!(buffer.stride, Some(32));
        assert_eq!(VertexBufferLayout::inferred().stride, None);
    }

    #[test]
    fn test_vertex_layout_single_buffer() {
        let layout = VertexLayout::new()
            .with_buffer(VertexBufferLayout::new(24))
            .with_attribute(VertexAttribute::position(0))
            .with_attribute(VertexAttribute::normal(12));

        assert_eq!(layout.buffer_count(), 1);
        assert_eq!(layout.buffer_stride(0), 24);
        assert!(layout.has_semantic(VertexAttributeSemantic::Position));
        assert!(layout.has_semantic(VertexAttributeSemantic::Normal));
        assert!(!layout.has_semantic(VertexAttributeSemantic::TexCoord0));
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_vertex_layout_multi_buffer() {
        let layout = VertexLayout::animated_pbr();

        assert_eq!(layout.buffer_count(), 3);
        assert_eq!(layout.buffer_stride(0), 8);
        assert_eq!(layout.buffer_stride(1), 40);
        // Inferred: weights end at 8 + 16.
        assert_eq!(layout.buffer_stride(2), 24);
        assert!(layout.validate().is_ok());

        let buffer1_attrs: Vec<_> = layout.attributes_for_buffer(1).collect();
        assert_eq!(buffer1_attrs.len(), 3);
    }

    #[test]
    fn test_explicit_stride_keeps_padding() {
        let layout = VertexLayout::new()
            .with_buffer(VertexBufferLayout::new(16))
            .with_attribute(VertexAttribute::position(0));
        assert_eq!(layout.buffer_stride(0), 16);
        assert_eq!(layout.inferred_stride(0), 12);
    }

    #[test]
    fn test_vertex_layout_validation() {
        let invalid_buffer = VertexLayout::new()
            .with_buffer(VertexBufferLayout::new(12))
            .with_attribute(VertexAttribute::position(0).at_buffer(5));
        assert!(matches!(
            invalid_buffer.validate(),
            Err(MeshError::InvalidLayout(_))
        ));

        let duplicate = VertexLayout::new()
            .with_buffer(VertexBufferLayout::inferred())
            .with_buffer(VertexBufferLayout::inferred())
            .with_attribute(VertexAttribute::position(0).at_buffer(0))
            .with_attribute(VertexAttribute::position(0).at_buffer(1));
        assert!(duplicate.validate().is_err());

        // Reserved slots may repeat.
        let reserved = VertexLayout::new()
            .with_buffer(VertexBufferLayout::new(8))
            .with_attribute(VertexAttribute::reserved(AttributeFormat::Int8, Arity::Vec4, 0))
            .with_attribute(VertexAttribute::reserved(AttributeFormat::Int8, Arity::Vec4, 4));
        assert!(reserved.validate().is_ok());
    }

    #[test]
    fn test_common_layouts() {
        let pos_only = VertexLayout::position_only();
        assert_eq!(pos_only.buffer_count(), 1);
        assert_eq!(pos_only.buffer_stride(0), 12);

        let pbr = VertexLayout::pbr();
        assert_eq!(pbr.buffer_stride(0), 48);
        assert_eq!(pbr.attributes.len(), 4);
        assert!(pbr.has_semantic(VertexAttributeSemantic::Tangent));
    }
}
