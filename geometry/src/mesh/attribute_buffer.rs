//! Interleaved attribute buffers.
//!
//! An [`AttributeBuffer`] owns one contiguous byte buffer holding one or
//! more interleaved vertex attributes. It packs logical values (numbers and
//! vectors) into that buffer through the attribute's [`FormatCodec`] and
//! decodes them back lazily through [`VertexDataIter`].
//!
//! The byte length is always `vertex_count * array_stride` after
//! [`set_vertex_count`](AttributeBuffer::set_vertex_count), which is the only
//! way to resize: a new zeroed allocation receives a byte-for-byte prefix of
//! the old one.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MeshError, MeshResult, ShapeMismatch};

use super::format::FormatCodec;
use super::layout::{Arity, VertexAttribute, VertexAttributeSemantic, VertexLayout, infer_stride};
use super::listeners::{ChangeListeners, ListenerId};
use super::values::{VertexData, VertexValue, VertexValues};

/// Source of buffer generations. Every allocation gets a fresh value, so a
/// generation identifies one byte buffer for the whole process lifetime.
fn next_generation() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Decode geometry derived from the current byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DecodeView {
    stride: usize,
    vertex_capacity: usize,
}

/// A byte buffer of interleaved vertex attributes.
///
/// # Example
///
/// ```
/// use redlilium_geometry::math::Vec3;
/// use redlilium_geometry::mesh::{AttributeBuffer, VertexAttribute, VertexAttributeSemantic};
///
/// let mut buffer = AttributeBuffer::new(
///     None,
///     vec![VertexAttribute::position(0), VertexAttribute::normal(12)],
///     false,
///     Vec::new(),
/// )?;
/// assert_eq!(buffer.array_stride(), 24);
///
/// buffer.set_vertex_count(2);
/// let normals = [Vec3::z(), Vec3::y()];
/// buffer.set_vertex_data(VertexAttributeSemantic::Normal, (&normals).into(), true)?;
///
/// let decoded: Vec<_> = buffer.vertex_data(VertexAttributeSemantic::Normal)?.collect();
/// assert_eq!(decoded.len(), 2);
/// # Ok::<(), redlilium_geometry::MeshError>(())
/// ```
pub struct AttributeBuffer {
    array_stride: u32,
    attributes: Vec<VertexAttribute>,
    is_unused: bool,
    buffer: Vec<u8>,
    generation: u64,
    view: Cell<Option<(u64, DecodeView)>>,
    listeners: ChangeListeners,
}

impl AttributeBuffer {
    /// Create an attribute buffer.
    ///
    /// A `None` stride is inferred from the attributes. Unused buffers must
    /// hold exactly one attribute, and no semantic may appear twice.
    pub fn new(
        array_stride: Option<u32>,
        attributes: Vec<VertexAttribute>,
        is_unused: bool,
        bytes: Vec<u8>,
    ) -> MeshResult<Self> {
        if is_unused && attributes.len() != 1 {
            return Err(MeshError::InvalidUnusedBuffer {
                count: attributes.len(),
            });
        }
        for (i, attr) in attributes.iter().enumerate() {
            if let Some(semantic) = attr.semantic
                && attributes[..i].iter().any(|a| a.semantic == Some(semantic))
            {
                return Err(MeshError::DuplicateAttribute(semantic));
            }
        }

        let array_stride = array_stride.unwrap_or_else(|| infer_stride(&attributes));
        Ok(Self {
            array_stride,
            attributes,
            is_unused,
            buffer: bytes,
            generation: next_generation(),
            view: Cell::new(None),
            listeners: ChangeListeners::new(),
        })
    }

    /// Create an unused buffer holding a single ad hoc attribute.
    ///
    /// The attribute is placed at offset 0 with a tight stride.
    pub fn unused(attribute: VertexAttribute) -> Self {
        let attribute = VertexAttribute {
            offset: 0,
            buffer_index: 0,
            ..attribute
        };
        Self {
            array_stride: attribute.byte_size() as u32,
            attributes: vec![attribute],
            is_unused: true,
            buffer: Vec::new(),
            generation: next_generation(),
            view: Cell::new(None),
            listeners: ChangeListeners::new(),
        }
    }

    /// Create an empty buffer for slot `buffer_index` of a vertex layout.
    pub fn from_layout(layout: &VertexLayout, buffer_index: usize) -> MeshResult<Self> {
        let stride = layout.buffer(buffer_index).and_then(|b| b.stride);
        let attributes = layout
            .attributes_for_buffer(buffer_index as u32)
            .cloned()
            .collect();
        Self::new(stride, attributes, false, Vec::new())
    }

    /// Bytes consumed per vertex.
    pub fn array_stride(&self) -> u32 {
        self.array_stride
    }

    /// Set the stride verbatim, or infer the tightest one with `None`.
    ///
    /// An explicit stride may exceed the attributes' extent to declare
    /// padding. The byte buffer is not touched; call
    /// [`set_vertex_count`](Self::set_vertex_count) to reallocate.
    pub fn set_array_stride(&mut self, array_stride: Option<u32>) {
        self.array_stride = array_stride.unwrap_or_else(|| infer_stride(&self.attributes));
        self.view.set(None);
    }

    /// Attribute descriptors stored in this buffer.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Get the descriptor for a semantic.
    pub fn attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.semantic == Some(semantic))
    }

    /// Check if this buffer stores `semantic`.
    pub fn has_attribute(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attribute(semantic).is_some()
    }

    /// Whether this is an ad hoc buffer for an attribute outside the vertex state.
    pub fn is_unused(&self) -> bool {
        self.is_unused
    }

    /// Raw bytes, ready for upload.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the byte buffer length.
    pub fn byte_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of whole vertices that fit in the byte buffer.
    pub fn vertex_capacity(&self) -> usize {
        self.decode_view().vertex_capacity
    }

    /// Identifier of the current byte allocation.
    ///
    /// Changes whenever the buffer is replaced (resize or clone) and stays
    /// the same across in-place writes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn decode_view(&self) -> DecodeView {
        if let Some((generation, view)) = self.view.get()
            && generation == self.generation
        {
            return view;
        }
        let stride = self.array_stride as usize;
        let vertex_capacity = if stride == 0 {
            0
        } else {
            self.buffer.len() / stride
        };
        let view = DecodeView {
            stride,
            vertex_capacity,
        };
        self.view.set(Some((self.generation, view)));
        view
    }

    /// Resize to `vertex_count` vertices.
    ///
    /// Allocates `vertex_count * array_stride` zeroed bytes and copies the
    /// common prefix of the old buffer. Growing keeps every old vertex,
    /// shrinking drops trailing ones.
    pub fn set_vertex_count(&mut self, vertex_count: u32) {
        let new_len = vertex_count as usize * self.array_stride as usize;
        let mut bytes = vec![0u8; new_len];
        let kept = new_len.min(self.buffer.len());
        bytes[..kept].copy_from_slice(&self.buffer[..kept]);

        log::trace!(
            "Resizing attribute buffer {} -> {} bytes (stride {})",
            self.buffer.len(),
            new_len,
            self.array_stride
        );

        self.buffer = bytes;
        self.generation = next_generation();
        self.listeners.notify();
    }

    /// Write vertex data for one attribute.
    ///
    /// Encoded bytes are copied verbatim from byte 0. Logical arrays are
    /// encoded per vertex and must match the attribute's arity; an empty
    /// array does nothing. `mesh_has_vertex_state` only selects the wording
    /// of a shape-mismatch diagnostic.
    ///
    /// Listeners fire once after a successful non-empty write.
    pub fn set_vertex_data(
        &mut self,
        semantic: VertexAttributeSemantic,
        data: VertexData<'_>,
        mesh_has_vertex_state: bool,
    ) -> MeshResult<()> {
        let attribute = self
            .attribute(semantic)
            .cloned()
            .ok_or(MeshError::AttributeNotFound(semantic))?;

        match data {
            VertexData::Raw(bytes) => self.write_bytes(bytes)?,
            VertexData::View { bytes, offset, len } => {
                let window = offset
                    .checked_add(len)
                    .and_then(|end| bytes.get(offset..end))
                    .ok_or(MeshError::DataOutOfRange {
                        required: offset.saturating_add(len),
                        available: bytes.len(),
                    })?;
                self.write_bytes(window)?;
            }
            logical => {
                if logical.is_empty() {
                    return Ok(());
                }
                let received = logical.arity().unwrap_or(Arity::Scalar);
                if received != attribute.arity {
                    return Err(ShapeMismatch::new(
                        semantic,
                        attribute.arity,
                        received,
                        self.is_unused,
                        mesh_has_vertex_state,
                    )
                    .into());
                }
                let codec = attribute.format.codec()?;
                self.check_capacity(&attribute, logical.len())?;

                match logical {
                    VertexData::Scalars(values) => {
                        self.encode(&attribute, codec, values.iter().map(|v| [*v]))
                    }
                    VertexData::Vec2(values) => {
                        self.encode(&attribute, codec, values.iter().map(|v| [v.x, v.y]))
                    }
                    VertexData::Vec3(values) => self.encode(
                        &attribute,
                        codec,
                        values.iter().map(|v| [v.x, v.y, v.z]),
                    ),
                    VertexData::Vec4(values) => self.encode(
                        &attribute,
                        codec,
                        values.iter().map(|v| [v.x, v.y, v.z, v.w]),
                    ),
                    VertexData::Raw(_) | VertexData::View { .. } => {}
                }
            }
        }

        log::trace!(
            "Wrote {} {} for attribute {}",
            data.len(),
            if data.arity().is_some() { "values" } else { "bytes" },
            semantic
        );
        self.listeners.notify();
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> MeshResult<()> {
        if bytes.len() > self.buffer.len() {
            return Err(MeshError::DataOutOfRange {
                required: bytes.len(),
                available: self.buffer.len(),
            });
        }
        self.buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn check_capacity(&self, attribute: &VertexAttribute, count: usize) -> MeshResult<()> {
        let required = (count - 1) * self.array_stride as usize + attribute.end();
        if required > self.buffer.len() {
            return Err(MeshError::DataOutOfRange {
                required,
                available: self.buffer.len(),
            });
        }
        Ok(())
    }

    fn encode<const N: usize>(
        &mut self,
        attribute: &VertexAttribute,
        codec: &dyn FormatCodec,
        values: impl Iterator<Item = [f32; N]>,
    ) {
        let stride = self.array_stride as usize;
        let component_size = attribute.format.byte_size();
        for (vertex, components) in values.enumerate() {
            let base = vertex * stride + attribute.offset as usize;
            for (i, value) in components.into_iter().enumerate() {
                codec.encode(&mut self.buffer, base + i * component_size, value);
            }
        }
    }

    /// Lazily decode every vertex's value of one attribute.
    ///
    /// Yields one value per vertex fitting in the byte buffer. The iterator
    /// is finite and can be restarted by cloning it or calling again.
    pub fn vertex_data(&self, semantic: VertexAttributeSemantic) -> MeshResult<VertexDataIter<'_>> {
        let attribute = self
            .attribute(semantic)
            .ok_or(MeshError::AttributeNotFound(semantic))?;
        let view = self.decode_view();

        // Guard against explicit strides narrower than the attribute.
        let end = attribute.end();
        let fitting = match self.buffer.len().checked_sub(end) {
            Some(_) if view.stride == 0 => 0,
            Some(rest) => rest / view.stride + 1,
            None => 0,
        };
        let count = view.vertex_capacity.min(fitting);

        // Nothing to decode needs no codec, so empty buffers in placeholder
        // formats still read back as empty.
        let codec = if count == 0 {
            None
        } else {
            Some(attribute.format.codec()?)
        };

        Ok(VertexDataIter {
            bytes: &self.buffer,
            codec,
            arity: attribute.arity,
            offset: attribute.offset as usize,
            stride: view.stride,
            component_size: attribute.format.byte_size(),
            index: 0,
            count,
        })
    }

    /// Decode every value of one attribute into an owned array.
    pub fn vertex_values(&self, semantic: VertexAttributeSemantic) -> MeshResult<VertexValues> {
        let iter = self.vertex_data(semantic)?;
        Ok(VertexValues::collect_from(iter.arity, iter))
    }

    /// Register a callback fired after every mutation.
    pub fn on_buffer_changed(&mut self, listener: impl FnMut() + Send + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a callback. Returns `false` if it was not registered.
    pub fn remove_on_buffer_changed(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Deep copy of descriptors, stride, mode and bytes. Listeners are not copied.
impl Clone for AttributeBuffer {
    fn clone(&self) -> Self {
        Self {
            array_stride: self.array_stride,
            attributes: self.attributes.clone(),
            is_unused: self.is_unused,
            buffer: self.buffer.clone(),
            generation: next_generation(),
            view: Cell::new(None),
            listeners: ChangeListeners::new(),
        }
    }
}

impl std::fmt::Debug for AttributeBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeBuffer")
            .field("array_stride", &self.array_stride)
            .field("attributes", &self.attributes)
            .field("is_unused", &self.is_unused)
            .field("byte_len", &self.buffer.len())
            .field("generation", &self.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(AttributeBuffer: Send);

/// Lazy decoder over one attribute of an [`AttributeBuffer`].
#[derive(Clone)]
pub struct VertexDataIter<'a> {
    bytes: &'a [u8],
    codec: Option<&'static dyn FormatCodec>,
    arity: Arity,
    offset: usize,
    stride: usize,
    component_size: usize,
    index: usize,
    count: usize,
}

impl VertexDataIter<'_> {
    /// Shape of the yielded values.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    fn decode(&self, codec: &dyn FormatCodec, vertex: usize) -> VertexValue {
        let base = vertex * self.stride + self.offset;
        let component = |i: usize| codec.decode(self.bytes, base + i * self.component_size);
        match self.arity {
            Arity::Scalar => VertexValue::Scalar(component(0)),
            Arity::Vec2 => VertexValue::Vec2([component(0), component(1)].into()),
            Arity::Vec3 => VertexValue::Vec3([component(0), component(1), component(2)].into()),
            Arity::Vec4 => VertexValue::Vec4(
                [component(0), component(1), component(2), component(3)].into(),
            ),
        }
    }
}

impl Iterator for VertexDataIter<'_> {
    type Item = VertexValue;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let value = self.decode(self.codec?, self.index);
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.index = self.index.saturating_add(n).min(self.count);
        self.next()
    }
}

impl ExactSizeIterator for VertexDataIter<'_> {}

impl std::iter::FusedIterator for VertexDataIter<'_> {}
