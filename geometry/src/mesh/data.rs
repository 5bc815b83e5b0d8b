//! CPU-side mesh container.
//!
//! This module provides:
//! - [`Mesh`] - Attribute buffers, vertex count and index buffer of one mesh
//! - [`SetVertexDataOptions`] - Shape of ad hoc buffers created on write
//! - [`IndexIter`] - Lazy decoder over the index buffer

use std::sync::Arc;

use crate::error::{MeshError, MeshResult};

use super::attribute_buffer::{AttributeBuffer, VertexDataIter};
use super::format::{AttributeFormat, IndexFormat};
use super::layout::{Arity, VertexAttribute, VertexAttributeSemantic, VertexLayout};
use super::listeners::{ChangeListeners, ListenerId};
use super::values::{IndexData, VertexData, VertexValues};

/// Format of unused buffers when none is requested.
pub const DEFAULT_UNUSED_FORMAT: AttributeFormat = AttributeFormat::Float32;

/// Component count of unused buffers when none is requested.
pub const DEFAULT_UNUSED_COMPONENT_COUNT: u32 = 3;

/// Options for [`Mesh::set_vertex_data`].
///
/// Only consulted when the written attribute is not declared by the vertex
/// state and an unused buffer has to be created for it. Leaving a field
/// `None` uses the default (`FLOAT32`, 3 components) for a new buffer and
/// accepts whatever shape an existing unused buffer already has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetVertexDataOptions {
    /// Scalar format of a newly created unused buffer.
    pub unused_format: Option<AttributeFormat>,
    /// Component count (1-4) of a newly created unused buffer.
    pub unused_component_count: Option<u32>,
}

impl SetVertexDataOptions {
    /// Create options that use the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the format used for a new unused buffer.
    pub fn with_unused_format(mut self, format: AttributeFormat) -> Self {
        self.unused_format = Some(format);
        self
    }

    /// Set the component count used for a new unused buffer.
    pub fn with_unused_component_count(mut self, count: u32) -> Self {
        self.unused_component_count = Some(count);
        self
    }

    fn unused_shape(&self) -> MeshResult<(AttributeFormat, Arity)> {
        let format = self.unused_format.unwrap_or(DEFAULT_UNUSED_FORMAT);
        let arity = Arity::from_component_count(
            self.unused_component_count
                .unwrap_or(DEFAULT_UNUSED_COMPONENT_COUNT),
        )?;
        Ok((format, arity))
    }

    /// Fail if explicitly requested settings disagree with an existing buffer.
    fn check_existing(
        &self,
        semantic: VertexAttributeSemantic,
        existing: &VertexAttribute,
    ) -> MeshResult<()> {
        let requested_format = self.unused_format.unwrap_or(existing.format);
        let requested_arity = match self.unused_component_count {
            Some(count) => Arity::from_component_count(count)?,
            None => existing.arity,
        };
        if requested_format != existing.format || requested_arity != existing.arity {
            return Err(MeshError::UnusedAttributeMismatch {
                semantic,
                existing_format: existing.format,
                existing_arity: existing.arity,
                requested_format,
                requested_arity,
            });
        }
        Ok(())
    }
}

/// A CPU-side mesh holding packed vertex and index data.
///
/// Vertex data lives in one [`AttributeBuffer`] per buffer slot of the
/// installed vertex state, plus one *unused* buffer per attribute written
/// without being declared by the vertex state. Every buffer is sized to
/// [`vertex_count`](Self::vertex_count) vertices.
///
/// # Example
///
/// ```
/// use redlilium_geometry::math::Vec3;
/// use redlilium_geometry::mesh::{Mesh, SetVertexDataOptions, VertexAttributeSemantic, VertexLayout};
///
/// let mut mesh = Mesh::new();
/// mesh.set_vertex_count(3);
/// let positions = [Vec3::zeros(), Vec3::x(), Vec3::y()];
/// mesh.set_vertex_data(
///     VertexAttributeSemantic::Position,
///     &positions,
///     SetVertexDataOptions::default(),
/// )?;
/// mesh.set_index_data(&[0u16, 1, 2][..])?;
///
/// // Move the data into an interleaved layout.
/// mesh.set_vertex_state(Some(VertexLayout::position_normal()))?;
/// assert_eq!(mesh.buffers()[0].byte_len(), 3 * 24);
/// assert!(mesh.unused_buffers().is_empty());
/// # Ok::<(), redlilium_geometry::MeshError>(())
/// ```
pub struct Mesh {
    vertex_state: Option<Arc<VertexLayout>>,
    buffers: Vec<AttributeBuffer>,
    unused_buffers: Vec<AttributeBuffer>,
    vertex_count: u32,
    index_format: Option<IndexFormat>,
    index_bytes: Vec<u8>,
    index_listeners: ChangeListeners,
    label: Option<String>,
}

impl Mesh {
    /// Create an empty mesh with no vertex state and `Uint16` indices.
    pub fn new() -> Self {
        Self {
            vertex_state: None,
            buffers: Vec::new(),
            unused_buffers: Vec::new(),
            vertex_count: 0,
            index_format: Some(IndexFormat::Uint16),
            index_bytes: Vec::new(),
            index_listeners: ChangeListeners::new(),
            label: None,
        }
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the installed vertex state.
    pub fn vertex_state(&self) -> Option<&Arc<VertexLayout>> {
        self.vertex_state.as_ref()
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Buffers backing the vertex state, one per buffer slot.
    pub fn buffers(&self) -> &[AttributeBuffer] {
        &self.buffers
    }

    /// Mutable access to the vertex state buffers, e.g. to register listeners.
    pub fn buffers_mut(&mut self) -> &mut [AttributeBuffer] {
        &mut self.buffers
    }

    /// Ad hoc buffers for attributes outside the vertex state.
    pub fn unused_buffers(&self) -> &[AttributeBuffer] {
        &self.unused_buffers
    }

    /// Get the unused buffer holding `semantic`.
    pub fn unused_buffer(&self, semantic: VertexAttributeSemantic) -> Option<&AttributeBuffer> {
        self.unused_buffers
            .iter()
            .find(|buffer| buffer.has_attribute(semantic))
    }

    /// Drop the unused buffer holding `semantic` and return it.
    pub fn remove_unused_buffer(
        &mut self,
        semantic: VertexAttributeSemantic,
    ) -> Option<AttributeBuffer> {
        let index = self
            .unused_buffers
            .iter()
            .position(|buffer| buffer.has_attribute(semantic))?;
        Some(self.unused_buffers.remove(index))
    }

    /// Get the buffer holding `semantic`, vertex state buffers first.
    pub fn attribute_buffer(&self, semantic: VertexAttributeSemantic) -> Option<&AttributeBuffer> {
        self.buffers
            .iter()
            .chain(&self.unused_buffers)
            .find(|buffer| buffer.has_attribute(semantic))
    }

    /// Get the buffer holding `semantic` mutably, vertex state buffers first.
    pub fn attribute_buffer_mut(
        &mut self,
        semantic: VertexAttributeSemantic,
    ) -> Option<&mut AttributeBuffer> {
        self.buffers
            .iter_mut()
            .chain(&mut self.unused_buffers)
            .find(|buffer| buffer.has_attribute(semantic))
    }

    /// Check if any buffer holds `semantic`.
    pub fn has_attribute(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attribute_buffer(semantic).is_some()
    }

    /// Resize every buffer to `vertex_count` vertices.
    pub fn set_vertex_count(&mut self, vertex_count: u32) {
        self.vertex_count = vertex_count;
        for buffer in self.buffers.iter_mut().chain(&mut self.unused_buffers) {
            buffer.set_vertex_count(vertex_count);
        }
    }

    /// Write vertex data for one attribute.
    ///
    /// Writes go to the vertex state buffer declaring `semantic`. Otherwise an
    /// unused buffer is reused, or created with the shape from `options` and
    /// sized to the vertex count. A buffer created by a failing call is
    /// discarded again.
    pub fn set_vertex_data<'a>(
        &mut self,
        semantic: VertexAttributeSemantic,
        data: impl Into<VertexData<'a>>,
        options: SetVertexDataOptions,
    ) -> MeshResult<()> {
        let data = data.into();
        let has_vertex_state = self.vertex_state.is_some();

        if let Some(buffer) = self
            .buffers
            .iter_mut()
            .find(|buffer| buffer.has_attribute(semantic))
        {
            return buffer.set_vertex_data(semantic, data, has_vertex_state);
        }

        let existing = self
            .unused_buffers
            .iter()
            .position(|buffer| buffer.has_attribute(semantic));
        let (index, created) = match existing {
            Some(index) => {
                if let Some(attribute) = self.unused_buffers[index].attribute(semantic) {
                    options.check_existing(semantic, attribute)?;
                }
                (index, false)
            }
            None => {
                let (format, arity) = options.unused_shape()?;
                let mut buffer =
                    AttributeBuffer::unused(VertexAttribute::new(semantic, format, arity, 0, 0));
                buffer.set_vertex_count(self.vertex_count);
                log::debug!(
                    "Created unused attribute buffer for {semantic} ({arity} {format}, {} vertices)",
                    self.vertex_count
                );
                self.unused_buffers.push(buffer);
                (self.unused_buffers.len() - 1, true)
            }
        };

        let result = self.unused_buffers[index].set_vertex_data(semantic, data, has_vertex_state);
        if result.is_err() && created {
            self.unused_buffers.remove(index);
        }
        result
    }

    /// Lazily decode every vertex's value of one attribute.
    pub fn vertex_data(&self, semantic: VertexAttributeSemantic) -> MeshResult<VertexDataIter<'_>> {
        self.attribute_buffer(semantic)
            .ok_or(MeshError::MissingAttribute {
                semantic,
                has_vertex_state: self.vertex_state.is_some(),
            })?
            .vertex_data(semantic)
    }

    /// Decode every value of one attribute into an owned array.
    pub fn vertex_values(&self, semantic: VertexAttributeSemantic) -> MeshResult<VertexValues> {
        let iter = self.vertex_data(semantic)?;
        Ok(VertexValues::collect_from(iter.arity(), iter))
    }

    /// Install a new vertex state and migrate existing data into it.
    ///
    /// Every attribute is decoded from the old buffers and re-encoded into
    /// buffers built from the new layout, falling back to unused buffers for
    /// attributes the layout does not declare. `None` moves everything into
    /// unused buffers. Reserved slots are dropped.
    ///
    /// The mesh is left unchanged when any step fails.
    pub fn set_vertex_state(&mut self, vertex_state: Option<Arc<VertexLayout>>) -> MeshResult<()> {
        if let Some(layout) = &vertex_state {
            layout.validate()?;
        }

        let mut decoded = Vec::new();
        for buffer in self.buffers.iter().chain(&self.unused_buffers) {
            for attribute in buffer.attributes() {
                let Some(semantic) = attribute.semantic else {
                    continue;
                };
                decoded.push((attribute.clone(), buffer.vertex_values(semantic)?));
            }
        }

        let mut buffers = Vec::new();
        if let Some(layout) = &vertex_state {
            for buffer_index in 0..layout.buffer_count() {
                let mut buffer = AttributeBuffer::from_layout(layout, buffer_index)?;
                buffer.set_vertex_count(self.vertex_count);
                buffers.push(buffer);
            }
        }

        let has_vertex_state = vertex_state.is_some();
        let mut unused_buffers = Vec::new();
        for (attribute, values) in &decoded {
            let Some(semantic) = attribute.semantic else {
                continue;
            };
            match buffers
                .iter_mut()
                .find(|buffer| buffer.has_attribute(semantic))
            {
                Some(buffer) => buffer.set_vertex_data(semantic, values.as_data(), has_vertex_state)?,
                None => {
                    let mut buffer = AttributeBuffer::unused(attribute.clone());
                    buffer.set_vertex_count(self.vertex_count);
                    buffer.set_vertex_data(semantic, values.as_data(), has_vertex_state)?;
                    unused_buffers.push(buffer);
                }
            }
        }

        log::debug!(
            "Migrated {} attributes into vertex state {:?} ({} buffers, {} unused)",
            decoded.len(),
            vertex_state.as_ref().and_then(|layout| layout.label.as_deref()),
            buffers.len(),
            unused_buffers.len()
        );

        self.vertex_state = vertex_state;
        self.buffers = buffers;
        self.unused_buffers = unused_buffers;
        Ok(())
    }

    /// Copy every named attribute of `source` into this mesh.
    ///
    /// Attributes missing from this mesh get an unused buffer with the
    /// source attribute's format and arity. Reserved slots are skipped.
    ///
    /// Either every attribute is copied or, on error, the mesh is left
    /// untouched and no listener fires.
    pub fn copy_attribute_buffer_data(&mut self, source: &AttributeBuffer) -> MeshResult<()> {
        let mut staged = Vec::new();
        for attribute in source.attributes() {
            let Some(semantic) = attribute.semantic else {
                continue;
            };
            let options = SetVertexDataOptions::new()
                .with_unused_format(attribute.format)
                .with_unused_component_count(attribute.component_count());
            staged.push((semantic, source.vertex_values(semantic)?, options));
        }

        // Dry run on a listener-free copy; writes are deterministic, so the
        // real pass below cannot fail once this one succeeds.
        let mut scratch = self.clone();
        for (semantic, values, options) in &staged {
            scratch.set_vertex_data(*semantic, values, *options)?;
        }

        for (semantic, values, options) in &staged {
            self.set_vertex_data(*semantic, values, *options)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Indices
    // ------------------------------------------------------------------------

    /// Get the index format. `None` means no format is set.
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }

    /// Raw index bytes, ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        &self.index_bytes
    }

    /// Number of indices fitting the index buffer under the current format.
    pub fn index_count(&self) -> usize {
        self.index_format
            .map_or(0, |format| self.index_bytes.len() / format.size())
    }

    /// Check if this mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_count() > 0
    }

    /// Change the index format, converting existing indices.
    ///
    /// Narrowing to `Uint16` keeps the low 16 bits of larger indices.
    /// Clearing the format fails while index data exists.
    pub fn set_index_format(&mut self, index_format: Option<IndexFormat>) -> MeshResult<()> {
        if index_format == self.index_format {
            return Ok(());
        }
        if self.index_bytes.is_empty() {
            self.index_format = index_format;
            return Ok(());
        }
        let (Some(from), Some(to)) = (self.index_format, index_format) else {
            return Err(MeshError::InvalidIndexFormat);
        };

        let indices = IndexIter::new(&self.index_bytes, from);
        let mut bytes = Vec::with_capacity(indices.len() * to.size());
        let truncated = encode_indices(&mut bytes, to, indices);
        if truncated > 0 {
            log::warn!("Narrowing indices to {to:?} truncated {truncated} values");
        }

        self.index_bytes = bytes;
        self.index_format = index_format;
        self.index_listeners.notify();
        Ok(())
    }

    /// Replace the index data.
    ///
    /// Raw bytes and logical values use the current format. Typed views set
    /// the format from their element width.
    pub fn set_index_data<'a>(&mut self, data: impl Into<IndexData<'a>>) -> MeshResult<()> {
        let (bytes, format) = match data.into() {
            IndexData::Raw(bytes) => {
                let format = self.index_format.ok_or(MeshError::InvalidIndexFormat)?;
                (bytes.to_vec(), format)
            }
            IndexData::U16(indices) => (
                bytemuck::cast_slice(indices).to_vec(),
                IndexFormat::Uint16,
            ),
            IndexData::U32(indices) => (
                bytemuck::cast_slice(indices).to_vec(),
                IndexFormat::Uint32,
            ),
            IndexData::Typed {
                bytes,
                element_size,
            } => {
                let format = IndexFormat::from_element_size(element_size)
                    .ok_or(MeshError::InvalidIndexData { element_size })?;
                (bytes.to_vec(), format)
            }
            IndexData::Values(indices) => {
                let format = self.index_format.ok_or(MeshError::InvalidIndexFormat)?;
                let mut bytes = Vec::with_capacity(indices.len() * format.size());
                let truncated = encode_indices(&mut bytes, format, indices.iter().copied());
                if truncated > 0 {
                    log::warn!("{truncated} indices exceed {format:?} and were truncated");
                }
                (bytes, format)
            }
        };

        log::trace!("Set {} index bytes ({format:?})", bytes.len());
        self.index_bytes = bytes;
        self.index_format = Some(format);
        self.index_listeners.notify();
        Ok(())
    }

    /// Lazily decode every index.
    pub fn index_data(&self) -> MeshResult<IndexIter<'_>> {
        let format = self.index_format.ok_or(MeshError::InvalidIndexFormat)?;
        Ok(IndexIter::new(&self.index_bytes, format))
    }

    /// Register a callback fired after every index buffer change.
    pub fn on_index_buffer_change(&mut self, listener: impl FnMut() + Send + 'static) -> ListenerId {
        self.index_listeners.add(listener)
    }

    /// Unregister an index buffer callback.
    pub fn remove_on_index_buffer_change(&mut self, id: ListenerId) -> bool {
        self.index_listeners.remove(id)
    }
}

/// Append `indices` in `format`, returning how many did not fit.
fn encode_indices(out: &mut Vec<u8>, format: IndexFormat, indices: impl Iterator<Item = u32>) -> usize {
    let max = format.max_index();
    let mut truncated = 0;
    for index in indices {
        if index > max {
            truncated += 1;
        }
        format.write(out, index);
    }
    truncated
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy sharing only the vertex state. Listeners are not copied.
impl Clone for Mesh {
    fn clone(&self) -> Self {
        Self {
            vertex_state: self.vertex_state.clone(),
            buffers: self.buffers.clone(),
            unused_buffers: self.unused_buffers.clone(),
            vertex_count: self.vertex_count,
            index_format: self.index_format,
            index_bytes: self.index_bytes.clone(),
            index_listeners: ChangeListeners::new(),
            label: self.label.clone(),
        }
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("label", &self.label)
            .field("vertex_count", &self.vertex_count)
            .field("buffer_count", &self.buffers.len())
            .field("unused_buffer_count", &self.unused_buffers.len())
            .field("index_format", &self.index_format)
            .field("index_count", &self.index_count())
            .field(
                "vertex_state",
                &self.vertex_state.as_ref().map(|layout| layout.label.as_deref()),
            )
            .finish()
    }
}

static_assertions::assert_impl_all!(Mesh: Send, Default, Clone);
static_assertions::assert_not_impl_any!(Mesh: Sync);

/// Lazy decoder over an index buffer.
#[derive(Debug, Clone)]
pub struct IndexIter<'a> {
    bytes: &'a [u8],
    format: IndexFormat,
    index: usize,
    count: usize,
}

impl<'a> IndexIter<'a> {
    fn new(bytes: &'a [u8], format: IndexFormat) -> Self {
        Self {
            bytes,
            format,
            index: 0,
            count: bytes.len() / format.size(),
        }
    }

    /// Format the indices are decoded from.
    pub fn format(&self) -> IndexFormat {
        self.format
    }
}

impl Iterator for IndexIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let value = self.format.read(self.bytes, self.index * self.format.size());
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndexIter<'_> {}

impl std::iter::FusedIterator for IndexIter<'_> {}
