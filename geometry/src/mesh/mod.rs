//! Vertex attribute and index buffer packing.
//!
//! This module provides GPU-agnostic mesh data structures:
//!
//! - [`AttributeFormat`] - Scalar storage formats and their [`FormatCodec`]s
//! - [`VertexLayout`] - The vertex state: attributes across multiple buffers
//! - [`AttributeBuffer`] - One interleaved byte buffer of vertex attributes
//! - [`Mesh`] - Attribute buffers, vertex count and index data of one mesh
//! - Generators for common shapes (sphere, quad)
//!
//! Byte buffers are exposed read-only for upload. Change listeners on
//! [`AttributeBuffer`] and [`Mesh`] report when a re-upload is needed.

mod attribute_buffer;
mod data;
mod format;
pub mod generators;
mod layout;
mod listeners;
mod values;

pub use attribute_buffer::{AttributeBuffer, VertexDataIter};
pub use data::{
    DEFAULT_UNUSED_COMPONENT_COUNT, DEFAULT_UNUSED_FORMAT, IndexIter, Mesh, SetVertexDataOptions,
};
pub use format::{AttributeFormat, FormatCodec, IndexFormat};
pub use layout::{
    Arity, VertexAttribute, VertexAttributeSemantic, VertexBufferLayout, VertexLayout,
    infer_stride,
};
pub use listeners::{ChangeListeners, ListenerId};
pub use values::{IndexData, VertexData, VertexValue, VertexValues};
