//! # RedLilium Geometry
//!
//! CPU-side packing of vertex attributes and indices into byte buffers
//! ready for upload to a graphics device.
//!
//! Attributes are written as logical values ([`math::Vec3`] and friends) or
//! already-encoded bytes, stored interleaved according to a
//! [`VertexLayout`](mesh::VertexLayout), and read back lazily.

pub mod error;
pub mod math;
pub mod mesh;

pub use error::{MeshError, MeshResult, ShapeMismatch};

/// Geometry library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
