//! Error types for vertex and index buffer packing.

use thiserror::Error;

use crate::mesh::{Arity, AttributeFormat, VertexAttributeSemantic};

/// Errors raised by attribute buffers and meshes.
///
/// All of these are programmer or data errors; none is transient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("unused attribute buffers hold exactly one attribute, got {count}")]
    InvalidUnusedBuffer { count: usize },
    #[error("attribute `{0}` is declared more than once in the same attribute buffer")]
    DuplicateAttribute(VertexAttributeSemantic),
    #[error("attribute type `{0}` not found in this attribute buffer")]
    AttributeNotFound(VertexAttributeSemantic),
    #[error(
        "mesh does not contain an attribute with the specified type `{semantic}`; {}",
        missing_attribute_hint(.has_vertex_state)
    )]
    MissingAttribute {
        semantic: VertexAttributeSemantic,
        has_vertex_state: bool,
    },
    #[error("{0}")]
    ShapeMismatch(Box<ShapeMismatch>),
    #[error("attribute format {0} is not yet implemented")]
    NotImplemented(AttributeFormat),
    #[error("unknown attribute format {0}")]
    UnknownFormat(u32),
    #[error("component count must be between 1 and 4, got {0}")]
    InvalidComponentCount(u32),
    #[error(
        "index data must be raw bytes, a 16-bit or 32-bit view, or a list of indices; \
         got a view with {element_size}-byte elements"
    )]
    InvalidIndexData { element_size: usize },
    #[error("invalid index format: no index format is set")]
    InvalidIndexFormat,
    #[error("data needs {required} bytes but the buffer holds {available}")]
    DataOutOfRange { required: usize, available: usize },
    #[error(
        "unused attribute `{semantic}` stores `{existing_arity}` {existing_format} values, \
         but `{requested_arity}` {requested_format} was requested; \
         remove the unused buffer first to change its shape"
    )]
    UnusedAttributeMismatch {
        semantic: VertexAttributeSemantic,
        existing_format: AttributeFormat,
        existing_arity: Arity,
        requested_format: AttributeFormat,
        requested_arity: Arity,
    },
    #[error("invalid vertex layout: {0}")]
    InvalidLayout(String),
}

/// Result alias used throughout the crate.
pub type MeshResult<T> = Result<T, MeshError>;

fn missing_attribute_hint(has_vertex_state: &bool) -> &'static str {
    if *has_vertex_state {
        "add it to the vertex state or call `set_vertex_data` for it first"
    } else {
        "install a vertex state that declares it or call `set_vertex_data` for it first"
    }
}

/// Diagnostic for logical vertex data whose shape disagrees with the
/// attribute's component count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    /// Attribute that was written.
    pub semantic: VertexAttributeSemantic,
    /// Shape the attribute descriptor declares.
    pub expected: Arity,
    /// Shape of the supplied values.
    pub received: Arity,
    /// Whether the target buffer is an ad hoc unused buffer.
    pub unused: bool,
    /// Suggested fixes, at most three.
    pub remediations: Vec<String>,
}

impl ShapeMismatch {
    pub(crate) fn new(
        semantic: VertexAttributeSemantic,
        expected: Arity,
        received: Arity,
        unused: bool,
        mesh_has_vertex_state: bool,
    ) -> Self {
        let detected = received.component_count();
        let mut remediations = Vec::with_capacity(3);
        if unused {
            remediations.push(format!(
                "set `unused_component_count` of `{semantic}` to {detected}"
            ));
        } else {
            remediations.push(format!(
                "set the component count of `{semantic}` to {detected} in the vertex state"
            ));
        }
        remediations.push(format!("provide a `{expected}` array"));
        if unused {
            if mesh_has_vertex_state {
                remediations.push(format!(
                    "add an attribute for `{semantic}` to the vertex state"
                ));
            } else {
                remediations.push(format!(
                    "install a vertex state with an attribute for `{semantic}`"
                ));
            }
        }

        Self {
            semantic,
            expected,
            received,
            unused,
            remediations,
        }
    }
}

impl std::fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.unused {
            "an unused attribute buffer"
        } else {
            "a vertex state attribute buffer"
        };
        write!(
            f,
            "attribute `{}` in {} expects `{}` values but received `{}` values",
            self.semantic, mode, self.expected, self.received
        )?;
        if !self.remediations.is_empty() {
            write!(f, "; possible fixes: {}", self.remediations.join("; "))?;
        }
        Ok(())
    }
}

impl From<ShapeMismatch> for MeshError {
    fn from(mismatch: ShapeMismatch) -> Self {
        Self::ShapeMismatch(Box::new(mismatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_schema_mode_has_two_fixes() {
        let mismatch = ShapeMismatch::new(
            VertexAttributeSemantic::Normal,
            Arity::Vec3,
            Arity::Vec2,
            false,
            true,
        );
        assert_eq!(mismatch.remediations.len(), 2);
        assert_eq!(
            mismatch.to_string(),
            "attribute `Normal` in a vertex state attribute buffer expects `Vec3` values \
             but received `Vec2` values; possible fixes: set the component count of \
             `Normal` to 2 in the vertex state; provide a `Vec3` array"
        );
    }

    #[test]
    fn test_shape_mismatch_unused_mode_with_vertex_state() {
        let mismatch = ShapeMismatch::new(
            VertexAttributeSemantic::Color,
            Arity::Vec4,
            Arity::Scalar,
            true,
            true,
        );
        assert_eq!(
            mismatch.remediations,
            vec![
                "set `unused_component_count` of `Color` to 1".to_string(),
                "provide a `Vec4` array".to_string(),
                "add an attribute for `Color` to the vertex state".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_attribute_message() {
        let err = MeshError::MissingAttribute {
            semantic: VertexAttributeSemantic::TexCoord0,
            has_vertex_state: false,
        };
        assert_eq!(
            err.to_string(),
            "mesh does not contain an attribute with the specified type `TexCoord0`; \
             install a vertex state that declares it or call `set_vertex_data` for it first"
        );
    }
}
