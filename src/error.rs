//! Typed errors for OBJ import and buffer staging
//!
//! Import failures carry structured context (1-based line number, corner
//! position, offending attribute) so callers can branch on the error kind
//! instead of parsing a message.

use thiserror::Error;

use crate::gfx::mesh::MeshAttribute;

/// Fatal import failure. No mesh is registered when any of these occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A `v`/`vn`/`vt` line with missing or unparsable components, or a face
    /// corner whose index field is not an integer.
    #[error("line {line}: malformed attribute data")]
    MalformedLine { line: usize },

    /// A face corner without the mandatory vertex-index field.
    #[error("line {line}, corner {corner}: missing vertex index")]
    MissingVertexIndex { line: usize, corner: usize },

    /// A corner index that falls outside its attribute pool after 1-based to
    /// 0-based conversion. `index` is the 1-based value as written.
    #[error("line {line}, corner {corner}: {attribute} index {index} is out of range")]
    IndexOutOfRange {
        line: usize,
        corner: usize,
        attribute: MeshAttribute,
        index: i64,
    },

    /// Some corners supplied a texcoord/normal index and others did not.
    #[error("attribute count mismatch: |v|={vertex}, |vt|={texcoord}, |vn|={normal}")]
    AttributeCountMismatch {
        vertex: usize,
        texcoord: usize,
        normal: usize,
    },

    /// The text contained no vertex positions at all.
    #[error("the mesh doesn't contain vertex data")]
    EmptyMesh,
}

/// Per-call failure of `upload`/`get_buffer`. The mesh stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The mesh has no data for the requested attribute stream.
    #[error("this mesh doesn't have the {0} attribute")]
    AttributeMissing(MeshAttribute),

    /// `get_buffer` was called before any `upload` allocated the backing
    /// buffer(s) for the attribute.
    #[error("the {0} attribute has not been uploaded")]
    NotUploaded(MeshAttribute),
}
