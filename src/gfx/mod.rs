//! # Graphics Module
//!
//! Everything mesh-related: geometry storage, the buffer upload state
//! machine, the raster-backend interface, the OBJ importer, and the scene
//! registry.
//!
//! Data flows text -> [`import`] -> [`TriMesh`] -> [`Scene`]; later a caller
//! drives the mesh's upload state through a [`backend::RasterBackend`] to
//! push attribute and index buffers to the GPU.

pub mod backend;
pub mod import;
pub mod mesh;
pub mod scene;
pub mod upload;
pub mod wgpu_backend;

// Re-export commonly used types
pub use mesh::TriMesh;
pub use scene::Scene;
