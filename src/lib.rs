// src/lib.rs
//! Rastermesh
//!
//! Triangle-mesh geometry with GPU buffer staging and an OBJ text importer,
//! built around a narrow raster-backend interface so meshes can be pushed to
//! wgpu (or anything else that can allocate and fill buffers).
//!
//! The crate is organized around four pieces:
//!
//! - [`TriMesh`] - flat per-vertex attribute arrays plus a triangle index list
//! - the per-mesh upload state machine ([`gfx::upload`]) that allocates backend
//!   buffers lazily and shards oversized index streams into 16-bit chunks
//! - the OBJ importer ([`gfx::import`]) that reassembles corner-indexed
//!   attributes into a vertex-indexed mesh
//! - [`Scene`] - id-keyed storage of renderables, materials, and lights
//!
//! ```
//! use rastermesh::{MeshAttribute, Renderable, Scene};
//!
//! let mut scene = Scene::new();
//! let id = scene
//!     .load_from_obj_str(Some("tri"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", None, true)
//!     .unwrap();
//! let mesh = scene.get_renderable(&id).unwrap();
//! assert_eq!(
//!     mesh.available_attributes(),
//!     vec![MeshAttribute::Position, MeshAttribute::Index]
//! );
//! ```

pub mod error;
pub mod gfx;

// Re-export main types for convenience
pub use error::{BufferError, ImportError};
pub use gfx::backend::{BufferHandle, RasterBackend};
pub use gfx::import::parse_obj_str;
pub use gfx::mesh::{MeshAttribute, Renderable, TriMesh};
pub use gfx::scene::{Frustum, Light, Material, Scene};
pub use gfx::upload::{BufferInfo, MAX_CHUNK_INDICES};
pub use gfx::wgpu_backend::WgpuBackend;
