//! Triangle mesh geometry
//!
//! [`TriMesh`] stores flat per-vertex attribute arrays (positions, optional
//! normals and texcoords aligned 1:1 by vertex index) and a flat triangle
//! index list, plus the per-mesh upload state that owns its backend buffer
//! handles. Attribute presence is derived purely from non-emptiness.
//!
//! [`Renderable`] is the capability interface the scene registry stores;
//! new renderable kinds implement it rather than extending `TriMesh`.

use std::fmt;

use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3};

use crate::error::BufferError;
use crate::gfx::backend::RasterBackend;
use crate::gfx::upload::{
    BufferInfo, UploadState, MAX_CHUNK_INDICES, SLOT_NORMAL, SLOT_POSITION, SLOT_TEXCOORD,
};

/// The closed set of attribute streams a mesh can provide, used both to
/// select buffers for upload/query and to report capability sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshAttribute {
    Position,
    Index,
    Normal,
    Texcoord,
}

impl fmt::Display for MeshAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeshAttribute::Position => "position",
            MeshAttribute::Index => "index",
            MeshAttribute::Normal => "normal",
            MeshAttribute::Texcoord => "texcoord",
        };
        f.write_str(name)
    }
}

/// Anything the scene can hand to a renderer: report which attribute streams
/// exist, push them to a raster backend, and describe or release what was
/// pushed.
pub trait Renderable {
    /// {Position} plus Index/Normal/Texcoord when the mesh carries them.
    fn available_attributes(&self) -> Vec<MeshAttribute>;

    /// Uploads one attribute stream, lazily allocating any missing backend
    /// buffer, and returns one [`BufferInfo`] per sub-buffer in chunk order.
    fn upload(
        &mut self,
        backend: &mut dyn RasterBackend,
        attribute: MeshAttribute,
    ) -> Result<Vec<BufferInfo>, BufferError>;

    /// Describes already-uploaded sub-buffers without touching the backend.
    fn get_buffer(&self, attribute: MeshAttribute) -> Result<Vec<BufferInfo>, BufferError>;

    /// Deletes every allocated backend buffer. Must be called before the
    /// renderable is discarded or the backend resources leak.
    fn unload(&mut self, backend: &mut dyn RasterBackend);

    /// Usage hint forwarded to the backend on every write: `true` for
    /// rarely-changing content.
    fn is_permanent(&self) -> bool;

    /// Current model transform, read fresh on every call.
    fn affine_transform(&self) -> Matrix4<f32>;
}

/// A triangulated mesh: vertex-indexed attribute arrays plus a flat triangle
/// list.
///
/// Invariant: non-empty `normals`/`texcoords` are exactly `vertices` long.
/// The importer upholds this; code mutating the arrays directly must too.
#[derive(Debug, Clone)]
pub struct TriMesh {
    pub vertices: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub texcoords: Vec<Vector2<f32>>,
    pub indices: Vec<u32>,
    /// Model transform, mutable at will; read at upload/draw time.
    pub transform: Matrix4<f32>,
    /// Permanence hint forwarded to the backend on every write.
    pub is_static: bool,
    gpu: UploadState,
}

impl TriMesh {
    pub fn new() -> Self {
        TriMesh {
            vertices: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            indices: Vec::new(),
            transform: Matrix4::identity(),
            is_static: true,
            gpu: UploadState::default(),
        }
    }

    pub fn has_normal(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_texcoord(&self) -> bool {
        !self.texcoords.is_empty()
    }

    pub fn has_index(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Positions flattened to component-major floats, 3 per vertex.
    pub fn positions_f32(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| [v.x, v.y, v.z])
            .collect()
    }

    /// Normals flattened to component-major floats, 3 per vertex.
    pub fn normals_f32(&self) -> Vec<f32> {
        self.normals.iter().flat_map(|n| [n.x, n.y, n.z]).collect()
    }

    /// Texcoords flattened to component-major floats, 2 per vertex.
    pub fn texcoords_f32(&self) -> Vec<f32> {
        self.texcoords.iter().flat_map(|t| [t.x, t.y]).collect()
    }

    /// The flat index stream in full 32-bit width.
    pub fn indices_u32(&self) -> &[u32] {
        &self.indices
    }

    /// Number of 16-bit index chunks the current stream needs.
    pub fn index_chunk_count(&self) -> usize {
        self.indices.len().div_ceil(MAX_CHUNK_INDICES)
    }

    /// Length of chunk `i`: every chunk is full except a shorter final one.
    pub fn index_chunk_len(&self, i: usize) -> usize {
        MAX_CHUNK_INDICES.min(self.indices.len() - i * MAX_CHUNK_INDICES)
    }

    /// The index stream sliced into contiguous chunks of at most
    /// [`MAX_CHUNK_INDICES`] entries, each entry narrowed to 16 bits.
    ///
    /// Vertex indices are not renumbered per chunk: every chunk addresses the
    /// full vertex buffers with an implicit base-vertex of 0, so indices past
    /// 65535 do not survive the narrowing.
    pub fn index_chunks_u16(&self) -> Vec<Vec<u16>> {
        self.indices
            .chunks(MAX_CHUNK_INDICES)
            .map(|chunk| chunk.iter().map(|&i| i as u16).collect())
            .collect()
    }

    fn require(&self, attribute: MeshAttribute) -> Result<(), BufferError> {
        let present = match attribute {
            MeshAttribute::Position => true,
            MeshAttribute::Index => self.has_index(),
            MeshAttribute::Normal => self.has_normal(),
            MeshAttribute::Texcoord => self.has_texcoord(),
        };
        if present {
            Ok(())
        } else {
            Err(BufferError::AttributeMissing(attribute))
        }
    }
}

impl Default for TriMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderable for TriMesh {
    fn available_attributes(&self) -> Vec<MeshAttribute> {
        let mut attributes = vec![MeshAttribute::Position];
        if self.has_index() {
            attributes.push(MeshAttribute::Index);
        }
        if self.has_normal() {
            attributes.push(MeshAttribute::Normal);
        }
        if self.has_texcoord() {
            attributes.push(MeshAttribute::Texcoord);
        }
        attributes
    }

    fn upload(
        &mut self,
        backend: &mut dyn RasterBackend,
        attribute: MeshAttribute,
    ) -> Result<Vec<BufferInfo>, BufferError> {
        self.require(attribute)?;
        let is_permanent = self.is_static;
        match attribute {
            MeshAttribute::Position => {
                let data = self.positions_f32();
                let len = self.vertices.len();
                Ok(vec![self.gpu.upload_attribute(
                    backend,
                    SLOT_POSITION,
                    &data,
                    3,
                    len,
                    is_permanent,
                )])
            }
            MeshAttribute::Normal => {
                let data = self.normals_f32();
                let len = self.normals.len();
                Ok(vec![self.gpu.upload_attribute(
                    backend,
                    SLOT_NORMAL,
                    &data,
                    3,
                    len,
                    is_permanent,
                )])
            }
            MeshAttribute::Texcoord => {
                let data = self.texcoords_f32();
                let len = self.texcoords.len();
                Ok(vec![self.gpu.upload_attribute(
                    backend,
                    SLOT_TEXCOORD,
                    &data,
                    2,
                    len,
                    is_permanent,
                )])
            }
            MeshAttribute::Index => {
                let chunks = self.index_chunks_u16();
                Ok(self.gpu.upload_index_chunks(backend, &chunks, is_permanent))
            }
        }
    }

    fn get_buffer(&self, attribute: MeshAttribute) -> Result<Vec<BufferInfo>, BufferError> {
        self.require(attribute)?;
        let info = match attribute {
            MeshAttribute::Position => self.gpu.attribute_info(SLOT_POSITION, self.vertices.len()),
            MeshAttribute::Normal => self.gpu.attribute_info(SLOT_NORMAL, self.normals.len()),
            MeshAttribute::Texcoord => self.gpu.attribute_info(SLOT_TEXCOORD, self.texcoords.len()),
            MeshAttribute::Index => {
                let lens: Vec<usize> = (0..self.index_chunk_count())
                    .map(|i| self.index_chunk_len(i))
                    .collect();
                return self
                    .gpu
                    .index_infos(&lens)
                    .ok_or(BufferError::NotUploaded(MeshAttribute::Index));
            }
        };
        info.map(|info| vec![info])
            .ok_or(BufferError::NotUploaded(attribute))
    }

    fn unload(&mut self, backend: &mut dyn RasterBackend) {
        self.gpu.release(backend);
    }

    fn is_permanent(&self) -> bool {
        self.is_static
    }

    fn affine_transform(&self) -> Matrix4<f32> {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::mock::RecordingBackend;

    fn quad_mesh() -> TriMesh {
        let mut mesh = TriMesh::new();
        mesh.vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        mesh.indices = vec![0, 1, 2, 2, 3, 0];
        mesh
    }

    fn big_index_mesh(index_count: usize) -> TriMesh {
        let mut mesh = TriMesh::new();
        mesh.vertices = vec![Vector3::new(0.0, 0.0, 0.0); 3];
        mesh.indices = (0..index_count as u32).map(|i| i % 3).collect();
        mesh
    }

    #[test]
    fn test_available_attributes_positions_and_index_only() {
        let mesh = quad_mesh();
        assert_eq!(
            mesh.available_attributes(),
            vec![MeshAttribute::Position, MeshAttribute::Index]
        );
    }

    #[test]
    fn test_packed_views() {
        let mut mesh = quad_mesh();
        mesh.texcoords = vec![Vector2::new(0.25, 0.5); 4];

        assert_eq!(mesh.positions_f32().len(), 12);
        assert_eq!(&mesh.positions_f32()[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(mesh.texcoords_f32(), vec![0.25, 0.5].repeat(4));
        assert_eq!(mesh.indices_u32(), &[0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn test_index_chunking_70000() {
        let mesh = big_index_mesh(70_000);
        assert_eq!(mesh.index_chunk_count(), 2);
        assert_eq!(mesh.index_chunk_len(0), 65_535);
        assert_eq!(mesh.index_chunk_len(1), 4_465);

        let chunks = mesh.index_chunks_u16();
        assert_eq!(chunks[0].len(), 65_535);
        assert_eq!(chunks[1].len(), 4_465);

        // concatenation covers the whole stream in original order
        let rejoined: Vec<u16> = chunks.into_iter().flatten().collect();
        assert_eq!(rejoined.len(), 70_000);
        assert!(rejoined
            .iter()
            .zip(mesh.indices.iter())
            .all(|(&narrow, &wide)| narrow as u32 == wide));
    }

    #[test]
    fn test_upload_index_returns_one_info_per_chunk() {
        let mut backend = RecordingBackend::new();
        let mut mesh = big_index_mesh(70_000);

        let infos = mesh.upload(&mut backend, MeshAttribute::Index).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].len(), 65_535);
        assert_eq!(infos[1].len(), 4_465);
        assert_ne!(infos[0].handle(), infos[1].handle());

        let written: usize = backend
            .index_writes_u16
            .iter()
            .map(|(_, data, _)| data.len())
            .sum();
        assert_eq!(written, 70_000);
    }

    #[test]
    fn test_upload_missing_attribute_fails() {
        let mut backend = RecordingBackend::new();
        let mut mesh = quad_mesh();

        assert_eq!(
            mesh.upload(&mut backend, MeshAttribute::Normal),
            Err(BufferError::AttributeMissing(MeshAttribute::Normal))
        );
        // the mesh stays usable
        assert!(mesh.upload(&mut backend, MeshAttribute::Position).is_ok());
    }

    #[test]
    fn test_upload_is_idempotent_per_attribute() {
        let mut backend = RecordingBackend::new();
        let mut mesh = quad_mesh();

        let first = mesh.upload(&mut backend, MeshAttribute::Position).unwrap();
        let second = mesh.upload(&mut backend, MeshAttribute::Position).unwrap();
        assert_eq!(first[0].handle(), second[0].handle());
        assert_eq!(backend.attribute_buffers_created, 1);
        assert_eq!(backend.attribute_writes.len(), 2);
    }

    #[test]
    fn test_upload_forwards_permanence_hint() {
        let mut backend = RecordingBackend::new();
        let mut mesh = quad_mesh();
        mesh.is_static = false;

        mesh.upload(&mut backend, MeshAttribute::Position).unwrap();
        mesh.upload(&mut backend, MeshAttribute::Index).unwrap();

        assert!(backend.attribute_writes.iter().all(|&(_, _, _, p)| !p));
        assert!(backend.index_writes_u16.iter().all(|&(_, _, p)| !p));
    }

    #[test]
    fn test_get_buffer_before_upload_is_an_error() {
        let mesh = quad_mesh();
        assert_eq!(
            mesh.get_buffer(MeshAttribute::Position),
            Err(BufferError::NotUploaded(MeshAttribute::Position))
        );
        assert_eq!(
            mesh.get_buffer(MeshAttribute::Index),
            Err(BufferError::NotUploaded(MeshAttribute::Index))
        );
        // a missing stream is reported as missing, not as not-uploaded
        assert_eq!(
            mesh.get_buffer(MeshAttribute::Texcoord),
            Err(BufferError::AttributeMissing(MeshAttribute::Texcoord))
        );
    }

    #[test]
    fn test_get_buffer_matches_upload() {
        let mut backend = RecordingBackend::new();
        let mut mesh = big_index_mesh(70_000);

        let uploaded = mesh.upload(&mut backend, MeshAttribute::Index).unwrap();
        let queried = mesh.get_buffer(MeshAttribute::Index).unwrap();
        assert_eq!(uploaded, queried);
    }

    #[test]
    fn test_index_shrink_keeps_excess_buffers_allocated() {
        let mut backend = RecordingBackend::new();
        let mut mesh = big_index_mesh(70_000);

        mesh.upload(&mut backend, MeshAttribute::Index).unwrap();
        assert_eq!(backend.live_index_buffers.len(), 2);

        mesh.indices.truncate(30);
        let infos = mesh.upload(&mut backend, MeshAttribute::Index).unwrap();
        assert_eq!(infos.len(), 1);
        // the second buffer is orphaned until unload, not freed
        assert_eq!(backend.live_index_buffers.len(), 2);
        assert_eq!(mesh.get_buffer(MeshAttribute::Index).unwrap().len(), 1);
    }

    #[test]
    fn test_index_growth_without_upload_is_not_uploaded() {
        let mut backend = RecordingBackend::new();
        let mut mesh = big_index_mesh(100);

        mesh.upload(&mut backend, MeshAttribute::Index).unwrap();
        mesh.indices = (0..70_000u32).map(|i| i % 3).collect();
        assert_eq!(
            mesh.get_buffer(MeshAttribute::Index),
            Err(BufferError::NotUploaded(MeshAttribute::Index))
        );
    }

    #[test]
    fn test_unload_resets_all_handles() {
        let mut backend = RecordingBackend::new();
        let mut mesh = quad_mesh();
        mesh.normals = vec![Vector3::new(0.0, 0.0, 1.0); 4];

        mesh.upload(&mut backend, MeshAttribute::Position).unwrap();
        mesh.upload(&mut backend, MeshAttribute::Normal).unwrap();
        let old = mesh.upload(&mut backend, MeshAttribute::Index).unwrap();

        mesh.unload(&mut backend);
        assert!(backend.live_attribute_buffers.is_empty());
        assert!(backend.live_index_buffers.is_empty());
        assert_eq!(
            mesh.get_buffer(MeshAttribute::Position),
            Err(BufferError::NotUploaded(MeshAttribute::Position))
        );

        // unloading twice is safe
        mesh.unload(&mut backend);

        // a fresh upload allocates fresh handles
        let new = mesh.upload(&mut backend, MeshAttribute::Index).unwrap();
        assert_ne!(old[0].handle(), new[0].handle());
    }

    #[test]
    fn test_transform_is_read_uncached() {
        let mut mesh = quad_mesh();
        assert_eq!(mesh.affine_transform(), Matrix4::identity());
        mesh.transform = Matrix4::from_scale(2.0);
        assert_eq!(mesh.affine_transform(), Matrix4::from_scale(2.0));
    }
}
