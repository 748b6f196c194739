//! Per-mesh buffer upload state machine
//!
//! Tracks which backend buffers a mesh has allocated: up to three attribute
//! buffers (position, normal, texcoord) plus a growable list of index
//! buffers. Index streams are sharded into chunks of at most
//! [`MAX_CHUNK_INDICES`] entries so backends restricted to 16-bit index
//! types can still draw large meshes, one draw call per chunk.
//!
//! Allocation is lazy and idempotent: a buffer is created on the first
//! upload of its attribute and reused afterwards. The index buffer list only
//! grows between uploads; [`UploadState::release`] is the single teardown
//! path and resets everything to unallocated.

use crate::gfx::backend::{BufferHandle, RasterBackend};

/// Maximum entries per index buffer, imposed by 16-bit index backends.
pub const MAX_CHUNK_INDICES: usize = 0xFFFF;

pub(crate) const SLOT_POSITION: usize = 0;
pub(crate) const SLOT_NORMAL: usize = 1;
pub(crate) const SLOT_TEXCOORD: usize = 2;
const ATTRIBUTE_SLOTS: usize = 3;

/// One uploaded (or query-able) sub-buffer: backend handle plus element
/// count. Descriptive only, does not own the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    handle: BufferHandle,
    len: usize,
}

impl BufferInfo {
    pub(crate) fn new(handle: BufferHandle, len: usize) -> Self {
        BufferInfo { handle, len }
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Number of elements (vertices or indices) in the sub-buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Allocation state for one mesh's backend buffers.
///
/// Cloning a mesh clones this state too; the clone then aliases the original
/// mesh's backend buffers, so only one of them should `release`.
#[derive(Debug, Clone, Default)]
pub(crate) struct UploadState {
    attributes: [Option<BufferHandle>; ATTRIBUTE_SLOTS],
    index_buffers: Vec<BufferHandle>,
}

impl UploadState {
    /// Writes one packed attribute stream, allocating its buffer on first
    /// use. `len` is the element count reported back to the caller.
    pub(crate) fn upload_attribute(
        &mut self,
        backend: &mut dyn RasterBackend,
        slot: usize,
        data: &[f32],
        component_width: u32,
        len: usize,
        is_permanent: bool,
    ) -> BufferInfo {
        let handle = match self.attributes[slot] {
            Some(handle) => handle,
            None => {
                let handle = backend.create_attribute_buffer();
                self.attributes[slot] = Some(handle);
                handle
            }
        };
        backend.write_attribute_buffer(handle, data, component_width, is_permanent);
        BufferInfo::new(handle, len)
    }

    /// Writes every index chunk, growing the buffer list to fit.
    ///
    /// The list never shrinks: if the mesh's index stream shrank since the
    /// last upload, the excess buffers stay allocated on the backend but are
    /// no longer reported by queries. They are reclaimed on `release`.
    pub(crate) fn upload_index_chunks(
        &mut self,
        backend: &mut dyn RasterBackend,
        chunks: &[Vec<u16>],
        is_permanent: bool,
    ) -> Vec<BufferInfo> {
        while self.index_buffers.len() < chunks.len() {
            self.index_buffers.push(backend.create_index_buffer());
        }
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let handle = self.index_buffers[i];
                backend.write_index_buffer_u16(handle, chunk, is_permanent);
                BufferInfo::new(handle, chunk.len())
            })
            .collect()
    }

    /// Describes an already-uploaded attribute buffer, or `None` when no
    /// upload has allocated it yet.
    pub(crate) fn attribute_info(&self, slot: usize, len: usize) -> Option<BufferInfo> {
        self.attributes[slot]
            .map(|handle| BufferInfo::new(handle, len))
    }

    /// Describes the index chunks named by `chunk_lens`, in chunk order.
    /// `None` when fewer buffers are allocated than the current stream needs
    /// (never uploaded, or grown since the last upload).
    pub(crate) fn index_infos(&self, chunk_lens: &[usize]) -> Option<Vec<BufferInfo>> {
        if chunk_lens.len() > self.index_buffers.len() {
            return None;
        }
        Some(
            chunk_lens
                .iter()
                .enumerate()
                .map(|(i, &len)| BufferInfo::new(self.index_buffers[i], len))
                .collect(),
        )
    }

    /// Deletes every allocated buffer and resets to the unallocated state.
    /// Safe to call repeatedly.
    pub(crate) fn release(&mut self, backend: &mut dyn RasterBackend) {
        for slot in &mut self.attributes {
            if let Some(handle) = slot.take() {
                backend.delete_attribute_buffer(handle);
            }
        }
        for handle in self.index_buffers.drain(..) {
            backend.delete_index_buffer(handle);
        }
    }
}
