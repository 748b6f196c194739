//! Raster backend capability interface
//!
//! The upload state machine talks to the GPU exclusively through
//! [`RasterBackend`]: create a buffer, fill it, delete it. All calls are
//! synchronous round-trips (immediate-mode style) and must be issued from
//! whichever thread owns the rendering context - that is a contract on the
//! caller, not enforced here.
//!
//! Handles are capability references. The backend owns the underlying GPU
//! resource; dropping a handle without deleting it leaks the resource.

/// Opaque id naming one backend-owned buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    /// Wraps a backend-chosen raw id. Only backend implementations should
    /// mint handles.
    pub fn from_raw(raw: u64) -> Self {
        BufferHandle(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Buffer allocation, write, and teardown as exposed by a rasterizer.
///
/// `is_permanent` is a usage hint: `true` means the contents are expected to
/// change rarely, `false` means frequent rewrites. Backends may use it to
/// pick a storage strategy; they must not change visible behavior based on
/// it.
///
/// Deleting an unknown or already-deleted handle must be a no-op.
pub trait RasterBackend {
    fn create_attribute_buffer(&mut self) -> BufferHandle;

    /// Fills an attribute buffer with packed component-major floats.
    /// `component_width` is the number of floats per vertex (3 for
    /// positions/normals, 2 for texcoords).
    fn write_attribute_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
        component_width: u32,
        is_permanent: bool,
    );

    fn create_index_buffer(&mut self) -> BufferHandle;

    /// Fills an index buffer with narrow (16-bit) indices.
    fn write_index_buffer_u16(&mut self, handle: BufferHandle, data: &[u16], is_permanent: bool);

    /// Fills an index buffer with wide (32-bit) indices, for backends without
    /// the narrow-index restriction.
    fn write_index_buffer_u32(&mut self, handle: BufferHandle, data: &[u32], is_permanent: bool);

    fn delete_attribute_buffer(&mut self, handle: BufferHandle);

    fn delete_index_buffer(&mut self, handle: BufferHandle);
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording backend used by the upload and mesh tests.

    use super::{BufferHandle, RasterBackend};
    use std::collections::HashSet;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingBackend {
        next_handle: u64,
        pub live_attribute_buffers: HashSet<BufferHandle>,
        pub live_index_buffers: HashSet<BufferHandle>,
        pub attribute_writes: Vec<(BufferHandle, Vec<f32>, u32, bool)>,
        pub index_writes_u16: Vec<(BufferHandle, Vec<u16>, bool)>,
        pub index_writes_u32: Vec<(BufferHandle, Vec<u32>, bool)>,
        pub attribute_buffers_created: usize,
        pub index_buffers_created: usize,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl RasterBackend for RecordingBackend {
        fn create_attribute_buffer(&mut self) -> BufferHandle {
            self.next_handle += 1;
            let handle = BufferHandle::from_raw(self.next_handle);
            self.live_attribute_buffers.insert(handle);
            self.attribute_buffers_created += 1;
            handle
        }

        fn write_attribute_buffer(
            &mut self,
            handle: BufferHandle,
            data: &[f32],
            component_width: u32,
            is_permanent: bool,
        ) {
            assert!(
                self.live_attribute_buffers.contains(&handle),
                "write to dead attribute buffer {handle:?}"
            );
            self.attribute_writes
                .push((handle, data.to_vec(), component_width, is_permanent));
        }

        fn create_index_buffer(&mut self) -> BufferHandle {
            self.next_handle += 1;
            let handle = BufferHandle::from_raw(self.next_handle);
            self.live_index_buffers.insert(handle);
            self.index_buffers_created += 1;
            handle
        }

        fn write_index_buffer_u16(
            &mut self,
            handle: BufferHandle,
            data: &[u16],
            is_permanent: bool,
        ) {
            assert!(
                self.live_index_buffers.contains(&handle),
                "write to dead index buffer {handle:?}"
            );
            self.index_writes_u16
                .push((handle, data.to_vec(), is_permanent));
        }

        fn write_index_buffer_u32(
            &mut self,
            handle: BufferHandle,
            data: &[u32],
            is_permanent: bool,
        ) {
            assert!(
                self.live_index_buffers.contains(&handle),
                "write to dead index buffer {handle:?}"
            );
            self.index_writes_u32
                .push((handle, data.to_vec(), is_permanent));
        }

        fn delete_attribute_buffer(&mut self, handle: BufferHandle) {
            // deleting an unknown handle is a no-op per the trait contract
            self.live_attribute_buffers.remove(&handle);
        }

        fn delete_index_buffer(&mut self, handle: BufferHandle) {
            self.live_index_buffers.remove(&handle);
        }
    }
}
