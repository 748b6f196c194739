//! wgpu implementation of the raster backend
//!
//! Maps the handle-based [`RasterBackend`] contract onto `wgpu::Buffer`s.
//! `create_*` only reserves a slot; the actual `wgpu::Buffer` is created on
//! the first write, once the byte size is known, and recreated when the size
//! changes.
//!
//! The permanence hint picks the storage path: permanent data is baked in at
//! creation (`create_buffer_init` without `COPY_DST`), dynamic data gets a
//! `COPY_DST` buffer that is refilled in place with `Queue::write_buffer`
//! while the size fits.

use std::collections::HashMap;

use log::warn;
use wgpu::util::DeviceExt;

use crate::gfx::backend::{BufferHandle, RasterBackend};

struct BufferSlot {
    buffer: Option<wgpu::Buffer>,
    usage: wgpu::BufferUsages,
}

/// Backend over an existing device/queue pair. All calls must come from the
/// thread that owns the rendering context.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_handle: u64,
    buffers: HashMap<BufferHandle, BufferSlot>,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        WgpuBackend {
            device,
            queue,
            next_handle: 0,
            buffers: HashMap::new(),
        }
    }

    fn create(&mut self, usage: wgpu::BufferUsages) -> BufferHandle {
        self.next_handle += 1;
        let handle = BufferHandle::from_raw(self.next_handle);
        self.buffers.insert(
            handle,
            BufferSlot {
                buffer: None,
                usage,
            },
        );
        handle
    }

    fn write(&mut self, handle: BufferHandle, contents: &[u8], is_permanent: bool, label: &str) {
        let Some(slot) = self.buffers.get_mut(&handle) else {
            warn!("write to unknown buffer handle {}", handle.raw());
            return;
        };
        match &slot.buffer {
            // refill in place while the size matches; `write_buffer` needs a
            // 4-byte-aligned size, which the size match guarantees since the
            // existing buffer was created with an aligned size
            Some(buffer) if !is_permanent && buffer.size() == contents.len() as u64 => {
                self.queue.write_buffer(buffer, 0, contents);
            }
            _ => {
                if let Some(old) = slot.buffer.take() {
                    old.destroy();
                }
                let usage = if is_permanent {
                    slot.usage
                } else {
                    slot.usage | wgpu::BufferUsages::COPY_DST
                };
                slot.buffer = Some(self.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(label),
                        contents,
                        usage,
                    },
                ));
            }
        }
    }

    fn delete(&mut self, handle: BufferHandle) {
        // deleting an unknown or already-deleted handle is a no-op
        if let Some(slot) = self.buffers.remove(&handle) {
            if let Some(buffer) = slot.buffer {
                buffer.destroy();
            }
        }
    }

    /// The `wgpu::Buffer` behind a handle, for binding at draw time. `None`
    /// until the first write.
    pub fn buffer(&self, handle: BufferHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(&handle)?.buffer.as_ref()
    }
}

impl RasterBackend for WgpuBackend {
    fn create_attribute_buffer(&mut self) -> BufferHandle {
        self.create(wgpu::BufferUsages::VERTEX)
    }

    fn write_attribute_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
        _component_width: u32,
        is_permanent: bool,
    ) {
        // component width is a draw-time concern in wgpu (vertex layouts live
        // on the pipeline), the buffer itself is just bytes
        self.write(
            handle,
            bytemuck::cast_slice(data),
            is_permanent,
            "rastermesh attribute buffer",
        );
    }

    fn create_index_buffer(&mut self) -> BufferHandle {
        self.create(wgpu::BufferUsages::INDEX)
    }

    fn write_index_buffer_u16(&mut self, handle: BufferHandle, data: &[u16], is_permanent: bool) {
        self.write(
            handle,
            bytemuck::cast_slice(data),
            is_permanent,
            "rastermesh index buffer (u16)",
        );
    }

    fn write_index_buffer_u32(&mut self, handle: BufferHandle, data: &[u32], is_permanent: bool) {
        self.write(
            handle,
            bytemuck::cast_slice(data),
            is_permanent,
            "rastermesh index buffer (u32)",
        );
    }

    fn delete_attribute_buffer(&mut self, handle: BufferHandle) {
        self.delete(handle);
    }

    fn delete_index_buffer(&mut self, handle: BufferHandle) {
        self.delete(handle);
    }
}
