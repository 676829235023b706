use wgpu::util::DeviceExt;

use crate::render::layout::{align_up, UniformBufferLayout};

/// Vertex buffer that grows to the next power of two when a frame needs more room.
pub(super) struct VertexBuffer {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl VertexBuffer {
    pub(super) fn new(label: &'static str) -> Self {
        Self { label, buffer: None, capacity: 0 }
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, bytes: u64) {
        if bytes <= self.capacity && self.buffer.is_some() {
            return;
        }
        let capacity = bytes.next_power_of_two().max(4096);
        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: capacity,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.capacity = capacity;
        log::debug!("{}: grown to {capacity} bytes", self.label);
    }

    /// Writes `data` at byte `offset`, growing the buffer first if needed.
    pub(super) fn edit(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8], offset: u64) {
        if data.is_empty() {
            return;
        }
        self.ensure_capacity(device, offset + data.len() as u64);
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, offset, data);
        }
    }

    pub(super) fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// Index buffer with the fixed two-triangle pattern for consecutive quads.
pub(super) struct QuadIndexBuffer {
    buffer: Option<wgpu::Buffer>,
    quads: u32,
}

impl QuadIndexBuffer {
    pub(super) fn new() -> Self {
        Self { buffer: None, quads: 0 }
    }

    pub(super) fn ensure_quads(&mut self, device: &wgpu::Device, quads: u32) {
        if quads <= self.quads && self.buffer.is_some() {
            return;
        }
        let quads = quads.next_power_of_two().max(256);
        let indices: Vec<u32> = (0..quads)
            .flat_map(|q| {
                let b = q * 4;
                [b, b + 1, b + 2, b, b + 2, b + 3]
            })
            .collect();
        self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen quad ibo"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
        self.quads = quads;
    }

    /// Index count of `quads` quads.
    #[inline]
    pub(super) fn count(quads: u32) -> u32 {
        quads * 6
    }

    pub(super) fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// One uniform block per draw, addressed with dynamic offsets.
pub(super) struct UniformRing {
    label: &'static str,
    block_size: u32,
    stride: u32,
    capacity: u32,
    buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
}

impl UniformRing {
    pub(super) fn new(label: &'static str, layout: &UniformBufferLayout, alignment: u32) -> Self {
        Self::with_block_size(label, layout.stride(), alignment)
    }

    pub(super) fn with_block_size(label: &'static str, block_size: u32, alignment: u32) -> Self {
        Self {
            label,
            block_size,
            stride: align_up(block_size, alignment.max(1)),
            capacity: 0,
            buffer: None,
            bind_group: None,
        }
    }

    /// Dynamic offset of block `index`.
    #[inline]
    pub(super) fn offset(&self, index: usize) -> u32 {
        index as u32 * self.stride
    }

    /// Uploads `blocks` back to back at `stride` spacing.
    pub(super) fn upload<'b>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        blocks: impl ExactSizeIterator<Item = &'b [u8]>,
    ) {
        let count = blocks.len() as u32;
        if count == 0 {
            return;
        }

        if count > self.capacity || self.buffer.is_none() {
            let capacity = count.next_power_of_two().max(8);
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: capacity as u64 * self.stride as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(self.label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(self.block_size as u64),
                    }),
                }],
            }));
            self.buffer = Some(buffer);
            self.capacity = capacity;
        }

        let mut staging = vec![0u8; count as usize * self.stride as usize];
        for (i, block) in blocks.enumerate() {
            let start = self.offset(i) as usize;
            let n = block.len().min(self.block_size as usize);
            staging[start..start + n].copy_from_slice(&block[..n]);
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, &staging);
        }
    }

    pub(super) fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}
