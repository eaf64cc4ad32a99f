//! Plumbing shared by the panel and text pipelines: the projection uniform,
//! a growable per-frame vertex stream and the alpha-blended quad pipeline.

use std::ops::Range;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Projection {
    pub matrix: [[f32; 4]; 4],
}

impl Projection {
    /// Top-left origin, y down, `width` x `height` logical pixels.
    pub fn screen(width: f32, height: f32) -> Self {
        let (w, h) = (width.max(1.0), height.max(1.0));
        #[rustfmt::skip]
        let matrix = [
            [2.0 / w, 0.0,      0.0, 0.0],
            [0.0,     -2.0 / h, 0.0, 0.0],
            [0.0,     0.0,      1.0, 0.0],
            [-1.0,    1.0,      0.0, 1.0],
        ];
        Self { matrix }
    }

    pub fn buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Self>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

/// Binding 0 of every pipeline here: the projection, read by the vertex
/// stage.
pub fn projection_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct QuadPipeline<'a> {
    pub label: &'a str,
    pub shader: &'a str,
    pub bind_group_layout: &'a wgpu::BindGroupLayout,
    pub vertex_stride: usize,
    pub attributes: &'a [wgpu::VertexAttribute],
}

impl QuadPipeline<'_> {
    /// Triangle list, premultiplied alpha, `vs_main` / `fs_main`.
    pub fn build(&self, device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(self.shader.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(self.label),
            bind_group_layouts: &[self.bind_group_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: self.vertex_stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: self.attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

/// Vertices collected on the CPU during a frame, then uploaded in one write.
/// The GPU buffer grows to the next power of two when a frame outgrows it.
pub struct VertexStream<V> {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: usize,
    pending: Vec<V>,
}

impl<V: bytemuck::Pod> VertexStream<V> {
    pub fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        Self {
            label,
            buffer: Self::allocate(device, label, capacity),
            capacity,
            pending: Vec::with_capacity(capacity),
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity.max(1) * std::mem::size_of::<V>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn count(&self) -> u32 {
        self.pending.len() as u32
    }

    /// Two triangles from corners in `[top-left, top-right, bottom-left,
    /// bottom-right]` order.
    pub fn push_quad(&mut self, [tl, tr, bl, br]: [V; 4]) {
        self.pending.extend_from_slice(&[tl, tr, bl, tr, br, bl]);
    }

    /// Write this frame's vertices. Returns how many were written.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> u32 {
        if self.pending.is_empty() {
            return 0;
        }
        if self.pending.len() > self.capacity {
            self.capacity = self.pending.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
            log::debug!("{} grown to {} vertices", self.label, self.capacity);
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.pending));
        self.count()
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        vertices: Range<u32>,
    ) {
        if vertices.is_empty() {
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(vertices, 0..1);
    }
}
