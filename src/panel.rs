use std::ops::Range;

use cartshelf::ui::PanelCommand;

use crate::gpu::{Projection, QuadPipeline, VertexStream, projection_entry};

/// One corner of a rounded rectangle. Every corner carries the whole
/// panel so the fragment stage can evaluate the box SDF locally.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PanelVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub size_px: [f32; 2],
    pub fill: [f32; 4],
    pub border_color: [f32; 4],
    pub border_width: f32,
    pub radius: f32,
}

const PANEL_ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32x2,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32,
    6 => Float32,
];

/// Room for 256 panels before the first grow.
const INITIAL_VERTICES: usize = 256 * 6;

pub struct PanelRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    projection: wgpu::Buffer,
    vertices: VertexStream<PanelVertex>,
}

impl PanelRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let projection = Projection::buffer(device, "panel_projection");
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("panel_bind_group_layout"),
            entries: &[projection_entry()],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panel_bind_group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection.as_entire_binding(),
            }],
        });
        let pipeline = QuadPipeline {
            label: "panel_pipeline",
            shader: include_str!("panel.wgsl"),
            bind_group_layout: &layout,
            vertex_stride: std::mem::size_of::<PanelVertex>(),
            attributes: &PANEL_ATTRIBUTES,
        }
        .build(device, format);

        Self {
            pipeline,
            bind_group,
            projection,
            vertices: VertexStream::new(device, "panel_vertices", INITIAL_VERTICES),
        }
    }

    /// Drop last frame's panels and project onto `sw` x `sh` logical pixels.
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, sw: f32, sh: f32) {
        self.vertices.clear();
        let projection = Projection::screen(sw, sh);
        queue.write_buffer(&self.projection, 0, bytemuck::bytes_of(&projection));
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.count()
    }

    /// Queue one panel. Empty or invisible panels emit nothing.
    pub fn add_panel(&mut self, cmd: &PanelCommand) {
        let r = cmd.rect;
        if r.width <= 0.0 || r.height <= 0.0 {
            return;
        }
        let has_border = cmd.border_width > 0.0 && cmd.border_color[3] > 0.0;
        if cmd.bg_color[3] <= 0.0 && !has_border {
            return;
        }
        let size_px = [r.width, r.height];
        let radius = cmd.radius.clamp(0.0, r.width.min(r.height) * 0.5);
        let corner = |x: f32, y: f32, u: f32, v: f32| PanelVertex {
            position: [x, y],
            uv: [u, v],
            size_px,
            fill: cmd.bg_color,
            border_color: cmd.border_color,
            border_width: cmd.border_width,
            radius,
        };
        let (x1, y1) = (r.x + r.width, r.y + r.height);
        self.vertices.push_quad([
            corner(r.x, r.y, 0.0, 0.0),
            corner(x1, r.y, 1.0, 0.0),
            corner(r.x, y1, 0.0, 1.0),
            corner(x1, y1, 1.0, 1.0),
        ]);
    }

    /// Upload the queued panels. Returns the vertex total.
    pub fn flush(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> u32 {
        self.vertices.upload(device, queue)
    }

    /// Draw one layer of the flushed vertices.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>, vertices: Range<u32>) {
        self.vertices
            .draw(pass, &self.pipeline, &self.bind_group, vertices);
    }
}
