use std::path::Path;
use std::sync::Arc;

use cartshelf::ui::DrawList;
use winit::window::Window;

use crate::font::{FontError, FontRenderer};
use crate::panel::PanelRenderer;

/// Convert sRGB component (0-1) to linear for use as wgpu clear color.
fn srgb_to_linear(s: f64) -> f64 {
    if s <= 0.04045 {
        s / 12.92
    } else {
        ((s + 0.055) / 1.055).powf(2.4)
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

impl GpuState {
    fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window).expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("failed to find a suitable GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cartshelf_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .expect("failed to create GPU device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Self {
            surface,
            device,
            queue,
            config,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }
}

/// Surface plus the two pipelines. Submits a [`DrawList`] as four layers:
/// base panels, base text, overlay panels, overlay text.
pub struct Renderer {
    gpu: GpuState,
    panel: PanelRenderer,
    font: FontRenderer,
    scale_factor: f64,
}

impl Renderer {
    pub fn new(window: Arc<Window>, font_path: Option<&Path>) -> Result<Self, FontError> {
        let scale_factor = window.scale_factor();
        let gpu = GpuState::new(window);
        let format = gpu.config.format;
        let panel = PanelRenderer::new(&gpu.device, format);
        let font = FontRenderer::new(&gpu.device, format, font_path, scale_factor)?;
        Ok(Self {
            gpu,
            panel,
            font,
            scale_factor,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
        self.font.set_scale_factor(scale_factor);
    }

    /// Surface size in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let s = self.scale_factor as f32;
        (
            self.gpu.config.width as f32 / s,
            self.gpu.config.height as f32 / s,
        )
    }

    pub fn render(&mut self, list: &DrawList, clear: [f32; 4]) {
        let (sw, sh) = self.logical_size();
        let (base_panels, overlay_panels) = list.panel_layers();
        let (base_texts, overlay_texts) = list.text_layers();

        self.panel.begin_frame(&self.gpu.queue, sw, sh);
        for cmd in base_panels {
            self.panel.add_panel(cmd);
        }
        let panel_split = self.panel.vertex_count();
        for cmd in overlay_panels {
            self.panel.add_panel(cmd);
        }
        let panel_total = self.panel.flush(&self.gpu.queue, &self.gpu.device);

        self.font.begin_frame(&self.gpu.queue, sw, sh);
        for cmd in base_texts {
            self.font.prepare(cmd);
        }
        let text_split = self.font.vertex_count();
        for cmd in overlay_texts {
            self.font.prepare(cmd);
        }
        let text_total = self.font.flush(&self.gpu.queue, &self.gpu.device);

        let output = match self.gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                return;
            }
            Err(e) => {
                log::warn!("surface error: {e:?}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: srgb_to_linear(clear[0] as f64),
                            g: srgb_to_linear(clear[1] as f64),
                            b: srgb_to_linear(clear[2] as f64),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            self.panel.render(&mut render_pass, 0..panel_split);
            self.font.render(&mut render_pass, 0..text_split);
            self.panel.render(&mut render_pass, panel_split..panel_total);
            self.font.render(&mut render_pass, text_split..text_total);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
