//! Text pipeline. cosmic-text shapes and wraps; FreeType rasterizes glyphs
//! on demand into a single-channel atlas.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cartshelf::ui::{TextAlign, TextCommand};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use freetype::Library;
use freetype::face::LoadFlag;

use crate::gpu::{Projection, QuadPipeline, VertexStream, projection_entry};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

const TEXT_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32x4,
];

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("no usable font found (tried {0:?})")]
    NotFound(Vec<PathBuf>),
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("freetype: {0}")]
    FreeType(#[from] freetype::Error),
}

const ATLAS_SIZE: u32 = 2048;
const ATLAS_PADDING: u32 = 1;
/// Line height as a multiple of the font size.
const LINE_SPACING: f32 = 1.3;
const INITIAL_VERTICES: usize = 6000;

/// Probed in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Where a rasterized glyph sits in the atlas, in physical pixels.
#[derive(Clone, Copy, Default)]
struct AtlasGlyph {
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    uv: [f32; 4],
}

impl AtlasGlyph {
    fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Coverage rows of one rendered glyph, top row first.
struct Coverage {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

struct Upload {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Shelf-packed R8 coverage texture. Glyphs are keyed by glyph id and pixel
/// size and never evicted; once full, new glyphs are dropped with a warning.
struct GlyphAtlas {
    texture: wgpu::Texture,
    glyphs: HashMap<(u16, u32), AtlasGlyph>,
    cursor_x: u32,
    cursor_y: u32,
    shelf_height: u32,
    uploads: Vec<Upload>,
}

impl GlyphAtlas {
    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        Self {
            texture,
            glyphs: HashMap::new(),
            cursor_x: 0,
            cursor_y: 0,
            shelf_height: 0,
            uploads: Vec::new(),
        }
    }

    fn get(&self, key: (u16, u32)) -> Option<AtlasGlyph> {
        self.glyphs.get(&key).copied()
    }

    /// Reserve a `w` x `h` cell. None once the atlas is full.
    fn allocate(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > ATLAS_SIZE {
            return None;
        }
        if self.cursor_x + w + ATLAS_PADDING > ATLAS_SIZE {
            self.cursor_y += self.shelf_height + ATLAS_PADDING;
            self.cursor_x = 0;
            self.shelf_height = 0;
        }
        if self.cursor_y + h > ATLAS_SIZE {
            return None;
        }
        let at = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + ATLAS_PADDING;
        self.shelf_height = self.shelf_height.max(h);
        Some(at)
    }

    fn insert(&mut self, key: (u16, u32), coverage: Coverage) -> Option<AtlasGlyph> {
        let glyph = if coverage.width == 0 || coverage.height == 0 {
            AtlasGlyph::default()
        } else {
            let Some((x, y)) = self.allocate(coverage.width, coverage.height) else {
                log::warn!("glyph atlas full, dropping glyph {} at {}px", key.0, key.1);
                return None;
            };
            let a = ATLAS_SIZE as f32;
            let (w, h) = (coverage.width, coverage.height);
            self.uploads.push(Upload {
                x,
                y,
                width: w,
                height: h,
                pixels: coverage.pixels,
            });
            AtlasGlyph {
                width: w,
                height: h,
                left: coverage.left,
                top: coverage.top,
                uv: [x as f32 / a, y as f32 / a, (x + w) as f32 / a, (y + h) as f32 / a],
            }
        };
        self.glyphs.insert(key, glyph);
        Some(glyph)
    }

    /// Copy newly packed glyphs into the texture.
    fn flush(&mut self, queue: &wgpu::Queue) {
        for up in self.uploads.drain(..) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: up.x,
                        y: up.y,
                        z: 0,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &up.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(up.width),
                    rows_per_image: Some(up.height),
                },
                wgpu::Extent3d {
                    width: up.width,
                    height: up.height,
                    depth_or_array_layers: 1,
                },
            );
        }
    }
}

/// FreeType face kept at whatever pixel size was last requested.
struct Rasterizer {
    _library: Library,
    face: freetype::Face,
    pixel_size: u32,
}

impl Rasterizer {
    fn render(&mut self, glyph_id: u16, size: u32) -> Option<Coverage> {
        if self.pixel_size != size {
            self.face.set_pixel_sizes(0, size).ok()?;
            self.pixel_size = size;
        }
        self.face
            .load_glyph(glyph_id as u32, LoadFlag::RENDER | LoadFlag::TARGET_LIGHT)
            .ok()?;
        let slot = self.face.glyph();
        let bitmap = slot.bitmap();
        let width = bitmap.width().max(0) as u32;
        let height = bitmap.rows().max(0) as u32;

        // Rows may be padded past the width and may run bottom-up.
        let pitch = bitmap.pitch();
        let stride = pitch.unsigned_abs() as usize;
        let buf = bitmap.buffer();
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for row in 0..height as usize {
            let src = if pitch >= 0 { row } else { height as usize - 1 - row };
            let start = src * stride;
            pixels.extend_from_slice(buf.get(start..start + width as usize)?);
        }
        Some(Coverage {
            left: slot.bitmap_left(),
            top: slot.bitmap_top(),
            width,
            height,
            pixels,
        })
    }
}

pub struct FontRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    projection: wgpu::Buffer,
    vertices: VertexStream<TextVertex>,
    atlas: GlyphAtlas,
    rasterizer: Rasterizer,
    font_system: FontSystem,
    family: String,
    scale_factor: f32,
}

impl FontRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        font_path: Option<&Path>,
        scale_factor: f64,
    ) -> Result<Self, FontError> {
        let font_path = find_font(font_path)?;
        let bytes = std::fs::read(&font_path).map_err(|source| FontError::Io {
            path: font_path.clone(),
            source,
        })?;
        log::info!("using font {}", font_path.display());

        let library = Library::init()?;
        let face = library.new_memory_face(Rc::new(bytes.clone()), 0)?;
        let rasterizer = Rasterizer {
            _library: library,
            face,
            pixel_size: 0,
        };

        let mut db = cosmic_text::fontdb::Database::new();
        db.load_font_data(bytes);
        let family = db
            .faces()
            .next()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        let font_system = FontSystem::new_with_locale_and_db("en-US".to_string(), db);

        let atlas = GlyphAtlas::new(device);
        let atlas_view = atlas
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let projection = Projection::buffer(device, "text_projection");

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text_bind_group_layout"),
            entries: &[
                projection_entry(),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: projection.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        let pipeline = QuadPipeline {
            label: "text_pipeline",
            shader: include_str!("text.wgsl"),
            bind_group_layout: &layout,
            vertex_stride: std::mem::size_of::<TextVertex>(),
            attributes: &TEXT_ATTRIBUTES,
        }
        .build(device, format);

        Ok(Self {
            pipeline,
            bind_group,
            projection,
            vertices: VertexStream::new(device, "text_vertices", INITIAL_VERTICES),
            atlas,
            rasterizer,
            font_system,
            family,
            scale_factor: scale_factor as f32,
        })
    }

    /// Glyphs are rasterized at the new density from here on.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor as f32;
    }

    /// Drop last frame's text and project onto `sw` x `sh` logical pixels.
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, sw: f32, sh: f32) {
        self.vertices.clear();
        let projection = Projection::screen(sw, sh);
        queue.write_buffer(&self.projection, 0, bytemuck::bytes_of(&projection));
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.count()
    }

    /// Upload new glyphs and the queued quads. Returns the vertex total.
    pub fn flush(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> u32 {
        self.atlas.flush(queue);
        self.vertices.upload(device, queue)
    }

    fn glyph(&mut self, glyph_id: u16, size: u32) -> Option<AtlasGlyph> {
        let key = (glyph_id, size);
        if let Some(glyph) = self.atlas.get(key) {
            return Some(glyph);
        }
        let coverage = self.rasterizer.render(glyph_id, size)?;
        self.atlas.insert(key, coverage)
    }

    /// Shape and queue one text command. Shaping runs in physical pixels so
    /// glyphs stay crisp; quads are emitted in logical ones.
    pub fn prepare(&mut self, cmd: &TextCommand) {
        if cmd.text.is_empty() || cmd.color[3] <= 0.0 || cmd.font_size < 1.0 {
            return;
        }
        let scale = self.scale_factor;
        let size_px = (cmd.font_size * scale).round().max(1.0);
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics::new(size_px, size_px * LINE_SPACING),
        );
        buffer.set_size(&mut self.font_system, cmd.max_width.map(|w| w * scale), None);
        let attrs = Attrs::new().family(Family::Name(&self.family));
        buffer.set_text(&mut self.font_system, &cmd.text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);

        // Positions first: rasterizing needs `self` mutably.
        let (ox, oy) = (cmd.x * scale, cmd.y * scale);
        let placed: Vec<(u16, i32, i32)> = buffer
            .layout_runs()
            .flat_map(|run| {
                let x = match cmd.align {
                    TextAlign::Left => ox,
                    TextAlign::Center => ox - run.line_w * 0.5,
                };
                let y = oy + run.line_y;
                run.glyphs.iter().map(move |g| {
                    let p = g.physical((x, y), 1.0);
                    (p.cache_key.glyph_id, p.x, p.y)
                })
            })
            .collect();

        let size = size_px as u32;
        let color = cmd.color;
        for (glyph_id, px, py) in placed {
            let Some(g) = self.glyph(glyph_id, size) else {
                continue;
            };
            if g.is_blank() {
                continue;
            }
            let x0 = (px + g.left) as f32 / scale;
            let y0 = (py - g.top) as f32 / scale;
            let x1 = x0 + g.width as f32 / scale;
            let y1 = y0 + g.height as f32 / scale;
            let [u0, v0, u1, v1] = g.uv;
            let corner = |x: f32, y: f32, u: f32, v: f32| TextVertex {
                position: [x, y],
                uv: [u, v],
                color,
            };
            self.vertices.push_quad([
                corner(x0, y0, u0, v0),
                corner(x1, y0, u1, v0),
                corner(x0, y1, u0, v1),
                corner(x1, y1, u1, v1),
            ]);
        }
    }

    /// Draw one layer of the flushed vertices.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>, vertices: Range<u32>) {
        self.vertices
            .draw(pass, &self.pipeline, &self.bind_group, vertices);
    }
}

/// The configured font if given, else the first system font that exists.
fn find_font(configured: Option<&Path>) -> Result<PathBuf, FontError> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    let candidates: Vec<PathBuf> = SYSTEM_FONTS.iter().map(PathBuf::from).collect();
    if let Some(found) = candidates.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }
    Err(FontError::NotFound(candidates))
}
