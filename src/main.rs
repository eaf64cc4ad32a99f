use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

use cartshelf::app::Showcase;
use cartshelf::config::{Settings, load_settings};
use cartshelf::storage::{FileBackend, Preferences};
use cartshelf::ui::input::SCROLL_SPEED;
use cartshelf::ui::keybindings::ModifierFlags;
use cartshelf::ui::{self, DrawList, KeyCombo, Size};

mod font;
mod gpu;
mod panel;
mod render;

use render::Renderer;

const SETTINGS_PATH: &str = "data/settings.ron";

struct App {
    settings: Settings,
    /// Taken by `Showcase::boot` once the window exists.
    prefs: Option<Preferences>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    showcase: Option<Showcase>,
    draw_list: DrawList,
    scale_factor: f64,
    modifiers: ModifiersState,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window_width as f64,
                self.settings.window_height as f64,
            ));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        self.scale_factor = window.scale_factor();

        let renderer = match Renderer::new(window.clone(), self.settings.font_path.as_deref()) {
            Ok(r) => r,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        };
        let (w, h) = renderer.logical_size();

        let Some(prefs) = self.prefs.take() else {
            return;
        };
        match Showcase::boot(&self.settings, prefs, Size::new(w, h), Instant::now()) {
            Ok(showcase) => self.showcase = Some(showcase),
            Err(e) => {
                log::error!("boot failed: {e}");
                std::process::exit(1);
            }
        }

        window.request_redraw();
        self.renderer = Some(renderer);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(showcase) = self.showcase.as_mut() else {
            if let WindowEvent::CloseRequested = event {
                event_loop.exit();
            }
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                showcase.shutdown();
                event_loop.exit();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let x = (position.x / self.scale_factor) as f32;
                let y = (position.y / self.scale_factor) as f32;
                showcase.pointer_moved(x, y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => ui::MouseButton::Left,
                    MouseButton::Right => ui::MouseButton::Right,
                    MouseButton::Middle => ui::MouseButton::Middle,
                    _ => return,
                };
                match state {
                    ElementState::Pressed => showcase.pointer_pressed(button),
                    ElementState::Released => showcase.pointer_released(button, Instant::now()),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * SCROLL_SPEED,
                    MouseScrollDelta::PixelDelta(pos) => -(pos.y / self.scale_factor) as f32,
                };
                showcase.scroll(dy);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(key) = event.physical_key {
                    let combo = KeyCombo {
                        modifiers: ModifierFlags {
                            shift: self.modifiers.shift_key(),
                            ctrl: self.modifiers.control_key(),
                            alt: self.modifiers.alt_key(),
                        },
                        key,
                    };
                    showcase.key_pressed(combo, Instant::now());
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                    let (w, h) = renderer.logical_size();
                    showcase.resize(Size::new(w, h));
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.set_scale_factor(scale_factor);
                    let (w, h) = renderer.logical_size();
                    showcase.resize(Size::new(w, h));
                }
            }
            WindowEvent::RedrawRequested => {
                showcase.frame(Instant::now());
                self.draw_list.clear();
                showcase.draw(&mut self.draw_list);
                if let Some(renderer) = self.renderer.as_mut() {
                    let clear = showcase.theme().background;
                    renderer.render(&self.draw_list, clear);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let settings = load_settings(SETTINGS_PATH);
    let prefs_path = settings
        .preferences_path
        .clone()
        .unwrap_or_else(FileBackend::default_path);
    log::info!("preferences at {}", prefs_path.display());
    let prefs = Preferences::open(FileBackend::new(prefs_path));

    let event_loop = EventLoop::new().expect("create event loop");
    let mut app = App {
        settings,
        prefs: Some(prefs),
        window: None,
        renderer: None,
        showcase: None,
        draw_list: DrawList::new(),
        scale_factor: 1.0,
        modifiers: ModifiersState::empty(),
    };
    event_loop.run_app(&mut app).expect("run event loop");
}
