// Window module - Demo shell for the presenter
//
// Drives a `GraphicsManager` backed by the software device and shows its
// output through winit and pixels. The shell plays the platform role:
// it reports the context and output size and forwards mouse and keys.

use super::{FrameBuffer, Palette};
use crate::config::PresenterConfig;
use crate::error::GraphicsError;
use crate::format::PixelFormat;
use crate::gpu::{Capabilities, SoftwareDevice};
use crate::manager::{Feature, GraphicsManager, GraphicsMode};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Target frame rate of the demo
const TARGET_FPS: u64 = 60;

/// Initial window scale relative to the game screen
const WINDOW_SCALE: u32 = 3;

/// Cursor image size
const CURSOR_SIZE: u32 = 12;

type Manager = GraphicsManager<SoftwareDevice>;

/// Demo window presenting an animated test pattern
pub struct DemoWindow {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    manager: Manager,
    phase: u32,
    last_frame_time: Instant,
}

impl DemoWindow {
    /// Set up the presenter with a CLUT8 game screen and an arrow cursor
    pub fn new(config: PresenterConfig) -> Result<Self, GraphicsError> {
        let (game_width, game_height) = (config.video.game_width, config.video.game_height);
        let mut manager = GraphicsManager::new(SoftwareDevice::new(Capabilities::desktop()), config);

        manager.notify_context_create(PixelFormat::native_rgba(), PixelFormat::native_rgba())?;
        // Provisional output size until the window reports its own
        manager.set_actual_screen_size(game_width * WINDOW_SCALE, game_height * WINDOW_SCALE)?;

        manager.begin_transaction();
        manager.init_size(game_width, game_height, None);
        let errors = manager.end_transaction()?;
        if !errors.is_success() {
            log::warn!("Initial mode partly rejected: {:?}", errors);
        }

        manager.set_palette(Palette::ramp().as_bytes(), 0);
        manager.set_mouse_cursor(&arrow_cursor(), CURSOR_SIZE, CURSOR_SIZE, 0, 0, 0, false, None)?;
        // Index 0 is the key color, 1 the fill, 2 the outline.
        manager.set_cursor_palette(&[0, 0, 0, 255, 255, 255, 0, 0, 0], 0);
        manager.show_mouse(true);

        Ok(Self {
            window: None,
            pixels: None,
            manager,
            phase: 0,
            last_frame_time: Instant::now(),
        })
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    /// Follow a new window size
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), Box<dyn std::error::Error>> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        self.manager.set_actual_screen_size(size.width, size.height)?;
        Ok(())
    }

    /// Animate the game screen, compose and show the frame
    fn render(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.phase = self.phase.wrapping_add(1);
        if let Some(screen) = self.manager.lock_screen() {
            screen.test_pattern(self.phase);
        }
        self.manager.unlock_screen();

        self.manager.update_screen()?;

        if let Some(pixels) = &mut self.pixels {
            let frame = pixels.frame_mut();
            let composed = self.manager.device().frame();
            if frame.len() == composed.len() {
                frame.copy_from_slice(composed);
            }
            pixels.render()?;
        }
        Ok(())
    }

    /// Check if enough time has passed for the next frame
    fn should_render_frame(&mut self) -> bool {
        let frame_duration = Duration::from_micros(1_000_000 / TARGET_FPS);
        if self.last_frame_time.elapsed() >= frame_duration {
            self.last_frame_time = Instant::now();
            true
        } else {
            false
        }
    }

    /// Run `change` inside a mode-switch transaction
    fn transaction(&mut self, change: impl FnOnce(&mut Manager)) -> Result<(), GraphicsError> {
        self.manager.begin_transaction();
        change(&mut self.manager);
        let errors = self.manager.end_transaction()?;
        if !errors.is_success() {
            log::warn!("Mode change rejected: {:?}", errors);
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::F9 => {
                let path = self.manager.capture_screenshot()?;
                self.manager
                    .display_message_on_osd(&format!("Screenshot saved\n{}", path.display()));
            }
            KeyCode::KeyO => {
                if self.manager.is_overlay_visible() {
                    self.manager.hide_overlay();
                } else {
                    self.draw_overlay_panel();
                    self.manager.show_overlay();
                }
            }
            KeyCode::KeyM => {
                let (width, height) = (self.manager.width(), self.manager.height());
                self.manager
                    .display_message_on_osd(&format!("Game screen\n{}x{}", width, height));
            }
            KeyCode::KeyA => {
                let enable = !self.manager.get_feature_state(Feature::AspectRatioCorrection);
                self.transaction(|m| m.set_feature_state(Feature::AspectRatioCorrection, enable))?;
                let state = if enable { "on" } else { "off" };
                self.manager
                    .display_message_on_osd(&format!("Aspect ratio correction {}", state));
            }
            KeyCode::KeyN => {
                self.transaction(|m| {
                    m.set_graphics_mode(GraphicsMode::Nearest.id());
                })?;
                self.manager.display_message_on_osd("Filtering: nearest");
            }
            KeyCode::KeyL => {
                self.transaction(|m| {
                    m.set_graphics_mode(GraphicsMode::Linear.id());
                })?;
                self.manager.display_message_on_osd("Filtering: linear");
            }
            KeyCode::KeyI => {
                if self.manager.has_osd_icon() {
                    self.manager.display_activity_icon_on_osd(None)?;
                } else {
                    let mut icon = FrameBuffer::new(16, 16, PixelFormat::native_rgba());
                    icon.fill(PixelFormat::native_rgba().argb_to_color(200, 255, 160, 0));
                    self.manager.display_activity_icon_on_osd(Some(&icon))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Fill the overlay with a translucent panel
    fn draw_overlay_panel(&mut self) {
        let format = self.manager.overlay_format();
        let (width, height) = (self.manager.overlay_width(), self.manager.overlay_height());
        if width == 0 || height == 0 {
            return;
        }

        let mut panel = FrameBuffer::new(width, height, format);
        panel.fill(format.argb_to_color(96, 0, 0, 64));
        let border = format.argb_to_color(255, 255, 255, 255);
        for x in 0..width {
            panel.set_pixel(x, 0, border);
            panel.set_pixel(x, height - 1, border);
        }
        for y in 0..height {
            panel.set_pixel(0, y, border);
            panel.set_pixel(width - 1, y, border);
        }

        self.manager
            .copy_rect_to_overlay(panel.as_slice(), panel.pitch(), 0, 0, width, height);
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = (
            self.manager.width() * WINDOW_SCALE,
            self.manager.height() * WINDOW_SCALE,
        );
        let window_attributes = Window::default_attributes()
            .with_title(format!("gfx-presenter - {}x{}", self.manager.width(), self.manager.height()))
            .with_inner_size(PhysicalSize::new(width, height));

        // Wrap window in Arc for shared ownership
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();

        // Create surface texture using Arc<Window> for safe 'static lifetime
        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        let pixels = Pixels::new(size.width, size.height, surface_texture)?;

        self.window = Some(window);
        self.pixels = Some(pixels);
        self.manager.set_actual_screen_size(size.width, size.height)?;
        Ok(())
    }
}

impl ApplicationHandler for DemoWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.create_window(event_loop) {
            log::error!("Failed to create window: {}", err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let result = match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::CursorMoved { position, .. } => {
                self.manager
                    .set_mouse_position(position.x as i32, position.y as i32);
                Ok(())
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code),
            WindowEvent::RedrawRequested => {
                let result = if self.should_render_frame() {
                    self.render()
                } else {
                    Ok(())
                };

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                result
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            log::error!("{}", err);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Palette indexed arrow: 0 transparent, 1 fill, 2 outline
fn arrow_cursor() -> Vec<u8> {
    let mut pixels = vec![0u8; (CURSOR_SIZE * CURSOR_SIZE) as usize];
    for y in 0..CURSOR_SIZE {
        for x in 0..=y.min(CURSOR_SIZE - 1) {
            let edge = x == 0 || x == y || y == CURSOR_SIZE - 1;
            pixels[(y * CURSOR_SIZE + x) as usize] = if edge { 2 } else { 1 };
        }
    }
    pixels
}

/// Create and run the demo window
///
/// Keys: F9 screenshot, O overlay, M message, A aspect correction,
/// N/L nearest/linear filtering, I activity icon.
pub fn run_demo(config: PresenterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut demo = DemoWindow::new(config)?;

    log::info!(
        "Starting demo: game screen {}x{}",
        demo.manager().width(),
        demo.manager().height()
    );

    event_loop.run_app(&mut demo)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_cursor_shape() {
        let arrow = arrow_cursor();
        assert_eq!(arrow[0], 2);
        assert_eq!(arrow[1], 0);
        let mid = (5 * CURSOR_SIZE + 2) as usize;
        assert_eq!(arrow[mid], 1);
    }

    #[test]
    fn test_demo_starts_with_cursor() {
        let demo = DemoWindow::new(PresenterConfig::default()).unwrap();
        assert!(demo.manager().is_mouse_visible());
        assert_eq!(demo.manager().width(), 320);
    }
}
