// Common test utilities for presenter integration tests
//
// Builds managers on the software device in a known state so the
// scenarios can inspect the composed frame pixel by pixel.

#![allow(dead_code)]

use gfx_presenter::{Capabilities, GraphicsManager, PixelFormat, PresenterConfig, SoftwareDevice};

/// Game screen size used by most scenarios
pub const GAME_WIDTH: u32 = 320;
pub const GAME_HEIGHT: u32 = 200;

pub type Presenter = GraphicsManager<SoftwareDevice>;

/// Create a manager with a live context and an output of the given size
///
/// No game mode is set yet.
pub fn presenter_without_mode(caps: Capabilities, config: PresenterConfig, output: (u32, u32)) -> Presenter {
    let mut manager = GraphicsManager::new(SoftwareDevice::new(caps), config);
    manager
        .notify_context_create(PixelFormat::native_rgba(), PixelFormat::native_rgba())
        .expect("context creation");
    manager
        .set_actual_screen_size(output.0, output.1)
        .expect("output size");
    manager
}

/// Create a manager showing a 320x200 CLUT8 screen
pub fn presenter_with(caps: Capabilities, config: PresenterConfig, output: (u32, u32)) -> Presenter {
    let mut manager = presenter_without_mode(caps, config, output);
    manager.begin_transaction();
    manager.init_size(GAME_WIDTH, GAME_HEIGHT, None);
    let errors = manager.end_transaction().expect("first mode");
    assert!(errors.is_success(), "first mode rejected: {:?}", errors);
    manager
}

/// Desktop manager with default configuration
pub fn presenter(output: (u32, u32)) -> Presenter {
    presenter_with(Capabilities::desktop(), PresenterConfig::default(), output)
}

/// Fill the game screen with one palette color and compose a frame
pub fn show_solid_color(manager: &mut Presenter, rgb: [u8; 3]) {
    manager.set_palette(&rgb, 1);
    manager.fill_screen(1);
    manager.update_screen().expect("frame");
}

/// Center of the display area in output pixels
pub fn display_center(manager: &Presenter) -> (u32, u32) {
    let display = manager.display_area();
    (
        (display.x + display.width as i32 / 2) as u32,
        (display.y + display.height as i32 / 2) as u32,
    )
}

/// RGB channels of an output pixel
pub fn rgb_at(manager: &Presenter, x: u32, y: u32) -> [u8; 3] {
    let [r, g, b, _] = manager.device().pixel(x, y);
    [r, g, b]
}
