// Frame composition scenarios
// These tests compose complete frames on the software device and inspect
// the output pixels

mod common;

use common::*;
use gfx_presenter::{Capabilities, Feature, PixelFormat, PresenterConfig, Rect};

#[test]
fn test_letterbox_bars_stay_black() {
    let mut manager = presenter((640, 480));
    show_solid_color(&mut manager, [255, 0, 0]);

    assert_eq!(manager.display_area(), Rect::new(0, 40, 640, 400));
    assert_eq!(rgb_at(&manager, 320, 240), [255, 0, 0]);
    assert_eq!(rgb_at(&manager, 320, 10), [0, 0, 0]);
    assert_eq!(rgb_at(&manager, 320, 470), [0, 0, 0]);
}

#[test]
fn test_aspect_correction_fills_four_by_three_output() {
    let mut manager = presenter((800, 600));
    manager.begin_transaction();
    manager.set_feature_state(Feature::AspectRatioCorrection, true);
    assert!(manager.end_transaction().unwrap().is_success());

    assert_eq!(manager.display_area(), Rect::new(0, 0, 800, 600));
}

#[test]
fn test_pillarbox_on_wide_output() {
    let manager = presenter((1920, 1080));
    assert_eq!(manager.display_area(), Rect::new(96, 0, 1728, 1080));
}

#[test]
fn test_fixed_function_pipeline_composes() {
    let mut config = PresenterConfig::default();
    config.rendering.disable_shaders = true;
    let mut manager = presenter_with(Capabilities::desktop(), config, (640, 400));
    show_solid_color(&mut manager, [0, 128, 255]);

    let (x, y) = display_center(&manager);
    assert_eq!(rgb_at(&manager, x, y), [0, 128, 255]);
}

#[test]
fn test_embedded_profiles_compose() {
    for caps in [Capabilities::embedded(), Capabilities::embedded2()] {
        let mut manager = presenter_with(caps, PresenterConfig::default(), (640, 400));
        show_solid_color(&mut manager, [10, 200, 30]);

        let (x, y) = display_center(&manager);
        assert_eq!(rgb_at(&manager, x, y), [10, 200, 30], "{:?}", caps.profile);
    }
}

#[test]
fn test_clean_frame_uploads_nothing() {
    let mut manager = presenter((640, 480));
    manager.copy_rect_to_screen(&[3; 16], 4, 10, 10, 4, 4);
    manager.update_screen().unwrap();
    assert!(manager.device().stats().uploads >= 1);

    manager.device_mut().reset_stats();
    manager.update_screen().unwrap();
    manager.update_screen().unwrap();
    let stats = manager.device().stats();
    assert_eq!(stats.uploads, 0);
    assert_eq!(stats.presents, 0);
}

#[test]
fn test_palette_change_redraws() {
    let mut manager = presenter((640, 400));
    show_solid_color(&mut manager, [255, 0, 0]);

    manager.set_palette(&[0, 0, 255], 1);
    manager.update_screen().unwrap();

    let (x, y) = display_center(&manager);
    assert_eq!(rgb_at(&manager, x, y), [0, 0, 255]);

    let mut grabbed = [0u8; 3];
    manager.grab_palette(&mut grabbed, 1, 1);
    assert_eq!(grabbed, [0, 0, 255]);
}

#[test]
fn test_overlay_covers_output() {
    let mut manager = presenter((640, 480));
    show_solid_color(&mut manager, [255, 0, 0]);

    let format = manager.overlay_format();
    let (width, height) = (manager.overlay_width(), manager.overlay_height());
    let pitch = width as usize * format.bytes_per_pixel as usize;
    let mut panel = Vec::with_capacity(pitch * height as usize);
    let blue = format.argb_to_color(255, 0, 0, 255);
    for _ in 0..width * height {
        panel.extend_from_slice(&blue.to_ne_bytes()[..format.bytes_per_pixel as usize]);
    }
    manager.copy_rect_to_overlay(&panel, pitch, 0, 0, width, height);
    manager.show_overlay();
    manager.update_screen().unwrap();

    // The letterbox is covered as well
    assert_eq!(rgb_at(&manager, 320, 240), [0, 0, 255]);
    assert_eq!(rgb_at(&manager, 320, 10), [0, 0, 255]);

    manager.hide_overlay();
    manager.update_screen().unwrap();
    assert_eq!(rgb_at(&manager, 320, 240), [255, 0, 0]);
    assert_eq!(rgb_at(&manager, 320, 10), [0, 0, 0]);
}

#[test]
fn test_cursor_drawn_with_own_palette() {
    let mut manager = presenter((640, 480));
    show_solid_color(&mut manager, [255, 0, 0]);

    let image = [2u8; 16];
    manager
        .set_mouse_cursor(&image, 4, 4, 0, 0, 0, false, None)
        .unwrap();
    manager.set_cursor_palette(&[0, 0, 0, 0, 0, 0, 0, 255, 0], 0);
    manager.show_mouse(true);
    manager.set_mouse_position(320, 240);
    manager.update_screen().unwrap();

    assert_eq!(manager.cursor_display_position(), (320, 240));
    // 4x4 cursor doubled along with the game screen
    assert_eq!(rgb_at(&manager, 323, 243), [0, 255, 0]);
    assert_eq!(rgb_at(&manager, 330, 250), [255, 0, 0]);
}

#[test]
fn test_keyed_cursor_pixels_are_transparent() {
    let mut manager = presenter((640, 480));
    show_solid_color(&mut manager, [255, 0, 0]);

    let image = [0u8; 16];
    manager
        .set_mouse_cursor(&image, 4, 4, 0, 0, 0, false, None)
        .unwrap();
    manager.set_cursor_palette(&[0, 255, 0], 0);
    manager.show_mouse(true);
    manager.set_mouse_position(320, 240);
    manager.update_screen().unwrap();

    assert_eq!(rgb_at(&manager, 323, 243), [255, 0, 0]);
}

#[test]
fn test_warp_while_overlay_uses_overlay_coordinates() {
    let mut manager = presenter((640, 480));
    manager.show_overlay();

    let (width, height) = (manager.overlay_width(), manager.overlay_height());
    assert_eq!((width, height), (640, 480));
    manager.warp_mouse(100, 50);
    assert_eq!(manager.mouse_position(), (100, 50));
    assert_eq!(manager.adjust_mouse_position(100, 50), (100, 50));

    manager.update_screen().unwrap();
    manager.warp_mouse(100, 50);
    assert!(!manager.is_redraw_forced());
}

#[test]
fn test_context_loss_restores_frame() {
    let mut manager = presenter_with(Capabilities::embedded2(), PresenterConfig::default(), (640, 480));
    show_solid_color(&mut manager, [40, 80, 120]);

    manager.notify_context_destroy();
    manager.device_mut().lose_context();
    manager.update_screen().unwrap();

    manager
        .notify_context_create(PixelFormat::native_rgba(), PixelFormat::native_rgba())
        .unwrap();
    manager.update_screen().unwrap();

    let (x, y) = display_center(&manager);
    assert_eq!(rgb_at(&manager, x, y), [40, 80, 120]);
}

#[test]
fn test_shake_moves_game_screen() {
    let mut manager = presenter((640, 400));
    show_solid_color(&mut manager, [255, 255, 255]);

    manager.set_shake_pos(10);
    manager.update_screen().unwrap();

    // 10 game lines are 20 output lines
    assert_eq!(rgb_at(&manager, 320, 5), [0, 0, 0]);
    assert_eq!(rgb_at(&manager, 320, 25), [255, 255, 255]);
}
