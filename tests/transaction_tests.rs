// Mode-switch transaction scenarios
// These tests drive complete transactions through the public API

mod common;

use common::*;
use gfx_presenter::manager::TransactionMode;
use gfx_presenter::{Capabilities, Feature, GraphicsError, GraphicsMode, PixelFormat, PresenterConfig, SoftwareDevice, TransactionErrors};

#[test]
fn test_rejected_state_rolls_back_to_previous() {
    let mut manager = presenter((640, 480));

    manager.begin_transaction();
    manager.init_size(8192, 200, Some(PixelFormat::RGB565));
    manager.set_feature_state(Feature::AspectRatioCorrection, true);
    assert!(manager.set_graphics_mode(GraphicsMode::Nearest.id()));
    let errors = manager.end_transaction().unwrap();

    // Every field differing from the restored state is reported
    assert_eq!(
        errors,
        TransactionErrors {
            size_change_failed: true,
            format_not_supported: true,
            aspect_ratio_failed: true,
            mode_switch_failed: true,
        }
    );

    assert_eq!(manager.width(), GAME_WIDTH);
    assert_eq!(manager.height(), GAME_HEIGHT);
    assert_eq!(manager.screen_format(), PixelFormat::CLUT8);
    assert!(!manager.get_feature_state(Feature::AspectRatioCorrection));
    assert_eq!(manager.graphics_mode(), GraphicsMode::Linear.id());
    assert_eq!(manager.transaction_mode(), TransactionMode::None);
}

#[test]
fn test_rollback_reports_only_changed_fields() {
    let mut manager = presenter((640, 480));

    manager.begin_transaction();
    manager.init_size(GAME_WIDTH, 8192, None);
    let errors = manager.end_transaction().unwrap();

    assert!(errors.size_change_failed);
    assert!(!errors.format_not_supported);
    assert!(!errors.aspect_ratio_failed);
    assert!(!errors.mode_switch_failed);
}

#[test]
fn test_screen_usable_after_rollback() {
    let mut manager = presenter((640, 400));

    manager.begin_transaction();
    manager.init_size(8192, 8192, None);
    manager.end_transaction().unwrap();

    show_solid_color(&mut manager, [0, 0, 255]);
    let (x, y) = display_center(&manager);
    assert_eq!(rgb_at(&manager, x, y), [0, 0, 255]);
}

#[test]
fn test_size_change_reallocates_screen() {
    let mut manager = presenter((640, 480));
    let before = manager.screen_change_id();

    manager.begin_transaction();
    manager.init_size(640, 480, Some(PixelFormat::RGB565));
    let errors = manager.end_transaction().unwrap();

    assert!(errors.is_success());
    assert_eq!(manager.width(), 640);
    assert_eq!(manager.screen_format(), PixelFormat::RGB565);
    assert_ne!(manager.screen_change_id(), before);
    assert_eq!(manager.display_area().width, 640);
}

#[test]
fn test_no_usable_mode_is_an_error() {
    let device = SoftwareDevice::new(Capabilities::desktop()).with_video_mode_limit(64, 64);
    let mut manager = gfx_presenter::GraphicsManager::new(device, PresenterConfig::default());

    manager.begin_transaction();
    manager.init_size(GAME_WIDTH, GAME_HEIGHT, None);
    assert!(matches!(manager.end_transaction(), Err(GraphicsError::NoUsableMode)));
}

#[test]
fn test_graphics_mode_changes_filtering_only() {
    let mut manager = presenter((640, 480));
    manager.begin_transaction();
    manager.set_graphics_mode(GraphicsMode::Nearest.id());
    let errors = manager.end_transaction().unwrap();

    assert!(errors.is_success());
    assert_eq!(manager.graphics_mode(), GraphicsMode::Nearest.id());
    assert_eq!(manager.width(), GAME_WIDTH);
}

#[test]
fn test_rgb_disabled_offers_only_clut8() {
    let mut config = PresenterConfig::default();
    config.video.rgb_color = false;
    let manager = presenter_with(Capabilities::desktop(), config, (640, 480));

    assert_eq!(manager.supported_formats(), vec![PixelFormat::CLUT8]);
}
