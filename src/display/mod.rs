// Display module - CPU rasters and output geometry
//
// This module provides:
// - Frame buffer in any supported pixel format (the surfaces' CPU mirror)
// - 256-entry game and cursor palettes
// - Display area, scissor, overlay and cursor geometry
// - A demo window driving the presenter through winit + pixels

pub mod framebuffer;
pub mod geometry;
pub mod palette;
#[cfg(feature = "window")]
pub mod window;

pub use framebuffer::FrameBuffer;
pub use geometry::{
    compute_display_area, desired_game_aspect, overlay_size, scale_cursor, scissor_box, Aspect,
    CursorScale, Rect, ScissorBox,
};
pub use palette::{Palette, PALETTE_SIZE};
#[cfg(feature = "window")]
pub use window::{run_demo, DemoWindow};
