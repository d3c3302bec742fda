// Graphics manager - Presentation state shared by the game engine and the platform shell
//
// The manager owns the device, the context description and every surface
// (game screen, overlay, cursor and OSD). Its operations are split over:
// - `transaction`: mode switches with rollback, feature and mode queries
// - `render`: context notifications, display geometry and frame composition
// - `cursor`: mouse cursor image and coordinate mapping
// - `osd`: message rendering and the cross-thread message queue

pub mod cursor;
pub mod osd;
pub mod render;
pub mod state;
pub mod transaction;

pub use osd::{BlockFont, OsdFont, OsdMessageQueue};
pub use state::{
    Feature, GraphicsMode, GraphicsModeInfo, GraphicsState, TransactionErrors, TransactionMode,
    GRAPHICS_MODES,
};

use crate::clock::{Clock, SystemClock};
use crate::config::PresenterConfig;
use crate::display::{CursorScale, FrameBuffer, Palette, Rect};
use crate::format::PixelFormat;
use crate::gpu::{GlContext, GpuDevice};
use crate::pipeline::{BackBuffer, Pipeline};
use crate::texture::Surface;

/// Number of frames cleared in full after the display area moved
pub(crate) const SCISSOR_OVERRIDE_FRAMES: u32 = 3;

/// Screen change counter start value
const INITIAL_SCREEN_CHANGE_ID: u32 = 1 << 30;

/// Presents a game screen, overlay, cursor and OSD through a `GpuDevice`
pub struct GraphicsManager<D: GpuDevice> {
    device: D,
    ctx: GlContext,
    config: PresenterConfig,
    clock: Box<dyn Clock>,
    pipeline: Option<Pipeline>,
    back_buffer: BackBuffer,

    // Transactions
    current_state: GraphicsState,
    old_state: GraphicsState,
    transaction_mode: TransactionMode,
    screen_change_id: u32,

    // Output geometry
    output_width: u32,
    output_height: u32,
    display: Rect,
    default_format: PixelFormat,
    default_format_alpha: PixelFormat,

    // Game screen
    game_screen: Option<Surface>,
    game_palette: Palette,
    shake_offset: i32,

    // Overlay
    overlay: Option<Surface>,
    overlay_visible: bool,

    // Cursor
    cursor: Option<Surface>,
    cursor_x: i32,
    cursor_y: i32,
    cursor_display_x: i32,
    cursor_display_y: i32,
    cursor_hotspot: (i32, i32),
    cursor_scale: CursorScale,
    cursor_key_color: u32,
    cursor_dont_scale: bool,
    cursor_visible: bool,
    cursor_palette_enabled: bool,
    cursor_palette: Palette,

    force_redraw: bool,
    scissor_override: u32,

    // On-screen display
    osd_queue: OsdMessageQueue,
    osd_message: Option<Surface>,
    osd_alpha: i32,
    osd_fade_start: u64,
    osd_icon: Option<Surface>,
    osd_font: Box<dyn OsdFont>,
}

impl<D: GpuDevice> GraphicsManager<D> {
    /// Create a manager presenting through `device`
    ///
    /// No context exists yet; the platform shell reports it through
    /// `notify_context_create`.
    pub fn new(device: D, config: PresenterConfig) -> Self {
        let state = GraphicsState::new(
            config.video.aspect_ratio_correction,
            config.video.graphics_mode,
        );

        GraphicsManager {
            device,
            ctx: GlContext::new(),
            config,
            clock: Box::new(SystemClock::new()),
            pipeline: None,
            back_buffer: BackBuffer::new(),

            current_state: state,
            old_state: state,
            transaction_mode: TransactionMode::None,
            screen_change_id: INITIAL_SCREEN_CHANGE_ID,

            output_width: 0,
            output_height: 0,
            display: Rect::default(),
            default_format: PixelFormat::native_rgba(),
            default_format_alpha: PixelFormat::native_rgba(),

            game_screen: None,
            game_palette: Palette::new(),
            shake_offset: 0,

            overlay: None,
            overlay_visible: false,

            cursor: None,
            cursor_x: 0,
            cursor_y: 0,
            cursor_display_x: 0,
            cursor_display_y: 0,
            cursor_hotspot: (0, 0),
            cursor_scale: CursorScale::default(),
            cursor_key_color: 0,
            cursor_dont_scale: false,
            cursor_visible: false,
            cursor_palette_enabled: false,
            cursor_palette: Palette::new(),

            force_redraw: false,
            scissor_override: SCISSOR_OVERRIDE_FRAMES,

            osd_queue: OsdMessageQueue::new(),
            osd_message: None,
            osd_alpha: 0,
            osd_fade_start: 0,
            osd_icon: None,
            osd_font: Box::new(BlockFont),
        }
    }

    /// Use `clock` to time the OSD fade
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Render OSD messages with `font`
    pub fn with_font(mut self, font: impl OsdFont + 'static) -> Self {
        self.osd_font = Box::new(font);
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn context(&self) -> &GlContext {
        &self.ctx
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Whether a render pipeline is active, i.e. a context is live
    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Handle for submitting OSD messages from other threads
    pub fn osd_queue(&self) -> OsdMessageQueue {
        self.osd_queue.clone()
    }

    pub fn has_osd_message(&self) -> bool {
        self.osd_message.is_some()
    }

    /// Current OSD message opacity in percent
    pub fn osd_alpha(&self) -> i32 {
        self.osd_alpha
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Area of the output the game screen is drawn into
    pub fn display_area(&self) -> Rect {
        self.display
    }

    pub fn is_redraw_forced(&self) -> bool {
        self.force_redraw
    }

    pub fn default_format(&self) -> PixelFormat {
        self.default_format
    }

    pub fn default_format_alpha(&self) -> PixelFormat {
        self.default_format_alpha
    }

    // ----- Game screen -----

    /// Virtual game width
    pub fn width(&self) -> u32 {
        self.current_state.game_width
    }

    /// Virtual game height
    pub fn height(&self) -> u32 {
        self.current_state.game_height
    }

    /// Copy a block of pixels in the screen format to the game screen
    pub fn copy_rect_to_screen(&mut self, buf: &[u8], pitch: usize, x: u32, y: u32, w: u32, h: u32) {
        if let Some(screen) = self.game_screen.as_mut() {
            screen.copy_rect_to_texture(x, y, w, h, buf, pitch);
        }
    }

    /// Fill the game screen with a raw pixel value
    ///
    /// The value is written as is, which matches palette index semantics on
    /// CLUT8 screens only.
    pub fn fill_screen(&mut self, color: u32) {
        if let Some(screen) = self.game_screen.as_mut() {
            screen.fill(color);
        }
    }

    /// Direct access to the game screen pixels; pair with `unlock_screen`
    pub fn lock_screen(&mut self) -> Option<&mut FrameBuffer> {
        self.game_screen.as_mut().map(Surface::surface_mut)
    }

    pub fn unlock_screen(&mut self) {
        if let Some(screen) = self.game_screen.as_mut() {
            screen.flag_dirty();
        }
    }

    /// Vertical shake offset of the game screen in game pixels
    pub fn set_shake_pos(&mut self, offset: i32) {
        if self.shake_offset != offset {
            self.shake_offset = offset;
            self.force_redraw = true;
        }
    }

    // ----- Palettes -----

    /// Replace game palette entries starting at `start`
    ///
    /// # Arguments
    /// * `colors` - RGB triplets
    /// * `start` - First entry to change
    pub fn set_palette(&mut self, colors: &[u8], start: usize) {
        self.game_palette.set(start, colors);
        if let Some(screen) = self.game_screen.as_mut() {
            screen.set_palette(start, colors);
        }

        // The cursor may share the game palette.
        self.update_cursor_palette();
    }

    /// Copy `num` game palette entries starting at `start` into `colors`
    pub fn grab_palette(&self, colors: &mut [u8], start: usize, num: usize) {
        self.game_palette.grab(colors, start, num);
    }

    // ----- Overlay -----

    pub fn show_overlay(&mut self) {
        self.overlay_visible = true;
        self.force_redraw = true;

        // The overlay covers the whole output.
        self.back_buffer.enable_scissor_test(&mut self.device, false);

        self.set_mouse_position(self.cursor_x, self.cursor_y);
    }

    pub fn hide_overlay(&mut self) {
        self.overlay_visible = false;
        self.force_redraw = true;

        // Back to the game area only; erase the overlay leftovers first.
        self.back_buffer.enable_scissor_test(&mut self.device, true);
        self.scissor_override = SCISSOR_OVERRIDE_FRAMES;

        self.set_mouse_position(self.cursor_x, self.cursor_y);
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn overlay_width(&self) -> u32 {
        self.overlay.as_ref().map_or(0, Surface::width)
    }

    pub fn overlay_height(&self) -> u32 {
        self.overlay.as_ref().map_or(0, Surface::height)
    }

    /// Pixel format of the overlay, the default alpha format
    pub fn overlay_format(&self) -> PixelFormat {
        self.overlay
            .as_ref()
            .map_or(self.default_format_alpha, Surface::format)
    }

    /// Copy a block of pixels in the overlay format to the overlay
    pub fn copy_rect_to_overlay(&mut self, buf: &[u8], pitch: usize, x: u32, y: u32, w: u32, h: u32) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.copy_rect_to_texture(x, y, w, h, buf, pitch);
        }
    }

    /// Make the overlay fully transparent
    pub fn clear_overlay(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.fill(0);
        }
    }

    /// Copy the overlay content into `buf`, rows `pitch` bytes apart
    pub fn grab_overlay(&self, buf: &mut [u8], pitch: usize) {
        if let Some(overlay) = self.overlay.as_ref() {
            overlay.surface().copy_to(buf, pitch);
        }
    }
}

impl<D: GpuDevice> Drop for GraphicsManager<D> {
    /// Hand the hardware resources back while the context still exists
    fn drop(&mut self) {
        if self.ctx.is_ready() {
            self.release_hardware();
        }
    }
}

/// Release the hardware resources of a surface that is being dropped
fn release(device: &mut dyn GpuDevice, surface: Option<Surface>) {
    if let Some(mut surface) = surface {
        surface.destroy(device);
    }
}
