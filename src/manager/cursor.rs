// Mouse cursor
//
// Positions arrive in physical output pixels. Callers see virtual
// coordinates: overlay pixels while the overlay is shown, game pixels
// otherwise.

use super::{release, GraphicsManager};
use crate::display::{scale_cursor, FrameBuffer};
use crate::error::GraphicsError;
use crate::format::{cross_blit, negotiate, read_pixel, PixelFormat};
use crate::gpu::GpuDevice;
use crate::texture::{create_surface, Surface};

impl<D: GpuDevice> GraphicsManager<D> {
    /// Show or hide the cursor
    ///
    /// # Returns
    /// The previous visibility
    pub fn show_mouse(&mut self, visible: bool) -> bool {
        if self.cursor_visible != visible {
            self.force_redraw = true;
        }

        let last = self.cursor_visible;
        self.cursor_visible = visible;
        last
    }

    pub fn is_mouse_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Move the cursor to a virtual position
    ///
    /// Nothing happens when the current position already maps to the same
    /// virtual coordinate.
    pub fn warp_mouse(&mut self, x: i32, y: i32) {
        let (current_x, current_y) = self.adjust_mouse_position(self.cursor_x, self.cursor_y);
        if current_x == x && current_y == y {
            return;
        }

        let (virtual_width, virtual_height) = if self.overlay_visible {
            match self.overlay.as_ref() {
                Some(overlay) => (overlay.width(), overlay.height()),
                None => return,
            }
        } else {
            match self.game_screen.as_ref() {
                Some(screen) => (screen.width(), screen.height()),
                None => return,
            }
        };
        if virtual_width == 0 || virtual_height == 0 {
            return;
        }

        let x = (x as i64 * self.output_width as i64 / virtual_width as i64) as i32;
        let y = (y as i64 * self.output_height as i64 / virtual_height as i64) as i32;
        self.set_mouse_position(x, y);
    }

    /// Map a physical output position to virtual coordinates
    pub fn adjust_mouse_position(&self, x: i32, y: i32) -> (i32, i32) {
        if self.output_width == 0 || self.output_height == 0 {
            return (x, y);
        }

        let virtual_size = if self.overlay_visible {
            self.overlay.as_ref().map(|o| (o.width(), o.height()))
        } else {
            self.game_screen.as_ref().map(|s| (s.width(), s.height()))
        };

        match virtual_size {
            Some((width, height)) => (
                (x as i64 * width as i64 / self.output_width as i64) as i32,
                (y as i64 * height as i64 / self.output_height as i64) as i32,
            ),
            None => (x, y),
        }
    }

    /// Record the physical cursor position reported by the platform
    pub fn set_mouse_position(&mut self, x: i32, y: i32) {
        if self.cursor_x != x || self.cursor_y != y {
            self.force_redraw = true;
        }

        self.cursor_x = x;
        self.cursor_y = y;

        if self.overlay_visible || self.output_width == 0 || self.output_height == 0 {
            self.cursor_display_x = x;
            self.cursor_display_y = y;
        } else {
            let display = self.display;
            self.cursor_display_x = display.x
                + (x as i64 * display.width as i64 / self.output_width as i64) as i32;
            self.cursor_display_y = display.y
                + (y as i64 * display.height as i64 / self.output_height as i64) as i32;
        }
    }

    /// Physical cursor position
    pub fn mouse_position(&self) -> (i32, i32) {
        (self.cursor_x, self.cursor_y)
    }

    /// Position the cursor hotspot is drawn at
    pub fn cursor_display_position(&self) -> (i32, i32) {
        (self.cursor_display_x, self.cursor_display_y)
    }

    /// Replace the cursor image
    ///
    /// # Arguments
    /// * `buf` - Pixels in `format`, rows `w` pixels wide
    /// * `hotspot_x` / `hotspot_y` - Hotspot in cursor pixels
    /// * `key_color` - Transparent color (palette index for CLUT8)
    /// * `dont_scale` - Keep the native size instead of following the game scale
    /// * `format` - Pixel format of `buf`, CLUT8 when missing
    #[allow(clippy::too_many_arguments)]
    pub fn set_mouse_cursor(
        &mut self,
        buf: &[u8],
        w: u32,
        h: u32,
        hotspot_x: i32,
        hotspot_y: i32,
        key_color: u32,
        dont_scale: bool,
        format: Option<PixelFormat>,
    ) -> Result<(), GraphicsError> {
        let input_format = format.unwrap_or(PixelFormat::CLUT8);

        // CLUT8 keys through the alpha of the expanded palette; other
        // formats are used as is only when they carry alpha.
        let usable_directly = input_format.is_clut8()
            || (input_format.a_bits() > 0 && negotiate(&input_format, self.ctx.profile()).is_some());
        let texture_format = if usable_directly {
            input_format
        } else {
            self.default_format_alpha
        };

        if !matches!(self.cursor.as_ref(), Some(c) if c.format() == texture_format) {
            release(&mut self.device, self.cursor.take());

            let mut cursor = create_surface(
                texture_format,
                true,
                &self.ctx,
                self.default_format,
                self.default_format_alpha,
            )
            .ok_or(GraphicsError::UnsupportedSurfaceFormat(texture_format))?;
            cursor.enable_linear_filtering(&mut self.device, self.current_state.graphics_mode.is_linear());
            self.cursor = Some(cursor);
        }

        self.cursor_key_color = key_color;
        self.cursor_hotspot = (hotspot_x, hotspot_y);
        self.cursor_dont_scale = dont_scale;

        if let Some(cursor) = self.cursor.as_mut() {
            cursor.allocate(w, h);
            if input_format.is_clut8() {
                cursor.copy_rect_to_texture(0, 0, w, h, buf, w as usize);
            } else {
                blit_keyed(cursor, buf, w, h, &input_format, key_color);
            }
        }

        if input_format.is_clut8() {
            self.update_cursor_palette();
        }

        self.recalculate_cursor_scaling();
        Ok(())
    }

    /// Give the cursor its own palette, enabling it
    pub fn set_cursor_palette(&mut self, colors: &[u8], start: usize) {
        self.cursor_palette_enabled = true;
        self.cursor_palette.set(start, colors);
        self.update_cursor_palette();
    }

    /// Push the active palette and color key to a palette indexed cursor
    pub(crate) fn update_cursor_palette(&mut self) {
        let Some(cursor) = self.cursor.as_mut().filter(|c| c.has_palette()) else {
            return;
        };

        let palette = if self.cursor_palette_enabled {
            &self.cursor_palette
        } else {
            &self.game_palette
        };
        cursor.set_palette(0, palette.as_bytes());
        cursor.set_color_key(self.cursor_key_color as u8);
    }

    /// Follow the game scale with the cursor size and hotspot
    pub(crate) fn recalculate_cursor_scaling(&mut self) {
        let (Some(cursor), Some(screen)) = (self.cursor.as_ref(), self.game_screen.as_ref()) else {
            return;
        };

        self.cursor_scale = scale_cursor(
            self.cursor_hotspot,
            (cursor.width(), cursor.height()),
            &self.display,
            (screen.width(), screen.height()),
            self.cursor_dont_scale,
        );
    }

    /// Cursor surface content, for inspection
    pub fn cursor_surface(&self) -> Option<&FrameBuffer> {
        self.cursor.as_ref().map(Surface::surface)
    }
}

/// Convert a cursor image into the surface and clear the alpha of every
/// pixel whose source value equals `key_color`
fn blit_keyed(cursor: &mut Surface, buf: &[u8], w: u32, h: u32, input_format: &PixelFormat, key_color: u32) {
    let src_bpp = input_format.bytes_per_pixel as usize;
    let src_pitch = w as usize * src_bpp;

    let dst = cursor.surface_mut();
    let dst_format = dst.format();
    let dst_pitch = dst.pitch();
    if !cross_blit(
        dst.as_mut_slice(),
        dst_pitch,
        &dst_format,
        buf,
        src_pitch,
        input_format,
        w as usize,
        h as usize,
    ) {
        log::warn!("Cannot convert cursor from {} to {}", input_format, dst_format);
    }

    let alpha_mask = dst_format.alpha_mask();
    for y in 0..h {
        for x in 0..w {
            let offset = y as usize * src_pitch + x as usize * src_bpp;
            if read_pixel(&buf[offset..], input_format.bytes_per_pixel) == key_color {
                let pixel = dst.get_pixel(x, y);
                dst.set_pixel(x, y, pixel & !alpha_mask);
            }
        }
    }

    cursor.flag_dirty();
}
