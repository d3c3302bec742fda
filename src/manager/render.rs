// Context lifecycle, display geometry and frame composition

use super::osd::{message_alpha, render_message};
use super::{release, GraphicsManager, SCISSOR_OVERRIDE_FRAMES};
use crate::display::{compute_display_area, desired_game_aspect, overlay_size, scissor_box, FrameBuffer};
use crate::error::GraphicsError;
use crate::format::PixelFormat;
use crate::gpu::GpuDevice;
use crate::pipeline::Pipeline;
use crate::screenshot::{self, ScreenshotError, ScreenshotFormat};
use crate::texture::{create_surface, Surface};
use std::fs;
use std::path::{Path, PathBuf};

impl<D: GpuDevice> GraphicsManager<D> {
    // ----- Context lifecycle -----

    /// The platform created a graphics context
    ///
    /// # Arguments
    /// * `default_format` - Preferred format for opaque surfaces
    /// * `default_format_alpha` - Preferred format for surfaces with alpha
    pub fn notify_context_create(
        &mut self,
        default_format: PixelFormat,
        default_format_alpha: PixelFormat,
    ) -> Result<(), GraphicsError> {
        self.ctx.initialize(self.device.capabilities());

        if let Some(old) = self.pipeline.take() {
            old.destroy(&mut self.device);
        }
        let mut pipeline = Pipeline::select(&self.ctx, self.config.rendering.disable_shaders, &mut self.device)?;
        pipeline.set_color(&mut self.device, 1.0, 1.0, 1.0, 1.0);

        self.back_buffer.set_clear_color(&mut self.device, [0.0; 4]);
        // Overlay and cursor are alpha blended.
        self.back_buffer.enable_blend(&mut self.device, true);
        self.back_buffer.enable_scissor_test(&mut self.device, !self.overlay_visible);
        pipeline.set_framebuffer(&mut self.device, &mut self.back_buffer);
        self.pipeline = Some(pipeline);

        // Clear everything for a few frames to remove leftovers.
        self.scissor_override = SCISSOR_OVERRIDE_FRAMES;

        self.default_format = default_format;
        self.default_format_alpha = default_format_alpha;

        if self.output_width != 0 && self.output_height != 0 {
            self.set_actual_screen_size(self.output_width, self.output_height)?;
        }

        let ctx = &self.ctx;
        for surface in [
            &mut self.game_screen,
            &mut self.overlay,
            &mut self.cursor,
            &mut self.osd_message,
            &mut self.osd_icon,
        ]
        .into_iter()
        .flatten()
        {
            surface.recreate(&mut self.device, ctx)?;
        }

        self.force_redraw = true;
        log::info!(
            "Graphics context created ({:?}, {} pipeline)",
            self.ctx.profile(),
            if self.pipeline.as_ref().is_some_and(Pipeline::is_shader) {
                "shader"
            } else {
                "fixed-function"
            }
        );
        Ok(())
    }

    /// The platform is about to destroy the graphics context
    ///
    /// Surface content stays in memory and is uploaded again once a new
    /// context is reported.
    pub fn notify_context_destroy(&mut self) {
        self.release_hardware();
        self.back_buffer.deactivate();
        self.ctx.reset();

        log::info!("Graphics context destroyed");
    }

    /// Free every texture and program owned by the surfaces and pipeline
    pub(crate) fn release_hardware(&mut self) {
        for surface in [
            &mut self.game_screen,
            &mut self.overlay,
            &mut self.cursor,
            &mut self.osd_message,
            &mut self.osd_icon,
        ]
        .into_iter()
        .flatten()
        {
            surface.destroy(&mut self.device);
        }

        if let Some(pipeline) = self.pipeline.take() {
            pipeline.destroy(&mut self.device);
        }
    }

    // ----- Geometry -----

    /// The output window changed size
    pub fn set_actual_screen_size(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        self.output_width = width;
        self.output_height = height;
        self.back_buffer.set_dimensions(&mut self.device, width, height);

        if self.ctx.is_ready() {
            let (overlay_width, overlay_height) = overlay_size(
                width,
                height,
                self.ctx.max_texture_size(),
                (self.config.overlay.min_width, self.config.overlay.min_height),
            );

            let format = self.default_format_alpha;
            if !matches!(self.overlay.as_ref(), Some(o) if o.format() == format) {
                release(&mut self.device, self.overlay.take());

                let mut overlay = create_surface(format, false, &self.ctx, self.default_format, format)
                    .ok_or(GraphicsError::UnsupportedSurfaceFormat(format))?;
                // Always smooth: the overlay may be scaled to the output.
                overlay.enable_linear_filtering(&mut self.device, true);
                self.overlay = Some(overlay);
            }

            if let Some(overlay) = self.overlay.as_mut() {
                overlay.allocate(overlay_width, overlay_height);
                overlay.fill(0);
            }
        }

        self.recalculate_display_area();
        self.recalculate_cursor_scaling();

        self.screen_change_id = self.screen_change_id.wrapping_add(1);
        log::debug!("Output size {}x{}", width, height);
        Ok(())
    }

    /// Fit the game screen into the output
    pub(crate) fn recalculate_display_area(&mut self) {
        let Some(screen) = self.game_screen.as_ref() else {
            return;
        };
        if self.output_height == 0 {
            return;
        }

        let desired = desired_game_aspect(
            screen.width(),
            screen.height(),
            self.current_state.aspect_ratio_correction,
        );
        self.display = compute_display_area(desired, self.output_width, self.output_height);

        let scissor = scissor_box(&self.display, self.output_height);
        self.back_buffer.set_scissor_box(&mut self.device, scissor);
        self.scissor_override = SCISSOR_OVERRIDE_FRAMES;

        // Keep the cursor where it was relative to the new area.
        self.set_mouse_position(self.cursor_x, self.cursor_y);
        self.force_redraw = true;
    }

    // ----- Composition -----

    /// Compose and present a frame if anything changed
    ///
    /// Does nothing before the first mode is set or while no context exists.
    pub fn update_screen(&mut self) -> Result<(), GraphicsError> {
        if self.game_screen.is_none() || self.pipeline.is_none() {
            return Ok(());
        }

        if self.config.osd.enabled {
            if let Some(text) = self.osd_queue.take() {
                self.osd_message_update_surface(&text)?;
            }
        }

        let game_dirty = self.game_screen.as_ref().is_some_and(Surface::is_dirty);
        let overlay_dirty = self.overlay_visible && self.overlay.as_ref().is_some_and(Surface::is_dirty);
        let cursor_dirty = self.cursor_visible && self.cursor.as_ref().is_some_and(Surface::is_dirty);
        let osd_pending = self.osd_message.is_some() || self.osd_icon.is_some();
        if !(self.force_redraw || game_dirty || overlay_dirty || cursor_dirty || osd_pending) {
            return Ok(());
        }
        self.force_redraw = false;

        let ctx = &self.ctx;
        for surface in [
            &mut self.game_screen,
            &mut self.cursor,
            &mut self.overlay,
            &mut self.osd_message,
            &mut self.osd_icon,
        ]
        .into_iter()
        .flatten()
        {
            surface.update_gl_texture(&mut self.device, ctx)?;
        }

        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(());
        };
        let device = &mut self.device;

        if self.scissor_override > 0 && !self.overlay_visible {
            // Wipe the letterbox too, e.g. after the overlay was hidden.
            self.back_buffer.enable_scissor_test(device, false);
            device.clear();
            self.back_buffer.enable_scissor_test(device, true);
            self.scissor_override -= 1;
        } else {
            device.clear();
        }

        let display = self.display;
        let (out_w, out_h) = (self.output_width as f32, self.output_height as f32);

        // Game screen
        let mut shake = 0.0;
        if let Some(screen) = self.game_screen.as_ref() {
            if screen.height() > 0 {
                shake = self.shake_offset as f32 * display.height as f32 / screen.height() as f32;
            }
            pipeline.draw_texture(
                device,
                screen.texture(),
                display.x as f32,
                display.y as f32 + shake,
                display.width as f32,
                display.height as f32,
            );
        }

        // Overlay
        if self.overlay_visible {
            if let Some(overlay) = self.overlay.as_ref() {
                pipeline.draw_texture(device, overlay.texture(), 0.0, 0.0, out_w, out_h);
            }
        }

        // Cursor, shaken along with the game only
        if self.cursor_visible {
            if let Some(cursor) = self.cursor.as_ref() {
                let offset = if self.overlay_visible { 0.0 } else { shake };
                let scale = self.cursor_scale;
                pipeline.draw_texture(
                    device,
                    cursor.texture(),
                    (self.cursor_display_x - scale.hotspot_x) as f32,
                    (self.cursor_display_y - scale.hotspot_y) as f32 + offset,
                    scale.width as f32,
                    scale.height as f32,
                );
            }
        }

        // OSD message
        if let Some(message) = self.osd_message.as_ref() {
            let osd = &self.config.osd;
            self.osd_alpha = message_alpha(
                self.clock.millis(),
                self.osd_fade_start,
                osd.initial_alpha,
                osd.fade_out_duration_ms,
            );

            pipeline.set_color(device, 1.0, 1.0, 1.0, self.osd_alpha as f32 / 100.0);
            let x = (self.output_width as i32 - message.width() as i32) / 2;
            let y = (self.output_height as i32 - message.height() as i32) / 2;
            pipeline.draw_texture(
                device,
                message.texture(),
                x as f32,
                y as f32,
                message.width() as f32,
                message.height() as f32,
            );
            pipeline.set_color(device, 1.0, 1.0, 1.0, 1.0);

            if self.osd_alpha <= 0 {
                release(device, self.osd_message.take());
            }
        }

        // OSD icon
        if let Some(icon) = self.osd_icon.as_ref() {
            let osd = &self.config.osd;
            let x = self.output_width as i32 - icon.width() as i32 - osd.icon_right_margin as i32;
            let y = osd.icon_top_margin as i32;
            pipeline.draw_texture(
                device,
                icon.texture(),
                x as f32,
                y as f32,
                icon.width() as f32,
                icon.height() as f32,
            );
        }

        device.present();
        Ok(())
    }

    // ----- On-screen display -----

    /// Show a message over the frame; lines are separated by `\n`
    ///
    /// Safe to call from other threads through `osd_queue()`.
    pub fn display_message_on_osd(&self, message: &str) {
        if self.config.osd.enabled {
            self.osd_queue.submit(message);
        }
    }

    /// Build the message surface for `text` and restart the fade
    fn osd_message_update_surface(&mut self, text: &str) -> Result<(), GraphicsError> {
        release(&mut self.device, self.osd_message.take());

        let format = self.default_format_alpha;
        let Some(frame) = render_message(
            &*self.osd_font,
            text,
            self.display.width,
            self.display.height,
            format,
        ) else {
            return Ok(());
        };

        let mut surface = create_surface(format, false, &self.ctx, self.default_format, format)
            .ok_or(GraphicsError::UnsupportedSurfaceFormat(format))?;
        // Stays readable when scaled.
        surface.enable_linear_filtering(&mut self.device, true);
        surface.allocate(frame.width(), frame.height());
        surface.copy_rect_to_texture(0, 0, frame.width(), frame.height(), frame.as_slice(), frame.pitch());
        surface.update_gl_texture(&mut self.device, &self.ctx)?;

        self.osd_message = Some(surface);
        self.osd_alpha = self.config.osd.initial_alpha as i32;
        self.osd_fade_start = self.clock.millis() + self.config.osd.fade_out_delay_ms;
        Ok(())
    }

    /// Show an activity icon in the top-right corner, or remove it with `None`
    pub fn display_activity_icon_on_osd(&mut self, icon: Option<&FrameBuffer>) -> Result<(), GraphicsError> {
        if !self.config.osd.enabled {
            return Ok(());
        }

        if let Some(old) = self.osd_icon.take() {
            release(&mut self.device, Some(old));
            // The old icon must be erased on the next frame.
            self.force_redraw = true;
        }

        let Some(icon) = icon else {
            return Ok(());
        };

        let format = self.default_format_alpha;
        let converted = icon
            .convert_to(format)
            .ok_or(GraphicsError::UnsupportedSurfaceFormat(icon.format()))?;

        let mut surface = create_surface(format, false, &self.ctx, self.default_format, format)
            .ok_or(GraphicsError::UnsupportedSurfaceFormat(format))?;
        surface.enable_linear_filtering(&mut self.device, true);
        surface.allocate(converted.width(), converted.height());
        surface.copy_rect_to_texture(
            0,
            0,
            converted.width(),
            converted.height(),
            converted.as_slice(),
            converted.pitch(),
        );

        self.osd_icon = Some(surface);
        Ok(())
    }

    pub fn has_osd_icon(&self) -> bool {
        self.osd_icon.is_some()
    }

    // ----- Screenshots -----

    /// Write the last composed frame to `path` as BMP
    pub fn save_screenshot(&mut self, path: impl AsRef<Path>) -> Result<(), GraphicsError> {
        self.save_screenshot_as(path, ScreenshotFormat::Bmp)
    }

    /// Write the last composed frame to `path` in `format`
    pub fn save_screenshot_as(&mut self, path: impl AsRef<Path>, format: ScreenshotFormat) -> Result<(), GraphicsError> {
        let (width, height) = (self.output_width, self.output_height);
        if width == 0 || height == 0 {
            return Err(ScreenshotError::EmptyOutput.into());
        }
        // Without a context the device holds no frame of this size.
        if !self.ctx.is_ready() {
            return Err(GraphicsError::NoContext);
        }

        let pixels = self.device.read_pixels(width, height);
        match format {
            ScreenshotFormat::Bmp => screenshot::save_bmp(path.as_ref(), width, height, &pixels)?,
            ScreenshotFormat::Png => screenshot::save_png(path.as_ref(), width, height, &pixels)?,
        }

        log::info!("Screenshot saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Save a screenshot into the configured directory
    ///
    /// # Returns
    /// Path of the written file
    pub fn capture_screenshot(&mut self) -> Result<PathBuf, GraphicsError> {
        let settings = self.config.screenshot.clone();
        fs::create_dir_all(&settings.directory).map_err(ScreenshotError::from)?;

        let path = screenshot::screenshot_path(&settings.directory, settings.format, settings.include_timestamp);
        self.save_screenshot_as(&path, settings.format)?;
        Ok(path)
    }
}
