// Mode-switch transactions
//
// Callers bracket size, format, aspect and filtering changes between
// `begin_transaction` and `end_transaction`. Ending realizes the requested
// state on the output; when that fails the last valid state is restored
// and the rejected fields are reported.

use super::state::{Feature, GraphicsMode, GraphicsModeInfo, TransactionErrors, TransactionMode, GRAPHICS_MODES};
use super::{release, GraphicsManager};
use crate::display::desired_game_aspect;
use crate::error::GraphicsError;
use crate::format::{negotiate, PixelFormat};
use crate::gpu::GpuDevice;
use crate::texture::create_surface;

/// Formats offered to games besides the context defaults
const CANDIDATE_FORMATS: [PixelFormat; 8] = [
    PixelFormat::RGBA8888,
    PixelFormat::ABGR8888,
    PixelFormat::ARGB8888,
    PixelFormat::BGRA8888,
    PixelFormat::RGB565,
    PixelFormat::RGBA5551,
    PixelFormat::RGBA4444,
    PixelFormat::RGB555,
];

impl<D: GpuDevice> GraphicsManager<D> {
    /// Start a mode-switch transaction
    ///
    /// # Panics
    /// Panics if a transaction is already running
    pub fn begin_transaction(&mut self) {
        assert_eq!(
            self.transaction_mode,
            TransactionMode::None,
            "Transaction already active"
        );

        self.old_state = self.current_state;
        self.transaction_mode = TransactionMode::Active;
    }

    /// Realize the state requested since `begin_transaction`
    ///
    /// # Returns
    /// The fields that could not be honored, or `NoUsableMode` when neither
    /// the request nor the previous state can be shown. The session cannot
    /// continue after that error.
    ///
    /// # Panics
    /// Panics if no transaction is running
    pub fn end_transaction(&mut self) -> Result<TransactionErrors, GraphicsError> {
        assert_eq!(
            self.transaction_mode,
            TransactionMode::Active,
            "No active transaction"
        );

        let mut errors = TransactionErrors::default();

        let mut setup_new_screen = self.game_screen.is_none()
            || self.old_state.game_width != self.current_state.game_width
            || self.old_state.game_height != self.current_state.game_height
            || self.old_state.game_format != self.current_state.game_format;

        if !self.supported_formats().contains(&self.current_state.game_format) {
            log::warn!(
                "Pixel format {} not supported, falling back to CLUT8",
                self.current_state.game_format
            );
            self.current_state.game_format = PixelFormat::CLUT8;
            errors.format_not_supported = true;
        }

        loop {
            if self.realize_current_state() {
                break;
            }

            if self.transaction_mode == TransactionMode::Active
                && self.old_state.valid
                && self.old_state != self.current_state
            {
                errors.merge(self.old_state.diff(&self.current_state));
                log::warn!(
                    "Could not set up {}x{} {}, rolling back to {}x{} {}",
                    self.current_state.game_width,
                    self.current_state.game_height,
                    self.current_state.game_format,
                    self.old_state.game_width,
                    self.old_state.game_height,
                    self.old_state.game_format
                );

                self.current_state = self.old_state;
                self.transaction_mode = TransactionMode::Rollback;
                setup_new_screen = true;
                continue;
            }

            log::error!("Could not load any graphics mode");
            self.transaction_mode = TransactionMode::None;
            return Err(GraphicsError::NoUsableMode);
        }

        self.transaction_mode = TransactionMode::None;
        self.current_state.valid = true;

        if setup_new_screen {
            self.setup_game_screen()?;
        }
        // A rollback may have restored the previous filtering.
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.enable_linear_filtering(&mut self.device, self.current_state.graphics_mode.is_linear());
        }

        self.recalculate_display_area();
        self.recalculate_cursor_scaling();

        self.screen_change_id = self.screen_change_id.wrapping_add(1);

        log::info!(
            "Graphics mode {}x{} {} ({:?})",
            self.current_state.game_width,
            self.current_state.game_height,
            self.current_state.game_format,
            self.current_state.graphics_mode
        );
        Ok(errors)
    }

    /// Ask the platform for a mode able to show the current state
    fn realize_current_state(&mut self) -> bool {
        let state = self.current_state;
        let desired = desired_game_aspect(
            state.game_width,
            state.game_height,
            state.aspect_ratio_correction,
        );
        let requested_height = desired.height_for_width(state.game_width);

        if !self
            .device
            .load_video_mode(state.game_width, requested_height, &state.game_format)
        {
            return false;
        }

        // The context may not exist yet; ask the device in that case.
        let max_texture_size = if self.ctx.is_ready() {
            self.ctx.max_texture_size()
        } else {
            self.device.capabilities().max_texture_size
        };
        state.game_width <= max_texture_size && state.game_height <= max_texture_size
    }

    /// Replace the game screen with a black one of the current size and format
    fn setup_game_screen(&mut self) -> Result<(), GraphicsError> {
        release(&mut self.device, self.game_screen.take());

        let format = self.current_state.game_format;
        let mut screen = create_surface(
            format,
            false,
            &self.ctx,
            self.default_format,
            self.default_format_alpha,
        )
        .ok_or(GraphicsError::UnsupportedSurfaceFormat(format))?;

        if screen.has_palette() {
            screen.set_palette(0, self.game_palette.as_bytes());
        }

        screen.allocate(self.current_state.game_width, self.current_state.game_height);
        screen.enable_linear_filtering(&mut self.device, self.current_state.graphics_mode.is_linear());

        if format.is_clut8() {
            screen.fill(0);
        } else {
            screen.fill(format.rgb_to_color(0, 0, 0));
        }

        self.game_screen = Some(screen);
        Ok(())
    }

    /// Request a new virtual screen size and format
    ///
    /// A missing format means CLUT8.
    pub fn init_size(&mut self, width: u32, height: u32, format: Option<PixelFormat>) {
        self.current_state.game_format = format.unwrap_or(PixelFormat::CLUT8);
        self.current_state.game_width = width;
        self.current_state.game_height = height;
    }

    /// Formats the game screen can use, preferred first
    ///
    /// CLUT8 is always supported and always last.
    pub fn supported_formats(&self) -> Vec<PixelFormat> {
        let mut formats = Vec::new();

        if self.config.video.rgb_color {
            let profile = self.ctx.profile();
            let candidates = [self.default_format, self.default_format_alpha]
                .into_iter()
                .chain(CANDIDATE_FORMATS);

            for format in candidates {
                if format.is_clut8() || formats.contains(&format) {
                    continue;
                }
                // Embedded profiles convert RGB555 on upload.
                let usable = negotiate(&format, profile).is_some()
                    || (profile.is_embedded() && format == PixelFormat::RGB555);
                if usable {
                    formats.push(format);
                }
            }
        }

        formats.push(PixelFormat::CLUT8);
        formats
    }

    /// Format of the game screen
    pub fn screen_format(&self) -> PixelFormat {
        self.current_state.game_format
    }

    /// Counter bumped whenever presentation geometry may have changed
    pub fn screen_change_id(&self) -> u32 {
        self.screen_change_id
    }

    pub fn transaction_mode(&self) -> TransactionMode {
        self.transaction_mode
    }

    pub fn supported_graphics_modes(&self) -> &'static [GraphicsModeInfo] {
        &GRAPHICS_MODES
    }

    pub fn default_graphics_mode(&self) -> i32 {
        GraphicsMode::Linear.id()
    }

    pub fn graphics_mode(&self) -> i32 {
        self.current_state.graphics_mode.id()
    }

    /// Select a filtering mode by id
    ///
    /// # Returns
    /// `false` for unknown modes, which leave the state untouched
    ///
    /// # Panics
    /// Panics outside a transaction
    pub fn set_graphics_mode(&mut self, mode: i32) -> bool {
        assert_ne!(
            self.transaction_mode,
            TransactionMode::None,
            "Graphics mode changed outside a transaction"
        );

        let Some(mode) = GraphicsMode::from_id(mode) else {
            log::warn!("Unknown graphics mode {}", mode);
            return false;
        };

        self.current_state.graphics_mode = mode;
        let linear = mode.is_linear();
        if let Some(screen) = self.game_screen.as_mut() {
            screen.enable_linear_filtering(&mut self.device, linear);
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.enable_linear_filtering(&mut self.device, linear);
        }
        true
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::AspectRatioCorrection | Feature::CursorPalette => true,
            Feature::OverlaySupportsAlpha => self.default_format_alpha.a_bits() > 3,
        }
    }

    /// Toggle a feature
    ///
    /// # Panics
    /// Panics when aspect ratio correction is changed outside a transaction
    pub fn set_feature_state(&mut self, feature: Feature, enable: bool) {
        match feature {
            Feature::AspectRatioCorrection => {
                assert_ne!(
                    self.transaction_mode,
                    TransactionMode::None,
                    "Aspect ratio correction changed outside a transaction"
                );
                self.current_state.aspect_ratio_correction = enable;
            }
            Feature::CursorPalette => {
                self.cursor_palette_enabled = enable;
                self.update_cursor_palette();
            }
            Feature::OverlaySupportsAlpha => {}
        }
    }

    pub fn get_feature_state(&self, feature: Feature) -> bool {
        match feature {
            Feature::AspectRatioCorrection => self.current_state.aspect_ratio_correction,
            Feature::CursorPalette => self.cursor_palette_enabled,
            Feature::OverlaySupportsAlpha => false,
        }
    }
}
