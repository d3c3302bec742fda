// Configuration management
//
// Handles presenter configuration and settings persistence.

use crate::manager::GraphicsMode;
use crate::screenshot::ScreenshotFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default configuration file path
const CONFIG_FILE: &str = "presenter_config.toml";

/// Presenter configuration
///
/// Stores all user-configurable settings of the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    /// Video settings
    pub video: VideoConfig,

    /// Render pipeline settings
    pub rendering: RenderingConfig,

    /// Overlay settings
    pub overlay: OverlayConfig,

    /// On-screen display settings
    pub osd: OsdConfig,

    /// Screenshot settings
    pub screenshot: ScreenshotConfig,
}

/// Video configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Initial filtering of the game screen and cursor
    pub graphics_mode: GraphicsMode,

    /// Show 320x200 and 640x400 games at 4:3
    pub aspect_ratio_correction: bool,

    /// Allow games to use RGB pixel formats
    pub rgb_color: bool,

    /// Virtual resolution used by the demo shell
    pub game_width: u32,
    pub game_height: u32,
}

/// Render pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Never use the shader pipeline, even when the context supports it
    pub disable_shaders: bool,
}

/// Overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Minimum overlay width, keeps GUI layouts usable on tiny outputs
    pub min_width: u32,

    /// Minimum overlay height
    pub min_height: u32,
}

/// On-screen display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsdConfig {
    /// Enable the on-screen display
    pub enabled: bool,

    /// Time a message stays fully visible (milliseconds)
    pub fade_out_delay_ms: u64,

    /// Length of the fade out (milliseconds)
    pub fade_out_duration_ms: u64,

    /// Opacity of a fresh message (percent)
    pub initial_alpha: u32,

    /// Activity icon distance from the top edge
    pub icon_top_margin: u32,

    /// Activity icon distance from the right edge
    pub icon_right_margin: u32,
}

/// Screenshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Screenshot directory
    pub directory: PathBuf,

    /// Image format
    pub format: ScreenshotFormat,

    /// Include timestamp in filename
    pub include_timestamp: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            graphics_mode: GraphicsMode::Linear,
            aspect_ratio_correction: false,
            rgb_color: true,
            game_width: 320,
            game_height: 200,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            min_width: 256,
            min_height: 200,
        }
    }
}

impl Default for OsdConfig {
    fn default() -> Self {
        OsdConfig {
            enabled: true,
            fade_out_delay_ms: 2000,
            fade_out_duration_ms: 500,
            initial_alpha: 80,
            icon_top_margin: 10,
            icon_right_margin: 10,
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        ScreenshotConfig {
            directory: PathBuf::from("screenshots"),
            format: ScreenshotFormat::Bmp,
            include_timestamp: true,
        }
    }
}

impl PresenterConfig {
    /// Load configuration from file or create default
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// and saves it to the file.
    ///
    /// # Returns
    ///
    /// The loaded or default configuration
    pub fn load_or_default() -> Self {
        Self::load_from(CONFIG_FILE).unwrap_or_else(|_| {
            let config = Self::default();
            // Try to save the default config, but don't fail if we can't
            let _ = config.save_to(CONFIG_FILE);
            config
        })
    }

    /// Load configuration from a file
    ///
    /// # Returns
    ///
    /// Result containing the configuration or an error
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save configuration to a file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gfx_presenter::PresenterConfig;
    ///
    /// let config = PresenterConfig::default();
    /// config.save_to("presenter_config.toml").expect("Failed to save configuration");
    /// ```
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), io::Error> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)
    }
}
