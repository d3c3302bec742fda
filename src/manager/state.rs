// Graphics state snapshot and transaction bookkeeping

use crate::format::PixelFormat;
use serde::{Deserialize, Serialize};

/// Texture filtering mode of the game screen and cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsMode {
    Linear = 0,
    Nearest = 1,
}

impl GraphicsMode {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(GraphicsMode::Linear),
            1 => Some(GraphicsMode::Nearest),
            _ => None,
        }
    }

    pub fn is_linear(self) -> bool {
        self == GraphicsMode::Linear
    }
}

/// Entry of the graphics mode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsModeInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub mode: GraphicsMode,
}

/// Modes offered to callers, default first
pub const GRAPHICS_MODES: [GraphicsModeInfo; 2] = [
    GraphicsModeInfo {
        name: "opengl_linear",
        description: "OpenGL",
        mode: GraphicsMode::Linear,
    },
    GraphicsModeInfo {
        name: "opengl_nearest",
        description: "OpenGL (No filtering)",
        mode: GraphicsMode::Nearest,
    },
];

/// Optional behaviors callers can query or toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    AspectRatioCorrection,
    CursorPalette,
    OverlaySupportsAlpha,
}

/// Requested presentation state
///
/// `valid` marks a state that has been realized on the output at least
/// once; it is not part of equality.
#[derive(Debug, Clone, Copy)]
pub struct GraphicsState {
    pub game_width: u32,
    pub game_height: u32,
    pub game_format: PixelFormat,
    pub aspect_ratio_correction: bool,
    pub graphics_mode: GraphicsMode,
    pub valid: bool,
}

impl GraphicsState {
    pub fn new(aspect_ratio_correction: bool, graphics_mode: GraphicsMode) -> Self {
        GraphicsState {
            game_width: 0,
            game_height: 0,
            game_format: PixelFormat::CLUT8,
            aspect_ratio_correction,
            graphics_mode,
            valid: false,
        }
    }

    /// Failure flags for every field in which `self` differs from `other`
    pub fn diff(&self, other: &GraphicsState) -> TransactionErrors {
        TransactionErrors {
            size_change_failed: self.game_width != other.game_width
                || self.game_height != other.game_height,
            format_not_supported: self.game_format != other.game_format,
            aspect_ratio_failed: self.aspect_ratio_correction != other.aspect_ratio_correction,
            mode_switch_failed: self.graphics_mode != other.graphics_mode,
        }
    }
}

impl PartialEq for GraphicsState {
    fn eq(&self, other: &Self) -> bool {
        self.game_width == other.game_width
            && self.game_height == other.game_height
            && self.game_format == other.game_format
            && self.aspect_ratio_correction == other.aspect_ratio_correction
            && self.graphics_mode == other.graphics_mode
    }
}

impl Eq for GraphicsState {}

/// Phase of a mode-switch transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    None,
    Active,
    Rollback,
}

/// Parts of a transaction that could not be honored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionErrors {
    pub size_change_failed: bool,
    pub format_not_supported: bool,
    pub aspect_ratio_failed: bool,
    pub mode_switch_failed: bool,
}

impl TransactionErrors {
    pub fn is_success(&self) -> bool {
        *self == TransactionErrors::default()
    }

    /// Accumulate the flags of `other`
    pub fn merge(&mut self, other: TransactionErrors) {
        self.size_change_failed |= other.size_change_failed;
        self.format_not_supported |= other.format_not_supported;
        self.aspect_ratio_failed |= other.aspect_ratio_failed;
        self.mode_switch_failed |= other.mode_switch_failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_mode_ids() {
        assert_eq!(GraphicsMode::from_id(0), Some(GraphicsMode::Linear));
        assert_eq!(GraphicsMode::from_id(1), Some(GraphicsMode::Nearest));
        assert_eq!(GraphicsMode::from_id(7), None);
        for info in GRAPHICS_MODES {
            assert_eq!(GraphicsMode::from_id(info.mode.id()), Some(info.mode));
        }
    }

    #[test]
    fn test_validity_ignored_by_equality() {
        let mut a = GraphicsState::new(false, GraphicsMode::Linear);
        let b = a;
        a.valid = true;
        assert_eq!(a, b);
    }

    #[test]
    fn test_diff_flags_changed_fields() {
        let a = GraphicsState::new(false, GraphicsMode::Linear);
        let mut b = a;
        b.game_width = 640;
        b.graphics_mode = GraphicsMode::Nearest;

        let errors = a.diff(&b);
        assert!(errors.size_change_failed);
        assert!(errors.mode_switch_failed);
        assert!(!errors.format_not_supported);
        assert!(!errors.aspect_ratio_failed);
        assert!(a.diff(&a).is_success());
    }
}
