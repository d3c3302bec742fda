// Error types for the presenter

use crate::format::PixelFormat;
use crate::gpu::{ApiProfile, DeviceError};
use crate::screenshot::ScreenshotError;
use thiserror::Error;

/// Errors reported by the graphics manager
#[derive(Debug, Error)]
pub enum GraphicsError {
    /// Neither the requested mode nor any earlier one could be realized
    ///
    /// The session cannot continue without a valid output.
    #[error("could not load any graphics mode")]
    NoUsableMode,

    /// The context offers neither a shader nor a fixed-function pipeline
    #[error("no render pipeline available for {0:?} context")]
    NoPipeline(ApiProfile),

    /// No surface can hold pixels of this format on the current context
    #[error("no surface available for pixel format {0}")]
    UnsupportedSurfaceFormat(PixelFormat),

    /// The operation needs a live graphics context
    #[error("no graphics context")]
    NoContext,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),
}
