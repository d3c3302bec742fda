// Graphics Presenter Library
// Scaled, palette-aware presentation of a game screen, overlay, cursor and OSD

// Public modules
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod gpu;
pub mod manager;
pub mod pipeline;
pub mod screenshot;
pub mod texture;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PresenterConfig;
pub use display::{Aspect, FrameBuffer, Palette, Rect};
#[cfg(feature = "window")]
pub use display::{run_demo, DemoWindow};
pub use error::GraphicsError;
pub use format::{PixelFormat, TextureFormat};
pub use gpu::{ApiProfile, Capabilities, DeviceError, GlContext, GpuDevice, SoftwareDevice};
pub use manager::{
    BlockFont, Feature, GraphicsManager, GraphicsMode, OsdFont, OsdMessageQueue, TransactionErrors,
};
pub use pipeline::Pipeline;
pub use screenshot::{ScreenshotError, ScreenshotFormat};
pub use texture::{Surface, Texture};
