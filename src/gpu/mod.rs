// GPU module - Hardware contract between the presenter and the graphics API
//
// This module provides:
// - The `GpuDevice` trait the platform shell implements for its graphics API
// - Capability description and the per-context `GlContext` handle
// - A CPU implementation (`SoftwareDevice`) used by tests and the demo window

pub mod context;
pub mod software;

pub use context::{ApiProfile, Capabilities, GlContext};
pub use software::{DeviceStats, SoftwareDevice};

use crate::display::Rect;
use crate::format::{PixelFormat, TextureFormat};
use thiserror::Error;

/// Hardware texture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Hardware shader program handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Linear,
    Nearest,
}

impl Filter {
    pub fn from_linear(linear: bool) -> Self {
        if linear {
            Filter::Linear
        } else {
            Filter::Nearest
        }
    }
}

/// Errors reported by a graphics device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No texture name could be generated
    #[error("texture creation failed: {0}")]
    TextureCreation(String),

    /// The default textured-quad shader failed to build
    #[error("shader program creation failed: {0}")]
    ProgramCreation(String),
}

/// Graphics API contract
///
/// Coordinates passed to `draw_textured_quad` are output pixels with the
/// origin in the top-left corner. The scissor box uses the hardware's
/// bottom-left origin. `read_pixels` returns bottom-up RGB rows, each row
/// padded to a multiple of four bytes.
pub trait GpuDevice {
    /// Query what the current context can do
    fn capabilities(&self) -> Capabilities;

    /// Ask the platform for an output mode able to show a game of this size
    ///
    /// # Returns
    /// `false` when the platform cannot realize the mode
    fn load_video_mode(&mut self, width: u32, height: u32, format: &PixelFormat) -> bool;

    fn create_texture(&mut self) -> Result<TextureId, DeviceError>;
    fn delete_texture(&mut self, id: TextureId);
    fn set_texture_filter(&mut self, id: TextureId, filter: Filter);

    /// (Re)specify texture storage, discarding its contents
    fn allocate_texture(&mut self, id: TextureId, width: u32, height: u32, format: TextureFormat);

    /// Upload `region` of the texture from `data`, rows `pitch` bytes apart
    fn upload_texture(
        &mut self,
        id: TextureId,
        region: Rect,
        format: TextureFormat,
        data: &[u8],
        pitch: usize,
    );

    /// Expand an index texture through a palette texture into `target`
    fn render_palette_lookup(
        &mut self,
        target: TextureId,
        indices: TextureId,
        palette: TextureId,
        width: u32,
        height: u32,
    );

    /// Build the default textured-quad shader
    fn create_program(&mut self) -> Result<ProgramId, DeviceError>;
    fn delete_program(&mut self, id: ProgramId);
    fn use_program(&mut self, program: Option<ProgramId>);
    fn set_program_color(&mut self, program: ProgramId, color: [f32; 4]);

    /// Fixed-function vertex color
    fn set_vertex_color(&mut self, color: [f32; 4]);

    fn set_viewport(&mut self, width: u32, height: u32);
    fn set_clear_color(&mut self, color: [f32; 4]);
    fn set_blend(&mut self, enabled: bool);
    fn set_scissor_test(&mut self, enabled: bool);
    fn set_scissor_box(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear(&mut self);

    /// Draw a textured quad given as a four-vertex triangle strip
    fn draw_textured_quad(&mut self, texture: TextureId, vertices: &[f32; 8], tex_coords: &[f32; 8]);

    fn read_pixels(&mut self, width: u32, height: u32) -> Vec<u8>;

    /// Show the composed frame
    fn present(&mut self);
}

/// Lets a shell keep ownership of its device while a manager borrows it
impl<T: GpuDevice + ?Sized> GpuDevice for &mut T {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn load_video_mode(&mut self, width: u32, height: u32, format: &PixelFormat) -> bool {
        (**self).load_video_mode(width, height, format)
    }

    fn create_texture(&mut self) -> Result<TextureId, DeviceError> {
        (**self).create_texture()
    }

    fn delete_texture(&mut self, id: TextureId) {
        (**self).delete_texture(id)
    }

    fn set_texture_filter(&mut self, id: TextureId, filter: Filter) {
        (**self).set_texture_filter(id, filter)
    }

    fn allocate_texture(&mut self, id: TextureId, width: u32, height: u32, format: TextureFormat) {
        (**self).allocate_texture(id, width, height, format)
    }

    fn upload_texture(
        &mut self,
        id: TextureId,
        region: Rect,
        format: TextureFormat,
        data: &[u8],
        pitch: usize,
    ) {
        (**self).upload_texture(id, region, format, data, pitch)
    }

    fn render_palette_lookup(
        &mut self,
        target: TextureId,
        indices: TextureId,
        palette: TextureId,
        width: u32,
        height: u32,
    ) {
        (**self).render_palette_lookup(target, indices, palette, width, height)
    }

    fn create_program(&mut self) -> Result<ProgramId, DeviceError> {
        (**self).create_program()
    }

    fn delete_program(&mut self, id: ProgramId) {
        (**self).delete_program(id)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        (**self).use_program(program)
    }

    fn set_program_color(&mut self, program: ProgramId, color: [f32; 4]) {
        (**self).set_program_color(program, color)
    }

    fn set_vertex_color(&mut self, color: [f32; 4]) {
        (**self).set_vertex_color(color)
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        (**self).set_viewport(width, height)
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        (**self).set_clear_color(color)
    }

    fn set_blend(&mut self, enabled: bool) {
        (**self).set_blend(enabled)
    }

    fn set_scissor_test(&mut self, enabled: bool) {
        (**self).set_scissor_test(enabled)
    }

    fn set_scissor_box(&mut self, x: i32, y: i32, width: u32, height: u32) {
        (**self).set_scissor_box(x, y, width, height)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn draw_textured_quad(&mut self, texture: TextureId, vertices: &[f32; 8], tex_coords: &[f32; 8]) {
        (**self).draw_textured_quad(texture, vertices, tex_coords)
    }

    fn read_pixels(&mut self, width: u32, height: u32) -> Vec<u8> {
        (**self).read_pixels(width, height)
    }

    fn present(&mut self) {
        (**self).present()
    }
}
