// Pipeline module - Strategies for drawing textured quads
//
// This module provides:
// - `FixedPipeline` for contexts with the fixed-function pipeline
// - `ShaderPipeline` for programmable contexts
// - `Pipeline`, chosen once per context and kept until the context dies
// - `BackBuffer`, the output render target state

pub mod fixed;
pub mod framebuffer;
pub mod shader;

pub use fixed::FixedPipeline;
pub use framebuffer::BackBuffer;
pub use shader::ShaderPipeline;

use crate::error::GraphicsError;
use crate::gpu::{GlContext, GpuDevice};
use crate::texture::Texture;

/// Vertices of an axis-aligned quad as a triangle strip
pub(crate) fn quad_vertices(x: f32, y: f32, width: f32, height: f32) -> [f32; 8] {
    let (x, y) = (x.round(), y.round());
    let (right, bottom) = (x + width.round(), y + height.round());
    [x, y, right, y, x, bottom, right, bottom]
}

/// Active render pipeline of a context
#[derive(Debug)]
pub enum Pipeline {
    Fixed(FixedPipeline),
    Shader(ShaderPipeline),
}

impl Pipeline {
    /// Pick the pipeline for a freshly created context
    ///
    /// Shaders are preferred unless disabled; the fixed-function pipeline is
    /// the fallback on profiles that still have one.
    pub fn select(
        ctx: &GlContext,
        disable_shaders: bool,
        device: &mut dyn GpuDevice,
    ) -> Result<Pipeline, GraphicsError> {
        let profile = ctx.profile();

        if ctx.shaders_supported() && !disable_shaders {
            log::debug!("Using shader pipeline");
            return Ok(Pipeline::Shader(ShaderPipeline::new(device)?));
        }

        if profile.has_fixed_function() {
            log::debug!("Using fixed-function pipeline");
            return Ok(Pipeline::Fixed(FixedPipeline::new()));
        }

        Err(GraphicsError::NoPipeline(profile))
    }

    pub fn is_shader(&self) -> bool {
        matches!(self, Pipeline::Shader(_))
    }

    /// Set the modulation color applied to every following draw
    pub fn set_color(&mut self, device: &mut dyn GpuDevice, r: f32, g: f32, b: f32, a: f32) {
        match self {
            Pipeline::Fixed(p) => p.set_color(device, [r, g, b, a]),
            Pipeline::Shader(p) => p.set_color(device, [r, g, b, a]),
        }
    }

    /// Current modulation color
    pub fn color(&self) -> [f32; 4] {
        match self {
            Pipeline::Fixed(p) => p.color(),
            Pipeline::Shader(p) => p.color(),
        }
    }

    /// Render into `framebuffer` from now on
    pub fn set_framebuffer(&mut self, device: &mut dyn GpuDevice, framebuffer: &mut BackBuffer) {
        match self {
            Pipeline::Fixed(p) => p.activate(device),
            Pipeline::Shader(p) => p.activate(device),
        }
        framebuffer.activate(device);
    }

    /// Draw `texture` into the output rectangle, coordinates rounded
    pub fn draw_texture(&mut self, device: &mut dyn GpuDevice, texture: &Texture, x: f32, y: f32, w: f32, h: f32) {
        let Some(id) = texture.id() else {
            return;
        };
        let vertices = quad_vertices(x, y, w, h);
        device.draw_textured_quad(id, &vertices, texture.tex_coords());
    }

    /// Release hardware resources of the pipeline
    pub fn destroy(self, device: &mut dyn GpuDevice) {
        match self {
            Pipeline::Fixed(_) => {}
            Pipeline::Shader(p) => p.destroy(device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{ApiProfile, Capabilities, SoftwareDevice};

    fn select(caps: Capabilities, disable_shaders: bool) -> Result<Pipeline, GraphicsError> {
        let mut ctx = GlContext::new();
        ctx.initialize(caps);
        let mut device = SoftwareDevice::new(caps);
        Pipeline::select(&ctx, disable_shaders, &mut device)
    }

    #[test]
    fn test_prefers_shaders() {
        assert!(select(Capabilities::desktop(), false).unwrap().is_shader());
        assert!(select(Capabilities::embedded2(), false).unwrap().is_shader());
    }

    #[test]
    fn test_falls_back_to_fixed_function() {
        assert!(!select(Capabilities::desktop(), true).unwrap().is_shader());
        assert!(!select(Capabilities::embedded(), false).unwrap().is_shader());
    }

    #[test]
    fn test_no_pipeline_without_shaders_or_fixed_function() {
        let result = select(Capabilities::embedded2(), true);
        assert!(matches!(
            result,
            Err(GraphicsError::NoPipeline(ApiProfile::Embedded2))
        ));
    }

    #[test]
    fn test_quad_vertices_are_rounded() {
        assert_eq!(
            quad_vertices(10.4, 20.6, 99.5, 50.2),
            [10.0, 21.0, 110.0, 21.0, 10.0, 71.0, 110.0, 71.0]
        );
    }
}
