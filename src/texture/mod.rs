// Texture module - Hardware textures and the surfaces built on them
//
// This module provides:
// - `Texture`, a thin owner of one hardware texture handle
// - `Surface`, a texture plus its CPU mirror, dirty tracking and palette
// - `create_surface`, which picks the upload path for a pixel format

pub mod surface;

pub use surface::Surface;

use crate::display::Rect;
use crate::format::{negotiate, PixelFormat, TextureFormat};
use crate::gpu::{DeviceError, Filter, GlContext, GpuDevice, TextureId};

/// Hardware texture with a negotiated format
///
/// The handle is optional: it is released when the context goes away and
/// acquired again on recreation. Logical size may be smaller than the
/// backing storage when the context lacks non-power-of-two support.
#[derive(Debug, Clone)]
pub struct Texture {
    id: Option<TextureId>,
    format: TextureFormat,
    filter: Filter,
    width: u32,
    height: u32,
    storage: Option<(u32, u32)>,
    tex_coords: [f32; 8],
}

impl Texture {
    pub fn new(format: TextureFormat) -> Self {
        Texture {
            id: None,
            format,
            filter: Filter::Linear,
            width: 0,
            height: 0,
            storage: None,
            tex_coords: [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        }
    }

    /// Texture that samples with `filter` from the start
    pub fn with_filter(format: TextureFormat, filter: Filter) -> Self {
        Texture {
            filter,
            ..Texture::new(format)
        }
    }

    pub fn id(&self) -> Option<TextureId> {
        self.id
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Allocated storage size, if storage exists on the device
    pub fn storage_size(&self) -> Option<(u32, u32)> {
        self.storage
    }

    /// Texture coordinates of the logical content as a triangle strip
    pub fn tex_coords(&self) -> &[f32; 8] {
        &self.tex_coords
    }

    fn ensure_handle(&mut self, device: &mut dyn GpuDevice) -> Result<TextureId, DeviceError> {
        if let Some(id) = self.id {
            return Ok(id);
        }

        let id = device.create_texture()?;
        device.set_texture_filter(id, self.filter);
        self.id = Some(id);
        self.storage = None;
        Ok(id)
    }

    pub fn set_filter(&mut self, device: &mut dyn GpuDevice, filter: Filter) {
        self.filter = filter;
        if let Some(id) = self.id {
            device.set_texture_filter(id, filter);
        }
    }

    /// Make the texture hold `width` x `height` texels of content
    ///
    /// Storage is only re-specified when its size actually changes.
    pub fn set_size(
        &mut self,
        device: &mut dyn GpuDevice,
        ctx: &GlContext,
        width: u32,
        height: u32,
    ) -> Result<(), DeviceError> {
        let id = self.ensure_handle(device)?;

        let storage = if ctx.npot_supported() {
            (width, height)
        } else {
            (width.next_power_of_two(), height.next_power_of_two())
        };

        if self.storage != Some(storage) {
            device.allocate_texture(id, storage.0, storage.1, self.format);
            self.storage = Some(storage);
        }

        self.width = width;
        self.height = height;

        let u = if storage.0 == 0 { 0.0 } else { width as f32 / storage.0 as f32 };
        let v = if storage.1 == 0 { 0.0 } else { height as f32 / storage.1 as f32 };
        self.tex_coords = [0.0, 0.0, u, 0.0, 0.0, v, u, v];
        Ok(())
    }

    /// Upload `area` from `data`, rows `pitch` bytes apart
    pub fn update_area(&mut self, device: &mut dyn GpuDevice, area: Rect, data: &[u8], pitch: usize) {
        if area.is_empty() {
            return;
        }
        if let Some(id) = self.id {
            device.upload_texture(id, area, self.format, data, pitch);
        }
    }

    /// Release the hardware handle
    pub fn destroy(&mut self, device: &mut dyn GpuDevice) {
        if let Some(id) = self.id.take() {
            device.delete_texture(id);
        }
        self.storage = None;
    }

    /// Forget the hardware handle without touching the device
    ///
    /// Used when the context is already gone and the handle is meaningless.
    pub fn invalidate(&mut self) {
        self.id = None;
        self.storage = None;
    }

    /// Acquire a new handle and storage for the current logical size
    pub fn recreate(&mut self, device: &mut dyn GpuDevice, ctx: &GlContext) -> Result<(), DeviceError> {
        self.invalidate();
        self.ensure_handle(device)?;
        if self.width > 0 && self.height > 0 {
            self.set_size(device, ctx, self.width, self.height)?;
        }
        Ok(())
    }
}

/// Create a surface able to hold pixels of `format`
///
/// # Arguments
/// * `format` - Pixel format callers will write
/// * `want_alpha` - Palette indexed surfaces expand into an alpha capable format
/// * `ctx` - Current context capabilities
/// * `default_format` / `default_format_alpha` - Formats the platform prefers
///
/// # Returns
/// `None` when no upload path exists for the format on this context
pub fn create_surface(
    format: PixelFormat,
    want_alpha: bool,
    ctx: &GlContext,
    default_format: PixelFormat,
    default_format_alpha: PixelFormat,
) -> Option<Surface> {
    if format.is_clut8() {
        if ctx.palette_lookup_supported() {
            log::debug!("Creating GPU palette lookup surface");
            return Some(Surface::clut8_gpu());
        }

        let virtual_format = if want_alpha {
            default_format_alpha
        } else {
            default_format
        };
        let texture_format = negotiate(&virtual_format, ctx.profile())?;
        log::debug!("Creating CLUT8 surface expanded to {}", virtual_format);
        return Some(Surface::clut8(texture_format, virtual_format));
    }

    if ctx.is_embedded() && format == PixelFormat::RGB555 {
        log::debug!("Creating RGB555 conversion surface");
        return Surface::rgb555(ctx.profile());
    }

    let texture_format = negotiate(&format, ctx.profile())?;
    log::debug!("Creating {} surface", format);
    Some(Surface::direct(texture_format, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{Capabilities, SoftwareDevice};

    fn context(caps: Capabilities) -> GlContext {
        let mut ctx = GlContext::new();
        ctx.initialize(caps);
        ctx
    }

    #[test]
    fn test_npot_fallback_rounds_storage() {
        let ctx = context(Capabilities::embedded());
        let mut device = SoftwareDevice::new(Capabilities::embedded());
        let mut texture = Texture::new(TextureFormat::RGBA_BYTES);

        texture.set_size(&mut device, &ctx, 320, 200).unwrap();
        assert_eq!(texture.storage_size(), Some((512, 256)));
        assert_eq!(texture.tex_coords()[6], 320.0 / 512.0);
        assert_eq!(texture.tex_coords()[7], 200.0 / 256.0);
    }

    #[test]
    fn test_storage_reused_for_same_size() {
        let ctx = context(Capabilities::desktop());
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        let mut texture = Texture::new(TextureFormat::RGBA_BYTES);

        texture.set_size(&mut device, &ctx, 64, 64).unwrap();
        assert_eq!(texture.storage_size(), Some((64, 64)));
        assert_eq!(texture.tex_coords()[6], 1.0);

        let id = texture.id();
        texture.set_size(&mut device, &ctx, 64, 64).unwrap();
        assert_eq!(texture.id(), id);
    }

    #[test]
    fn test_destroy_and_recreate() {
        let ctx = context(Capabilities::desktop());
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        let mut texture = Texture::new(TextureFormat::RGBA_BYTES);
        texture.set_size(&mut device, &ctx, 8, 8).unwrap();

        texture.destroy(&mut device);
        assert!(texture.id().is_none());
        assert_eq!(device.texture_count(), 0);

        texture.recreate(&mut device, &ctx).unwrap();
        assert!(texture.id().is_some());
        assert_eq!(texture.storage_size(), Some((8, 8)));
    }

    #[test]
    fn test_create_surface_paths() {
        let desktop = context(Capabilities::desktop());
        let rgba = PixelFormat::native_rgba();

        let clut = create_surface(PixelFormat::CLUT8, false, &desktop, rgba, rgba).unwrap();
        assert!(clut.has_palette());
        assert!(clut.uses_gpu_palette());

        let embedded = context(Capabilities::embedded());
        let clut = create_surface(PixelFormat::CLUT8, true, &embedded, PixelFormat::RGB565, rgba).unwrap();
        assert!(clut.has_palette());
        assert!(!clut.uses_gpu_palette());

        let rgb555 = create_surface(PixelFormat::RGB555, false, &embedded, rgba, rgba).unwrap();
        assert_eq!(rgb555.format(), PixelFormat::RGB555);
        assert!(!rgb555.has_palette());

        assert!(create_surface(PixelFormat::BGRA8888, false, &embedded, rgba, rgba).is_none());
        assert!(create_surface(PixelFormat::BGRA8888, false, &desktop, rgba, rgba).is_some());
    }

    #[test]
    fn test_clut8_without_usable_default_format() {
        let embedded = context(Capabilities::embedded());
        let surface = create_surface(
            PixelFormat::CLUT8,
            false,
            &embedded,
            PixelFormat::BGRA8888,
            PixelFormat::BGRA8888,
        );
        assert!(surface.is_none());
    }
}
