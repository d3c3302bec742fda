// Surface - Hardware texture plus CPU mirror
//
// Writes only touch the CPU mirror and grow the dirty area. The dirty area
// is uploaded by `update_gl_texture`, which does nothing at all when the
// surface is clean. The mirror survives context loss so that a recreated
// surface can be re-uploaded in full.

use super::Texture;
use crate::display::{FrameBuffer, Rect, PALETTE_SIZE};
use crate::format::{cross_blit, negotiate, read_pixel, write_pixel, PixelFormat, TextureFormat};
use crate::gpu::{ApiProfile, DeviceError, Filter, GlContext, GpuDevice};

enum Backend {
    /// Mirror format is uploaded as is
    Direct { texture: Texture },

    /// Palette indices expanded on the CPU into an RGB format
    Clut8 {
        texture: Texture,
        converted: FrameBuffer,
        palette: Box<[u32; PALETTE_SIZE]>,
        color_key: Option<u8>,
    },

    /// Palette indices expanded by a render pass on the GPU
    Clut8Gpu {
        indices: Texture,
        palette_texture: Texture,
        target: Texture,
        palette: Box<[u8; PALETTE_SIZE * 4]>,
        palette_dirty: bool,
        color_key: Option<u8>,
    },

    /// RGB555 converted to RGB565 for profiles that cannot upload it
    Rgb555 {
        texture: Texture,
        converted: FrameBuffer,
    },
}

/// Texture with a CPU mirror, dirty tracking and optional palette
pub struct Surface {
    mirror: FrameBuffer,
    dirty: bool,
    dirty_area: Rect,
    backend: Backend,
}

impl Surface {
    fn with_backend(format: PixelFormat, backend: Backend) -> Self {
        Surface {
            mirror: FrameBuffer::empty(format),
            dirty: false,
            dirty_area: Rect::default(),
            backend,
        }
    }

    /// Surface uploading `format` through `texture_format` directly
    pub fn direct(texture_format: TextureFormat, format: PixelFormat) -> Self {
        Self::with_backend(
            format,
            Backend::Direct {
                texture: Texture::new(texture_format),
            },
        )
    }

    /// Palette indexed surface expanded on the CPU into `virtual_format`
    pub fn clut8(texture_format: TextureFormat, virtual_format: PixelFormat) -> Self {
        Self::with_backend(
            PixelFormat::CLUT8,
            Backend::Clut8 {
                texture: Texture::new(texture_format),
                converted: FrameBuffer::empty(virtual_format),
                palette: Box::new([0; PALETTE_SIZE]),
                color_key: None,
            },
        )
    }

    /// Palette indexed surface expanded on the GPU
    pub fn clut8_gpu() -> Self {
        // Lookups must never blend neighboring indices or palette entries.
        let indices = Texture::with_filter(TextureFormat::INDEX_BYTES, Filter::Nearest);
        let palette_texture = Texture::with_filter(TextureFormat::RGBA_BYTES, Filter::Nearest);

        Self::with_backend(
            PixelFormat::CLUT8,
            Backend::Clut8Gpu {
                indices,
                palette_texture,
                target: Texture::new(TextureFormat::RGBA_BYTES),
                palette: Box::new([0; PALETTE_SIZE * 4]),
                palette_dirty: true,
                color_key: None,
            },
        )
    }

    /// RGB555 surface converted to RGB565 on upload
    pub fn rgb555(profile: ApiProfile) -> Option<Self> {
        let texture_format = negotiate(&PixelFormat::RGB565, profile)?;
        Some(Self::with_backend(
            PixelFormat::RGB555,
            Backend::Rgb555 {
                texture: Texture::new(texture_format),
                converted: FrameBuffer::empty(PixelFormat::RGB565),
            },
        ))
    }

    /// Pixel format callers write into the surface
    pub fn format(&self) -> PixelFormat {
        self.mirror.format()
    }

    pub fn width(&self) -> u32 {
        self.mirror.width()
    }

    pub fn height(&self) -> u32 {
        self.mirror.height()
    }

    pub fn has_palette(&self) -> bool {
        matches!(self.backend, Backend::Clut8 { .. } | Backend::Clut8Gpu { .. })
    }

    pub fn uses_gpu_palette(&self) -> bool {
        matches!(self.backend, Backend::Clut8Gpu { .. })
    }

    /// CPU mirror of the surface content
    pub fn surface(&self) -> &FrameBuffer {
        &self.mirror
    }

    /// Mutable CPU mirror; callers must `flag_dirty` after writing
    pub fn surface_mut(&mut self) -> &mut FrameBuffer {
        &mut self.mirror
    }

    /// Texture to draw with
    pub fn texture(&self) -> &Texture {
        match &self.backend {
            Backend::Direct { texture }
            | Backend::Clut8 { texture, .. }
            | Backend::Rgb555 { texture, .. } => texture,
            Backend::Clut8Gpu { target, .. } => target,
        }
    }

    /// Resize the surface, discarding its content when the size changes
    pub fn allocate(&mut self, width: u32, height: u32) {
        self.mirror.resize(width, height);
        match &mut self.backend {
            Backend::Clut8 { converted, .. } | Backend::Rgb555 { converted, .. } => {
                converted.resize(width, height)
            }
            Backend::Direct { .. } | Backend::Clut8Gpu { .. } => {}
        }
        self.flag_dirty();
    }

    /// Copy a block of pixels in the surface format into the mirror
    pub fn copy_rect_to_texture(&mut self, x: u32, y: u32, width: u32, height: u32, buf: &[u8], pitch: usize) {
        self.mirror.copy_rect_from(x, y, width, height, buf, pitch);
        self.add_dirty_area(Rect::new(x as i32, y as i32, width, height));
    }

    /// Fill the whole surface with one packed color
    pub fn fill(&mut self, color: u32) {
        self.mirror.fill(color);
        self.flag_dirty();
    }

    /// Mark the whole surface for upload
    pub fn flag_dirty(&mut self) {
        self.dirty = true;
        self.dirty_area = self.mirror.bounds();
    }

    fn add_dirty_area(&mut self, area: Rect) {
        if self.dirty {
            self.dirty_area = self.dirty_area.union(&area);
        } else {
            self.dirty = true;
            self.dirty_area = area;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Area waiting for upload
    pub fn dirty_area(&self) -> Option<Rect> {
        self.dirty.then_some(self.dirty_area)
    }

    /// Switch between bilinear and nearest sampling
    pub fn enable_linear_filtering(&mut self, device: &mut dyn GpuDevice, enable: bool) {
        let filter = Filter::from_linear(enable);
        match &mut self.backend {
            Backend::Direct { texture }
            | Backend::Clut8 { texture, .. }
            | Backend::Rgb555 { texture, .. } => texture.set_filter(device, filter),
            Backend::Clut8Gpu { target, .. } => target.set_filter(device, filter),
        }
    }

    /// Replace palette entries starting at `start`
    ///
    /// Has no effect on surfaces without a palette.
    pub fn set_palette(&mut self, start: usize, colors: &[u8]) {
        let num = colors.len() / 3;
        match &mut self.backend {
            Backend::Clut8 {
                converted,
                palette,
                color_key,
                ..
            } => {
                let format = converted.format();
                for (i, rgb) in colors.chunks_exact(3).enumerate().take(PALETTE_SIZE - start) {
                    palette[start + i] = format.rgb_to_color(rgb[0], rgb[1], rgb[2]);
                }
                if let Some(key) = *color_key {
                    if (start..start + num).contains(&(key as usize)) {
                        palette[key as usize] &= !format.alpha_mask();
                    }
                }
            }
            Backend::Clut8Gpu {
                palette,
                palette_dirty,
                color_key,
                ..
            } => {
                for (i, rgb) in colors.chunks_exact(3).enumerate().take(PALETTE_SIZE - start) {
                    let entry = (start + i) * 4;
                    palette[entry..entry + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 0xFF]);
                }
                if let Some(key) = *color_key {
                    palette[key as usize * 4 + 3] = 0;
                }
                *palette_dirty = true;
            }
            Backend::Direct { .. } | Backend::Rgb555 { .. } => return,
        }
        self.flag_dirty();
    }

    /// Make palette entry `key` fully transparent
    ///
    /// Has no effect on surfaces without a palette.
    pub fn set_color_key(&mut self, key: u8) {
        match &mut self.backend {
            Backend::Clut8 {
                converted,
                palette,
                color_key,
                ..
            } => {
                palette[key as usize] &= !converted.format().alpha_mask();
                *color_key = Some(key);
            }
            Backend::Clut8Gpu {
                palette,
                palette_dirty,
                color_key,
                ..
            } => {
                palette[key as usize * 4 + 3] = 0;
                *color_key = Some(key);
                *palette_dirty = true;
            }
            Backend::Direct { .. } | Backend::Rgb555 { .. } => return,
        }
        self.flag_dirty();
    }

    /// Upload the dirty area to the hardware
    ///
    /// Does not touch the device at all when the surface is clean.
    pub fn update_gl_texture(&mut self, device: &mut dyn GpuDevice, ctx: &GlContext) -> Result<(), DeviceError> {
        if !self.dirty {
            return Ok(());
        }

        let (width, height) = (self.mirror.width(), self.mirror.height());
        let area = self.dirty_area.intersect(&self.mirror.bounds());
        let mirror = &self.mirror;

        match &mut self.backend {
            Backend::Direct { texture } => {
                texture.set_size(device, ctx, width, height)?;
                upload_from(texture, device, mirror, area);
            }
            Backend::Clut8 {
                texture,
                converted,
                palette,
                ..
            } => {
                expand_indices(mirror, converted, palette, area);
                texture.set_size(device, ctx, width, height)?;
                upload_from(texture, device, converted, area);
            }
            Backend::Rgb555 { texture, converted } => {
                if !area.is_empty() {
                    let dst_offset = converted.offset(area.x as u32, area.y as u32);
                    let dst_pitch = converted.pitch();
                    cross_blit(
                        &mut converted.as_mut_slice()[dst_offset..],
                        dst_pitch,
                        &PixelFormat::RGB565,
                        &mirror.as_slice()[mirror.offset(area.x as u32, area.y as u32)..],
                        mirror.pitch(),
                        &PixelFormat::RGB555,
                        area.width as usize,
                        area.height as usize,
                    );
                }
                texture.set_size(device, ctx, width, height)?;
                upload_from(texture, device, converted, area);
            }
            Backend::Clut8Gpu {
                indices,
                palette_texture,
                target,
                palette,
                palette_dirty,
                ..
            } => {
                indices.set_size(device, ctx, width, height)?;
                upload_from(indices, device, mirror, area);

                if *palette_dirty {
                    palette_texture.set_size(device, ctx, PALETTE_SIZE as u32, 1)?;
                    palette_texture.update_area(
                        device,
                        Rect::from_size(PALETTE_SIZE as u32, 1),
                        &palette[..],
                        PALETTE_SIZE * 4,
                    );
                    *palette_dirty = false;
                }

                target.set_size(device, ctx, width, height)?;
                if let (Some(t), Some(i), Some(p)) = (target.id(), indices.id(), palette_texture.id()) {
                    device.render_palette_lookup(t, i, p, width, height);
                }
            }
        }

        self.dirty = false;
        self.dirty_area = Rect::default();
        Ok(())
    }

    /// Release hardware resources, keeping the CPU content
    pub fn destroy(&mut self, device: &mut dyn GpuDevice) {
        for texture in self.textures_mut() {
            texture.destroy(device);
        }
    }

    /// Acquire hardware resources again and schedule a full upload
    pub fn recreate(&mut self, device: &mut dyn GpuDevice, ctx: &GlContext) -> Result<(), DeviceError> {
        for texture in self.textures_mut() {
            texture.recreate(device, ctx)?;
        }
        if let Backend::Clut8Gpu { palette_dirty, .. } = &mut self.backend {
            *palette_dirty = true;
        }
        self.flag_dirty();
        Ok(())
    }

    fn textures_mut(&mut self) -> Vec<&mut Texture> {
        match &mut self.backend {
            Backend::Direct { texture }
            | Backend::Clut8 { texture, .. }
            | Backend::Rgb555 { texture, .. } => vec![texture],
            Backend::Clut8Gpu {
                indices,
                palette_texture,
                target,
                ..
            } => vec![indices, palette_texture, target],
        }
    }
}

fn upload_from(texture: &mut Texture, device: &mut dyn GpuDevice, source: &FrameBuffer, area: Rect) {
    if area.is_empty() {
        return;
    }
    let offset = source.offset(area.x as u32, area.y as u32);
    texture.update_area(device, area, &source.as_slice()[offset..], source.pitch());
}

fn expand_indices(indices: &FrameBuffer, converted: &mut FrameBuffer, palette: &[u32; PALETTE_SIZE], area: Rect) {
    let bpp = converted.format().bytes_per_pixel;
    for y in area.y as u32..area.bottom() as u32 {
        for x in area.x as u32..area.right() as u32 {
            let index = read_pixel(&indices.as_slice()[indices.offset(x, y)..], 1);
            let offset = converted.offset(x, y);
            write_pixel(&mut converted.as_mut_slice()[offset..], bpp, palette[index as usize]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{Capabilities, SoftwareDevice};

    fn setup(caps: Capabilities) -> (SoftwareDevice, GlContext) {
        let mut ctx = GlContext::new();
        ctx.initialize(caps);
        (SoftwareDevice::new(caps), ctx)
    }

    fn rgba_surface() -> Surface {
        let format = PixelFormat::native_rgba();
        Surface::direct(TextureFormat::RGBA_BYTES, format)
    }

    #[test]
    fn test_clean_surface_issues_no_uploads() {
        let (mut device, ctx) = setup(Capabilities::desktop());
        let mut surface = rgba_surface();
        surface.allocate(16, 16);

        surface.update_gl_texture(&mut device, &ctx).unwrap();
        assert_eq!(device.stats().uploads, 1);

        device.reset_stats();
        surface.update_gl_texture(&mut device, &ctx).unwrap();
        surface.update_gl_texture(&mut device, &ctx).unwrap();
        assert_eq!(device.stats().uploads, 0);
        assert_eq!(device.stats().uploaded_bytes, 0);
    }

    #[test]
    fn test_partial_update_uploads_dirty_area_only() {
        let (mut device, ctx) = setup(Capabilities::desktop());
        let mut surface = rgba_surface();
        surface.allocate(16, 16);
        surface.update_gl_texture(&mut device, &ctx).unwrap();
        device.reset_stats();

        let block = [0xFFu8; 2 * 2 * 4];
        surface.copy_rect_to_texture(4, 4, 2, 2, &block, 8);
        assert!(surface.is_dirty());
        // Copying must not reach the hardware by itself.
        assert_eq!(device.stats().uploads, 0);

        surface.copy_rect_to_texture(8, 8, 2, 2, &block, 8);
        assert_eq!(surface.dirty_area(), Some(Rect::new(4, 4, 6, 6)));

        surface.update_gl_texture(&mut device, &ctx).unwrap();
        assert_eq!(device.stats().uploads, 1);
        assert_eq!(device.stats().uploaded_bytes, 6 * 6 * 4);
        assert!(!surface.is_dirty());
    }

    #[test]
    fn test_cpu_palette_expansion_and_color_key() {
        let (mut device, ctx) = setup(Capabilities::embedded());
        let mut surface = Surface::clut8(TextureFormat::RGBA_BYTES, PixelFormat::native_rgba());
        surface.allocate(2, 1);
        surface.set_palette(0, &[10, 20, 30, 40, 50, 60]);
        surface.copy_rect_to_texture(0, 0, 2, 1, &[0, 1], 2);
        surface.set_color_key(1);
        surface.update_gl_texture(&mut device, &ctx).unwrap();

        let id = surface.texture().id().unwrap();
        assert_eq!(device.texture_texel(id, 0, 0), Some([10, 20, 30, 255]));
        assert_eq!(device.texture_texel(id, 1, 0), Some([40, 50, 60, 0]));
    }

    #[test]
    fn test_color_key_survives_palette_reload() {
        let (mut device, ctx) = setup(Capabilities::embedded());
        let mut surface = Surface::clut8(TextureFormat::RGBA_BYTES, PixelFormat::native_rgba());
        surface.allocate(1, 1);
        surface.fill(3);
        surface.set_color_key(3);
        surface.set_palette(0, &[255; 12]);
        surface.update_gl_texture(&mut device, &ctx).unwrap();

        let id = surface.texture().id().unwrap();
        assert_eq!(device.texture_texel(id, 0, 0), Some([255, 255, 255, 0]));
    }

    #[test]
    fn test_gpu_palette_lookup() {
        let (mut device, ctx) = setup(Capabilities::desktop());
        let mut surface = Surface::clut8_gpu();
        surface.allocate(2, 2);
        let mut colors = vec![0u8; 256 * 3];
        colors[3 * 5..3 * 5 + 3].copy_from_slice(&[1, 2, 3]);
        surface.set_palette(0, &colors);
        surface.fill(5);
        surface.update_gl_texture(&mut device, &ctx).unwrap();

        assert_eq!(device.stats().palette_lookups, 1);
        let id = surface.texture().id().unwrap();
        assert_eq!(device.texture_texel(id, 1, 1), Some([1, 2, 3, 255]));
    }

    #[test]
    fn test_rgb555_conversion() {
        let (mut device, ctx) = setup(Capabilities::embedded());
        let mut surface = Surface::rgb555(ApiProfile::Embedded).unwrap();
        surface.allocate(1, 1);
        surface.fill(PixelFormat::RGB555.rgb_to_color(0xFF, 0, 0xFF));
        surface.update_gl_texture(&mut device, &ctx).unwrap();

        let id = surface.texture().id().unwrap();
        assert_eq!(device.texture_texel(id, 0, 0), Some([0xFF, 0, 0xFF, 0xFF]));
    }

    #[test]
    fn test_recreate_forces_full_upload() {
        let (mut device, ctx) = setup(Capabilities::desktop());
        let mut surface = rgba_surface();
        surface.allocate(4, 4);
        surface.fill(PixelFormat::native_rgba().rgb_to_color(0, 0xFF, 0));
        surface.update_gl_texture(&mut device, &ctx).unwrap();

        surface.destroy(&mut device);
        assert!(surface.texture().id().is_none());
        assert_eq!(surface.width(), 4);

        surface.recreate(&mut device, &ctx).unwrap();
        assert!(surface.is_dirty());
        device.reset_stats();
        surface.update_gl_texture(&mut device, &ctx).unwrap();
        assert_eq!(device.stats().uploaded_bytes, 4 * 4 * 4);

        let id = surface.texture().id().unwrap();
        assert_eq!(device.texture_texel(id, 3, 3), Some([0, 0xFF, 0, 0xFF]));
    }

    #[test]
    fn test_palette_calls_ignored_without_palette() {
        let mut surface = rgba_surface();
        surface.allocate(1, 1);
        let (mut device, ctx) = setup(Capabilities::desktop());
        surface.update_gl_texture(&mut device, &ctx).unwrap();

        surface.set_palette(0, &[1, 2, 3]);
        surface.set_color_key(0);
        assert!(!surface.is_dirty());
    }
}
