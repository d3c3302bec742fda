// Software device - CPU implementation of the GPU contract
//
// Textures are decoded to RGBA on upload and sampled with nearest or
// bilinear filtering. The framebuffer is RGBA, top row first. Every call
// that would reach real hardware is counted in `DeviceStats`.

use super::{Capabilities, DeviceError, Filter, GpuDevice, ProgramId, TextureId};
use crate::display::Rect;
use crate::format::{PixelFormat, TextureFormat};
use std::collections::HashMap;

/// Counters of hardware work issued to the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Texture uploads (sub-image calls)
    pub uploads: u64,
    /// Bytes read from client memory by uploads
    pub uploaded_bytes: u64,
    pub draws: u64,
    pub clears: u64,
    pub presents: u64,
    pub palette_lookups: u64,
}

struct SoftTexture {
    width: u32,
    height: u32,
    filter: Filter,
    texels: Vec<[u8; 4]>,
}

impl SoftTexture {
    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let t = self.texels[y * self.width as usize + x];
        [t[0] as f32, t[1] as f32, t[2] as f32, t[3] as f32]
    }

    fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }

        let fx = u * self.width as f32;
        let fy = v * self.height as f32;
        match self.filter {
            Filter::Nearest => self.texel(fx.floor() as i64, fy.floor() as i64),
            Filter::Linear => {
                let x = fx - 0.5;
                let y = fy - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let ax = x - x0;
                let ay = y - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let c00 = self.texel(x0, y0);
                let c10 = self.texel(x0 + 1, y0);
                let c01 = self.texel(x0, y0 + 1);
                let c11 = self.texel(x0 + 1, y0 + 1);

                let mut out = [0.0; 4];
                for i in 0..4 {
                    let top = c00[i] + (c10[i] - c00[i]) * ax;
                    let bottom = c01[i] + (c11[i] - c01[i]) * ax;
                    out[i] = top + (bottom - top) * ay;
                }
                out
            }
        }
    }
}

/// CPU-backed graphics device
pub struct SoftwareDevice {
    caps: Capabilities,
    video_mode_limit: Option<(u32, u32)>,
    last_video_mode: Option<(u32, u32)>,

    next_id: u32,
    textures: HashMap<u32, SoftTexture>,
    programs: HashMap<u32, [f32; 4]>,
    current_program: Option<ProgramId>,
    vertex_color: [f32; 4],

    width: u32,
    height: u32,
    framebuffer: Vec<u8>,
    clear_color: [f32; 4],
    blend: bool,
    scissor_test: bool,
    scissor: (i32, i32, u32, u32),

    stats: DeviceStats,
}

impl SoftwareDevice {
    /// Create a device reporting the given capabilities
    pub fn new(caps: Capabilities) -> Self {
        SoftwareDevice {
            caps,
            video_mode_limit: None,
            last_video_mode: None,
            next_id: 1,
            textures: HashMap::new(),
            programs: HashMap::new(),
            current_program: None,
            vertex_color: [1.0; 4],
            width: 0,
            height: 0,
            framebuffer: Vec::new(),
            clear_color: [0.0; 4],
            blend: false,
            scissor_test: false,
            scissor: (0, 0, 0, 0),
            stats: DeviceStats::default(),
        }
    }

    /// Reject video modes larger than `width` x `height`
    pub fn with_video_mode_limit(mut self, width: u32, height: u32) -> Self {
        self.video_mode_limit = Some((width, height));
        self
    }

    pub fn set_video_mode_limit(&mut self, limit: Option<(u32, u32)>) {
        self.video_mode_limit = limit;
    }

    pub fn set_capabilities(&mut self, caps: Capabilities) {
        self.caps = caps;
    }

    /// The last video mode the platform accepted
    pub fn last_video_mode(&self) -> Option<(u32, u32)> {
        self.last_video_mode
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DeviceStats::default();
    }

    /// Drop every hardware resource, as a device reset would
    pub fn lose_context(&mut self) {
        self.textures.clear();
        self.programs.clear();
        self.current_program = None;
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn is_texture_live(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id.0)
    }

    /// Decoded RGBA texel of a texture
    pub fn texture_texel(&self, id: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        let texture = self.textures.get(&id.0)?;
        if x >= texture.width || y >= texture.height {
            return None;
        }
        Some(texture.texels[(y * texture.width + x) as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA framebuffer, top row first
    pub fn frame(&self) -> &[u8] {
        &self.framebuffer
    }

    /// RGBA value of one framebuffer pixel, origin top-left
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * self.width + x) * 4) as usize;
        [
            self.framebuffer[offset],
            self.framebuffer[offset + 1],
            self.framebuffer[offset + 2],
            self.framebuffer[offset + 3],
        ]
    }

    fn active_color(&self) -> [f32; 4] {
        match self.current_program {
            Some(program) => self.programs.get(&program.0).copied().unwrap_or([1.0; 4]),
            None => self.vertex_color,
        }
    }

    /// Rows and columns drawing may touch, in top-down framebuffer space
    fn clip_bounds(&self) -> (i64, i64, i64, i64) {
        let (mut left, mut top) = (0i64, 0i64);
        let (mut right, mut bottom) = (self.width as i64, self.height as i64);
        if self.scissor_test {
            let (sx, sy, sw, sh) = self.scissor;
            left = left.max(sx as i64);
            right = right.min(sx as i64 + sw as i64);
            top = top.max(self.height as i64 - (sy as i64 + sh as i64));
            bottom = bottom.min(self.height as i64 - sy as i64);
        }
        (left, top, right, bottom)
    }
}

impl GpuDevice for SoftwareDevice {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn load_video_mode(&mut self, width: u32, height: u32, _format: &PixelFormat) -> bool {
        if let Some((max_w, max_h)) = self.video_mode_limit {
            if width > max_w || height > max_h {
                return false;
            }
        }
        self.last_video_mode = Some((width, height));
        true
    }

    fn create_texture(&mut self) -> Result<TextureId, DeviceError> {
        let id = self.next_id;
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| DeviceError::TextureCreation("texture names exhausted".into()))?;
        self.textures.insert(
            id,
            SoftTexture {
                width: 0,
                height: 0,
                filter: Filter::Linear,
                texels: Vec::new(),
            },
        );
        Ok(TextureId(id))
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.textures.remove(&id.0);
    }

    fn set_texture_filter(&mut self, id: TextureId, filter: Filter) {
        if let Some(texture) = self.textures.get_mut(&id.0) {
            texture.filter = filter;
        }
    }

    fn allocate_texture(&mut self, id: TextureId, width: u32, height: u32, _format: TextureFormat) {
        if let Some(texture) = self.textures.get_mut(&id.0) {
            texture.width = width;
            texture.height = height;
            texture.texels = vec![[0; 4]; (width * height) as usize];
        }
    }

    fn upload_texture(
        &mut self,
        id: TextureId,
        region: Rect,
        format: TextureFormat,
        data: &[u8],
        pitch: usize,
    ) {
        let Some(texture) = self.textures.get_mut(&id.0) else {
            return;
        };
        let bpp = format.bytes_per_pixel();

        for row in 0..region.height as usize {
            let ty = region.y as usize + row;
            if ty >= texture.height as usize {
                break;
            }
            let src_row = &data[row * pitch..];
            for col in 0..region.width as usize {
                let tx = region.x as usize + col;
                if tx >= texture.width as usize {
                    break;
                }
                texture.texels[ty * texture.width as usize + tx] =
                    format.decode_rgba(&src_row[col * bpp..col * bpp + bpp]);
            }
        }

        self.stats.uploads += 1;
        self.stats.uploaded_bytes += region.width as u64 * region.height as u64 * bpp as u64;
    }

    fn render_palette_lookup(
        &mut self,
        target: TextureId,
        indices: TextureId,
        palette: TextureId,
        width: u32,
        height: u32,
    ) {
        let (Some(index_tex), Some(palette_tex)) =
            (self.textures.get(&indices.0), self.textures.get(&palette.0))
        else {
            return;
        };

        let mut expanded = Vec::with_capacity((width * height) as usize);
        for y in 0..height.min(index_tex.height) {
            for x in 0..width.min(index_tex.width) {
                let index = index_tex.texels[(y * index_tex.width + x) as usize][3];
                let color = palette_tex
                    .texels
                    .get(index as usize)
                    .copied()
                    .unwrap_or([0; 4]);
                expanded.push((x, y, color));
            }
        }

        if let Some(target_tex) = self.textures.get_mut(&target.0) {
            for (x, y, color) in expanded {
                if x < target_tex.width && y < target_tex.height {
                    target_tex.texels[(y * target_tex.width + x) as usize] = color;
                }
            }
        }
        self.stats.palette_lookups += 1;
    }

    fn create_program(&mut self) -> Result<ProgramId, DeviceError> {
        if !self.caps.shaders_supported {
            return Err(DeviceError::ProgramCreation(
                "shaders are not supported by this context".into(),
            ));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.programs.insert(id, [1.0; 4]);
        Ok(ProgramId(id))
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.programs.remove(&id.0);
        if self.current_program == Some(id) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
    }

    fn set_program_color(&mut self, program: ProgramId, color: [f32; 4]) {
        if let Some(uniform) = self.programs.get_mut(&program.0) {
            *uniform = color;
        }
    }

    fn set_vertex_color(&mut self, color: [f32; 4]) {
        self.vertex_color = color;
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.framebuffer = vec![0; (width * height * 4) as usize];
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    fn set_scissor_test(&mut self, enabled: bool) {
        self.scissor_test = enabled;
    }

    fn set_scissor_box(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.scissor = (x, y, width, height);
    }

    fn clear(&mut self) {
        let (left, top, right, bottom) = self.clip_bounds();
        let color = self.clear_color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        for y in top..bottom {
            for x in left..right {
                let offset = ((y as u32 * self.width + x as u32) * 4) as usize;
                self.framebuffer[offset..offset + 4].copy_from_slice(&color);
            }
        }
        self.stats.clears += 1;
    }

    fn draw_textured_quad(&mut self, texture: TextureId, vertices: &[f32; 8], tex_coords: &[f32; 8]) {
        self.stats.draws += 1;

        let (x0, y0, x1, y1) = (vertices[0], vertices[1], vertices[6], vertices[7]);
        let (u0, v0, u1, v1) = (tex_coords[0], tex_coords[1], tex_coords[6], tex_coords[7]);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let color = self.active_color();
        let blend = self.blend;
        let (left, top, right, bottom) = self.clip_bounds();
        let left = left.max(x0.floor() as i64);
        let right = right.min(x1.ceil() as i64);
        let top = top.max(y0.floor() as i64);
        let bottom = bottom.min(y1.ceil() as i64);

        let Some(tex) = self.textures.get(&texture.0) else {
            return;
        };

        for py in top..bottom {
            let fy = (py as f32 + 0.5 - y0) / (y1 - y0);
            if !(0.0..1.0).contains(&fy) {
                continue;
            }
            let v = v0 + fy * (v1 - v0);
            for px in left..right {
                let fx = (px as f32 + 0.5 - x0) / (x1 - x0);
                if !(0.0..1.0).contains(&fx) {
                    continue;
                }
                let u = u0 + fx * (u1 - u0);
                let sample = tex.sample(u, v);

                let src = [
                    sample[0] / 255.0 * color[0],
                    sample[1] / 255.0 * color[1],
                    sample[2] / 255.0 * color[2],
                    sample[3] / 255.0 * color[3],
                ];

                let offset = ((py as u32 * self.width + px as u32) * 4) as usize;
                let dst = &mut self.framebuffer[offset..offset + 4];
                for i in 0..4 {
                    let value = if blend {
                        let d = dst[i] as f32 / 255.0;
                        src[i] * src[3] + d * (1.0 - src[3])
                    } else {
                        src[i]
                    };
                    dst[i] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
        }
    }

    fn read_pixels(&mut self, width: u32, height: u32) -> Vec<u8> {
        let width = width.min(self.width) as usize;
        let height = height.min(self.height) as usize;
        let line_size = width * 3 + width % 4;

        let mut pixels = vec![0u8; line_size * height];
        for row in 0..height {
            // Row 0 of the read-back is the bottom row of the screen.
            let src_y = self.height as usize - 1 - row;
            for x in 0..width {
                let src = (src_y * self.width as usize + x) * 4;
                let dst = row * line_size + x * 3;
                pixels[dst..dst + 3].copy_from_slice(&self.framebuffer[src..src + 3]);
            }
        }
        pixels
    }

    fn present(&mut self) {
        self.stats.presents += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_texture(device: &mut SoftwareDevice, rgba: [u8; 4], w: u32, h: u32) -> TextureId {
        let id = device.create_texture().unwrap();
        device.set_texture_filter(id, Filter::Nearest);
        device.allocate_texture(id, w, h, TextureFormat::RGBA_BYTES);
        let data: Vec<u8> = (0..w * h).flat_map(|_| rgba).collect();
        device.upload_texture(
            id,
            Rect::new(0, 0, w, h),
            TextureFormat::RGBA_BYTES,
            &data,
            (w * 4) as usize,
        );
        id
    }

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> [f32; 8] {
        [x0, y0, x1, y0, x0, y1, x1, y1]
    }

    const FULL: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];

    #[test]
    fn test_draw_covers_destination_only() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        device.set_viewport(8, 8);
        let red = solid_texture(&mut device, [255, 0, 0, 255], 2, 2);

        device.draw_textured_quad(red, &quad(2.0, 2.0, 6.0, 6.0), &FULL);

        assert_eq!(device.pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(device.pixel(5, 5), [255, 0, 0, 255]);
        assert_eq!(device.pixel(1, 1), [0, 0, 0, 0]);
        assert_eq!(device.pixel(6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn test_scissor_limits_clear() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        device.set_viewport(4, 4);
        device.set_clear_color([1.0, 1.0, 1.0, 1.0]);
        device.set_scissor_test(true);
        // Bottom-left origin: the lower half of the screen.
        device.set_scissor_box(0, 0, 4, 2);
        device.clear();

        assert_eq!(device.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(device.pixel(0, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_blending_uses_source_alpha() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        device.set_viewport(1, 1);
        let white = solid_texture(&mut device, [255, 255, 255, 255], 1, 1);
        let black = solid_texture(&mut device, [0, 0, 0, 255], 1, 1);
        device.set_blend(true);

        device.draw_textured_quad(white, &quad(0.0, 0.0, 1.0, 1.0), &FULL);
        device.set_vertex_color([1.0, 1.0, 1.0, 0.5]);
        device.draw_textured_quad(black, &quad(0.0, 0.0, 1.0, 1.0), &FULL);

        let [r, _, _, _] = device.pixel(0, 0);
        assert!((126..=129).contains(&r), "got {}", r);
    }

    #[test]
    fn test_program_color_overrides_vertex_color() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        device.set_viewport(1, 1);
        let white = solid_texture(&mut device, [255, 255, 255, 255], 1, 1);
        let program = device.create_program().unwrap();
        device.set_program_color(program, [0.0, 1.0, 0.0, 1.0]);
        device.use_program(Some(program));
        device.set_vertex_color([1.0, 0.0, 0.0, 1.0]);

        device.draw_textured_quad(white, &quad(0.0, 0.0, 1.0, 1.0), &FULL);
        assert_eq!(device.pixel(0, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn test_programs_need_shader_support() {
        let mut device = SoftwareDevice::new(Capabilities::embedded());
        assert!(device.create_program().is_err());
    }

    #[test]
    fn test_palette_lookup_expands_indices() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        let indices = device.create_texture().unwrap();
        device.allocate_texture(indices, 2, 1, TextureFormat::INDEX_BYTES);
        device.upload_texture(
            indices,
            Rect::new(0, 0, 2, 1),
            TextureFormat::INDEX_BYTES,
            &[1, 0],
            2,
        );

        let palette = device.create_texture().unwrap();
        device.allocate_texture(palette, 256, 1, TextureFormat::RGBA_BYTES);
        let mut colors = vec![0u8; 256 * 4];
        colors[4..8].copy_from_slice(&[10, 20, 30, 255]);
        device.upload_texture(
            palette,
            Rect::new(0, 0, 256, 1),
            TextureFormat::RGBA_BYTES,
            &colors,
            1024,
        );

        let target = device.create_texture().unwrap();
        device.allocate_texture(target, 2, 1, TextureFormat::RGBA_BYTES);
        device.render_palette_lookup(target, indices, palette, 2, 1);

        assert_eq!(device.texture_texel(target, 0, 0), Some([10, 20, 30, 255]));
        assert_eq!(device.texture_texel(target, 1, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_read_pixels_is_bottom_up_and_padded() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        device.set_viewport(3, 2);
        let red = solid_texture(&mut device, [255, 0, 0, 255], 1, 1);
        // Paint the top row only.
        device.draw_textured_quad(red, &quad(0.0, 0.0, 3.0, 1.0), &FULL);

        let pixels = device.read_pixels(3, 2);
        // 3 * 3 bytes + 3 padding bytes per row.
        assert_eq!(pixels.len(), 24);
        assert_eq!(&pixels[0..3], &[0, 0, 0]);
        assert_eq!(&pixels[12..15], &[255, 0, 0]);
    }

    #[test]
    fn test_lose_context_drops_resources() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        let id = device.create_texture().unwrap();
        assert!(device.is_texture_live(id));

        device.lose_context();
        assert!(!device.is_texture_live(id));
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn test_video_mode_limit() {
        let mut device = SoftwareDevice::new(Capabilities::desktop()).with_video_mode_limit(640, 480);
        assert!(device.load_video_mode(320, 240, &PixelFormat::CLUT8));
        assert!(!device.load_video_mode(1024, 768, &PixelFormat::CLUT8));
        assert_eq!(device.last_video_mode(), Some((320, 240)));
    }
}
