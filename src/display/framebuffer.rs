// Frame Buffer - CPU raster in an arbitrary pixel format
//
// Every surface keeps its logical content in a FrameBuffer so that it can be
// re-uploaded after the hardware texture is lost. Rows are tightly packed:
// the pitch is always width * bytes per pixel.

use super::geometry::Rect;
use crate::format::{cross_blit, read_pixel, write_pixel, PixelFormat};

/// Pixel raster with a known layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Create a zero-filled buffer
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = width as usize * height as usize * format.bytes_per_pixel as usize;
        Self {
            width,
            height,
            format,
            pixels: vec![0; size],
        }
    }

    /// Create an empty (0x0) buffer
    pub fn empty(format: PixelFormat) -> Self {
        Self::new(0, 0, format)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel as usize
    }

    /// Bytes between the start of two rows
    #[inline]
    pub fn pitch(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    /// Rectangle covering the whole buffer
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Change the size, discarding the content when the size changes
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        *self = Self::new(width, height, self.format);
    }

    /// Get the packed pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        let offset = y as usize * self.pitch() + x as usize * self.bytes_per_pixel();
        read_pixel(&self.pixels[offset..], self.format.bytes_per_pixel)
    }

    /// Set the packed pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: u32) {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        let offset = y as usize * self.pitch() + x as usize * self.bytes_per_pixel();
        write_pixel(&mut self.pixels[offset..], self.format.bytes_per_pixel, color);
    }

    /// Fill the whole buffer with one packed color
    pub fn fill(&mut self, color: u32) {
        self.fill_rect(self.bounds(), color);
    }

    /// Fill a rectangle, clipped to the buffer
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let area = rect.intersect(&self.bounds());
        if area.is_empty() {
            return;
        }

        let bpp = self.bytes_per_pixel();
        let mut pixel = [0u8; 4];
        write_pixel(&mut pixel, self.format.bytes_per_pixel, color);

        let pitch = self.pitch();
        for y in area.y as usize..area.bottom() as usize {
            let row = &mut self.pixels[y * pitch..(y + 1) * pitch];
            for x in area.x as usize..area.right() as usize {
                row[x * bpp..(x + 1) * bpp].copy_from_slice(&pixel[..bpp]);
            }
        }
    }

    /// Copy a `width` x `height` block from `buf` into the buffer at (x, y)
    ///
    /// `buf` must hold pixels in this buffer's format, rows `pitch` bytes apart.
    ///
    /// # Panics
    /// Panics if the block does not fit inside the buffer
    pub fn copy_rect_from(&mut self, x: u32, y: u32, width: u32, height: u32, buf: &[u8], pitch: usize) {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "Rectangle {}x{}+{}+{} out of bounds",
            width,
            height,
            x,
            y
        );

        let bpp = self.bytes_per_pixel();
        let row_bytes = width as usize * bpp;
        let dst_pitch = self.pitch();
        for row in 0..height as usize {
            let src = &buf[row * pitch..row * pitch + row_bytes];
            let offset = (y as usize + row) * dst_pitch + x as usize * bpp;
            self.pixels[offset..offset + row_bytes].copy_from_slice(src);
        }
    }

    /// Copy the whole buffer into `buf`, rows `pitch` bytes apart
    pub fn copy_to(&self, buf: &mut [u8], pitch: usize) {
        let row_bytes = self.pitch();
        for row in 0..self.height as usize {
            buf[row * pitch..row * pitch + row_bytes]
                .copy_from_slice(&self.pixels[row * row_bytes..(row + 1) * row_bytes]);
        }
    }

    /// Convert into another RGB format
    ///
    /// # Returns
    /// `None` when the conversion needs a palette
    pub fn convert_to(&self, format: PixelFormat) -> Option<FrameBuffer> {
        let mut converted = FrameBuffer::new(self.width, self.height, format);
        let dst_pitch = converted.pitch();
        let ok = cross_blit(
            &mut converted.pixels,
            dst_pitch,
            &format,
            &self.pixels,
            self.pitch(),
            &self.format,
            self.width as usize,
            self.height as usize,
        );
        ok.then_some(converted)
    }

    /// Byte offset of pixel (x, y)
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.pitch() + x as usize * self.bytes_per_pixel()
    }

    /// Get the raw pixel data
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// Get mutable access to the raw pixel data
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Draw a diagonal color bar pattern for debugging
    ///
    /// Palette indexed buffers get cycling indices, RGB buffers get eight
    /// saturated bars. `phase` scrolls the pattern.
    pub fn test_pattern(&mut self, phase: u32) {
        const BARS: [(u8, u8, u8); 8] = [
            (255, 255, 255),
            (255, 255, 0),
            (0, 255, 255),
            (0, 255, 0),
            (255, 0, 255),
            (255, 0, 0),
            (0, 0, 255),
            (0, 0, 0),
        ];

        for y in 0..self.height {
            for x in 0..self.width {
                let band = (x + y + phase) / 16;
                let color = if self.format.is_clut8() {
                    band % 256
                } else {
                    let (r, g, b) = BARS[band as usize % BARS.len()];
                    self.format.rgb_to_color(r, g, b)
                };
                self.set_pixel(x, y, color);
            }
        }
    }
}
