// Pixel formats - Bit layout descriptors for game, overlay and cursor rasters
//
// A `PixelFormat` describes how a single pixel is packed into 1, 2 or 4
// bytes: how many bits each channel keeps and where it sits in the native-
// endian pixel word. One byte per pixel always means palette indices (CLUT8).

pub mod convert;
pub mod negotiate;

pub use convert::{cross_blit, read_pixel, write_pixel};
pub use negotiate::{negotiate, InternalFormat, TextureFormat, UploadFormat, UploadType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel layout of a raster
///
/// Channel precision is stored as "loss" (8 - bits) so that expanding a
/// channel back to 8 bits is a single shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelFormat {
    pub bytes_per_pixel: u8,
    pub r_loss: u8,
    pub g_loss: u8,
    pub b_loss: u8,
    pub a_loss: u8,
    pub r_shift: u8,
    pub g_shift: u8,
    pub b_shift: u8,
    pub a_shift: u8,
}

impl PixelFormat {
    /// Palette indexed, one byte per pixel
    pub const CLUT8: PixelFormat = PixelFormat::new(1, 0, 0, 0, 0, 0, 0, 0, 0);
    pub const RGB565: PixelFormat = PixelFormat::new(2, 5, 6, 5, 0, 11, 5, 0, 0);
    pub const RGB555: PixelFormat = PixelFormat::new(2, 5, 5, 5, 0, 10, 5, 0, 0);
    pub const RGBA5551: PixelFormat = PixelFormat::new(2, 5, 5, 5, 1, 11, 6, 1, 0);
    pub const RGBA4444: PixelFormat = PixelFormat::new(2, 4, 4, 4, 4, 12, 8, 4, 0);
    pub const ARGB4444: PixelFormat = PixelFormat::new(2, 4, 4, 4, 4, 8, 4, 0, 12);
    pub const BGR565: PixelFormat = PixelFormat::new(2, 5, 6, 5, 0, 0, 5, 11, 0);
    pub const BGRA5551: PixelFormat = PixelFormat::new(2, 5, 5, 5, 1, 1, 6, 11, 0);
    pub const ABGR4444: PixelFormat = PixelFormat::new(2, 4, 4, 4, 4, 0, 4, 8, 12);
    pub const BGRA4444: PixelFormat = PixelFormat::new(2, 4, 4, 4, 4, 4, 8, 12, 0);
    pub const RGBA8888: PixelFormat = PixelFormat::new(4, 8, 8, 8, 8, 24, 16, 8, 0);
    pub const ABGR8888: PixelFormat = PixelFormat::new(4, 8, 8, 8, 8, 0, 8, 16, 24);
    pub const BGRA8888: PixelFormat = PixelFormat::new(4, 8, 8, 8, 8, 8, 16, 24, 0);
    pub const ARGB8888: PixelFormat = PixelFormat::new(4, 8, 8, 8, 8, 16, 8, 0, 24);

    /// Build a format from channel bit counts and shifts
    ///
    /// A one-byte format is always treated as palette indexed, whatever
    /// channel layout is passed in.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        bytes_per_pixel: u8,
        r_bits: u8,
        g_bits: u8,
        b_bits: u8,
        a_bits: u8,
        r_shift: u8,
        g_shift: u8,
        b_shift: u8,
        a_shift: u8,
    ) -> Self {
        if bytes_per_pixel == 1 {
            return PixelFormat {
                bytes_per_pixel: 1,
                r_loss: 8,
                g_loss: 8,
                b_loss: 8,
                a_loss: 8,
                r_shift: 0,
                g_shift: 0,
                b_shift: 0,
                a_shift: 0,
            };
        }

        PixelFormat {
            bytes_per_pixel,
            r_loss: 8 - r_bits,
            g_loss: 8 - g_bits,
            b_loss: 8 - b_bits,
            a_loss: 8 - a_bits,
            r_shift,
            g_shift,
            b_shift,
            a_shift,
        }
    }

    /// The RGBA8888 layout whose bytes in memory are R, G, B, A on this host
    ///
    /// This is the layout every API profile can upload as plain bytes.
    pub const fn native_rgba() -> Self {
        if cfg!(target_endian = "little") {
            PixelFormat::ABGR8888
        } else {
            PixelFormat::RGBA8888
        }
    }

    #[inline]
    pub fn is_clut8(&self) -> bool {
        self.bytes_per_pixel == 1
    }

    pub fn r_bits(&self) -> u8 {
        8 - self.r_loss
    }

    pub fn g_bits(&self) -> u8 {
        8 - self.g_loss
    }

    pub fn b_bits(&self) -> u8 {
        8 - self.b_loss
    }

    pub fn a_bits(&self) -> u8 {
        8 - self.a_loss
    }

    /// Mask selecting the alpha bits of a packed pixel (0 when there is no alpha)
    pub fn alpha_mask(&self) -> u32 {
        if self.is_clut8() || self.a_bits() == 0 {
            return 0;
        }
        (0xFFu32 >> self.a_loss) << self.a_shift
    }

    /// Pack an opaque color
    #[inline]
    pub fn rgb_to_color(&self, r: u8, g: u8, b: u8) -> u32 {
        self.argb_to_color(0xFF, r, g, b)
    }

    /// Pack a color with alpha
    ///
    /// Alpha is dropped silently for formats without alpha bits.
    pub fn argb_to_color(&self, a: u8, r: u8, g: u8, b: u8) -> u32 {
        if self.is_clut8() {
            return 0;
        }

        let mut color = ((r as u32 >> self.r_loss) << self.r_shift)
            | ((g as u32 >> self.g_loss) << self.g_shift)
            | ((b as u32 >> self.b_loss) << self.b_shift);
        if self.a_bits() > 0 {
            color |= (a as u32 >> self.a_loss) << self.a_shift;
        }
        color
    }

    /// Unpack a color into 8-bit channels (A, R, G, B)
    ///
    /// Channels are expanded by replicating the high bits so that a full
    /// channel maps back to 0xFF.
    pub fn color_to_argb(&self, color: u32) -> (u8, u8, u8, u8) {
        if self.is_clut8() {
            return (0xFF, 0, 0, 0);
        }

        let r = expand_channel(color, self.r_shift, self.r_loss);
        let g = expand_channel(color, self.g_shift, self.g_loss);
        let b = expand_channel(color, self.b_shift, self.b_loss);
        let a = if self.a_bits() == 0 {
            0xFF
        } else {
            expand_channel(color, self.a_shift, self.a_loss)
        };
        (a, r, g, b)
    }

    /// Unpack a color into 8-bit R, G, B
    pub fn color_to_rgb(&self, color: u32) -> (u8, u8, u8) {
        let (_, r, g, b) = self.color_to_argb(color);
        (r, g, b)
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::CLUT8
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clut8() {
            return write!(f, "CLUT8");
        }

        // Channels are listed from the most significant position down.
        let mut channels = [
            ('R', self.r_bits(), self.r_shift),
            ('G', self.g_bits(), self.g_shift),
            ('B', self.b_bits(), self.b_shift),
            ('A', self.a_bits(), self.a_shift),
        ];
        channels.sort_by(|a, b| b.2.cmp(&a.2));

        let present: Vec<_> = channels.iter().filter(|c| c.1 > 0).collect();
        for (name, _, _) in &present {
            write!(f, "{}", name)?;
        }
        for (_, bits, _) in &present {
            write!(f, "{}", bits)?;
        }
        Ok(())
    }
}

#[inline]
fn expand_channel(color: u32, shift: u8, loss: u8) -> u8 {
    let bits = 8 - loss as u32;
    if bits == 0 {
        return 0;
    }
    let value = (color >> shift) & ((1 << bits) - 1);
    let mut expanded = value << (8 - bits);
    // Replicate high bits into the vacated low bits.
    let mut filled = bits;
    while filled < 8 {
        expanded |= expanded >> filled;
        filled *= 2;
    }
    (expanded & 0xFF) as u8
}
