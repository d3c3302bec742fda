// Texture format negotiation
//
// Maps a `PixelFormat` onto the (internal format, upload format, upload
// type) triple the hardware understands. Embedded profiles only accept the
// four formats every implementation is required to support.

use super::PixelFormat;
use crate::gpu::ApiProfile;

/// Channel set the texture stores on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalFormat {
    /// Single channel, used for palette index textures
    Alpha,
    Rgb,
    Rgba,
}

/// Channel order of uploaded data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadFormat {
    Alpha,
    Rgb,
    Rgba,
    Bgra,
}

/// Component packing of uploaded data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadType {
    UnsignedByte,
    UnsignedShort565,
    UnsignedShort565Rev,
    UnsignedShort5551,
    UnsignedShort1555Rev,
    UnsignedShort4444,
    UnsignedShort4444Rev,
    UnsignedInt8888,
    UnsignedInt8888Rev,
}

/// A hardware-native texture format triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFormat {
    pub internal: InternalFormat,
    pub format: UploadFormat,
    pub ty: UploadType,
}

impl TextureFormat {
    pub const fn new(internal: InternalFormat, format: UploadFormat, ty: UploadType) -> Self {
        TextureFormat {
            internal,
            format,
            ty,
        }
    }

    /// Byte-per-component RGBA, available on every profile
    pub const RGBA_BYTES: TextureFormat = TextureFormat::new(
        InternalFormat::Rgba,
        UploadFormat::Rgba,
        UploadType::UnsignedByte,
    );

    /// One byte per texel, used for palette index textures
    pub const INDEX_BYTES: TextureFormat = TextureFormat::new(
        InternalFormat::Alpha,
        UploadFormat::Alpha,
        UploadType::UnsignedByte,
    );

    /// Size of one uploaded texel in bytes
    pub fn bytes_per_pixel(&self) -> usize {
        match self.ty {
            UploadType::UnsignedByte => match self.format {
                UploadFormat::Alpha => 1,
                UploadFormat::Rgb => 3,
                UploadFormat::Rgba | UploadFormat::Bgra => 4,
            },
            UploadType::UnsignedInt8888 | UploadType::UnsignedInt8888Rev => 4,
            _ => 2,
        }
    }

    /// Decode one uploaded texel into 8-bit RGBA
    ///
    /// Packed types read a native-endian word. Non-reversed types place the
    /// first component of the upload format in the most significant bits,
    /// reversed types place it in the least significant bits.
    pub fn decode_rgba(&self, texel: &[u8]) -> [u8; 4] {
        let order: &[usize] = match self.format {
            UploadFormat::Alpha => &[3],
            UploadFormat::Rgb => &[0, 1, 2],
            UploadFormat::Rgba => &[0, 1, 2, 3],
            UploadFormat::Bgra => &[2, 1, 0, 3],
        };

        let mut rgba = [0u8, 0, 0, 0xFF];
        let (word, bits, reversed): (u32, &[u32], bool) = match self.ty {
            UploadType::UnsignedByte => {
                for (i, &channel) in order.iter().enumerate() {
                    rgba[channel] = texel[i];
                }
                return self.apply_internal(rgba);
            }
            UploadType::UnsignedShort565 => (read_u16(texel), &[5, 6, 5], false),
            UploadType::UnsignedShort565Rev => (read_u16(texel), &[5, 6, 5], true),
            UploadType::UnsignedShort5551 => (read_u16(texel), &[5, 5, 5, 1], false),
            UploadType::UnsignedShort1555Rev => (read_u16(texel), &[5, 5, 5, 1], true),
            UploadType::UnsignedShort4444 => (read_u16(texel), &[4, 4, 4, 4], false),
            UploadType::UnsignedShort4444Rev => (read_u16(texel), &[4, 4, 4, 4], true),
            UploadType::UnsignedInt8888 => (read_u32(texel), &[8, 8, 8, 8], false),
            UploadType::UnsignedInt8888Rev => (read_u32(texel), &[8, 8, 8, 8], true),
        };

        let total: u32 = bits.iter().sum();
        let mut position = if reversed { 0 } else { total };
        for (component, &width) in bits.iter().enumerate() {
            let shift = if reversed {
                let s = position;
                position += width;
                s
            } else {
                position -= width;
                position
            };
            let max = (1u32 << width) - 1;
            let value = (word >> shift) & max;
            if let Some(&channel) = order.get(component) {
                rgba[channel] = (value * 255 / max) as u8;
            }
        }
        self.apply_internal(rgba)
    }

    fn apply_internal(&self, mut rgba: [u8; 4]) -> [u8; 4] {
        if self.internal == InternalFormat::Rgb {
            rgba[3] = 0xFF;
        }
        rgba
    }
}

#[inline]
fn read_u16(texel: &[u8]) -> u32 {
    u16::from_ne_bytes([texel[0], texel[1]]) as u32
}

#[inline]
fn read_u32(texel: &[u8]) -> u32 {
    u32::from_ne_bytes([texel[0], texel[1], texel[2], texel[3]])
}

/// Find the hardware texture format for a pixel format
///
/// # Arguments
/// * `format` - The pixel layout the caller will upload
/// * `profile` - The API profile of the current context
///
/// # Returns
/// The texture format triple, or `None` when the profile cannot upload
/// this layout directly. Palette indexed formats always return `None`;
/// they are handled by the dedicated indexed surface paths.
pub fn negotiate(format: &PixelFormat, profile: ApiProfile) -> Option<TextureFormat> {
    use InternalFormat as I;
    use UploadFormat as F;
    use UploadType as T;

    let little_endian = cfg!(target_endian = "little");

    if *format == PixelFormat::native_rgba() {
        return Some(TextureFormat::new(I::Rgba, F::Rgba, T::UnsignedByte));
    } else if *format == PixelFormat::RGB565 {
        return Some(TextureFormat::new(I::Rgb, F::Rgb, T::UnsignedShort565));
    } else if *format == PixelFormat::RGBA5551 {
        return Some(TextureFormat::new(I::Rgba, F::Rgba, T::UnsignedShort5551));
    } else if *format == PixelFormat::RGBA4444 {
        return Some(TextureFormat::new(I::Rgba, F::Rgba, T::UnsignedShort4444));
    }

    // Everything below is optional on embedded implementations.
    if profile.is_embedded() {
        return None;
    }

    let triple = if little_endian && *format == PixelFormat::RGBA8888 {
        TextureFormat::new(I::Rgba, F::Rgba, T::UnsignedInt8888)
    } else if !little_endian && *format == PixelFormat::ABGR8888 {
        TextureFormat::new(I::Rgba, F::Rgba, T::UnsignedInt8888Rev)
    } else if *format == PixelFormat::RGB555 {
        TextureFormat::new(I::Rgb, F::Bgra, T::UnsignedShort1555Rev)
    } else if *format == PixelFormat::ARGB4444 {
        TextureFormat::new(I::Rgba, F::Bgra, T::UnsignedShort4444Rev)
    } else if *format == PixelFormat::BGRA8888 {
        TextureFormat::new(I::Rgba, F::Bgra, T::UnsignedInt8888)
    } else if *format == PixelFormat::BGR565 {
        TextureFormat::new(I::Rgb, F::Rgb, T::UnsignedShort565Rev)
    } else if *format == PixelFormat::BGRA5551 {
        TextureFormat::new(I::Rgba, F::Bgra, T::UnsignedShort5551)
    } else if *format == PixelFormat::ABGR4444 {
        TextureFormat::new(I::Rgba, F::Rgba, T::UnsignedShort4444Rev)
    } else if *format == PixelFormat::BGRA4444 {
        TextureFormat::new(I::Rgba, F::Bgra, T::UnsignedShort4444)
    } else {
        return None;
    };

    Some(triple)
}
