// Pixel conversion helpers
//
// Pixels are stored in native byte order, matching how the hardware upload
// paths read packed 16- and 32-bit words.

use super::PixelFormat;

/// Read one pixel of `bytes_per_pixel` bytes from the start of `bytes`
#[inline]
pub fn read_pixel(bytes: &[u8], bytes_per_pixel: u8) -> u32 {
    match bytes_per_pixel {
        1 => bytes[0] as u32,
        2 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
        3 => {
            if cfg!(target_endian = "little") {
                bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
            } else {
                (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
            }
        }
        4 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        other => panic!("unsupported pixel size: {} bytes", other),
    }
}

/// Write one pixel of `bytes_per_pixel` bytes to the start of `bytes`
#[inline]
pub fn write_pixel(bytes: &mut [u8], bytes_per_pixel: u8, value: u32) {
    match bytes_per_pixel {
        1 => bytes[0] = value as u8,
        2 => bytes[..2].copy_from_slice(&(value as u16).to_ne_bytes()),
        3 => {
            let [b0, b1, b2, _] = value.to_le_bytes();
            if cfg!(target_endian = "little") {
                bytes[..3].copy_from_slice(&[b0, b1, b2]);
            } else {
                bytes[..3].copy_from_slice(&[b2, b1, b0]);
            }
        }
        4 => bytes[..4].copy_from_slice(&value.to_ne_bytes()),
        other => panic!("unsupported pixel size: {} bytes", other),
    }
}

/// Convert a `width` x `height` block of pixels between two RGB formats
///
/// # Arguments
/// * `dst` / `dst_pitch` / `dst_format` - Destination rows and their layout
/// * `src` / `src_pitch` / `src_format` - Source rows and their layout
///
/// # Returns
/// `false` when either side is palette indexed and the formats differ,
/// since indices cannot be converted without a palette.
#[allow(clippy::too_many_arguments)]
pub fn cross_blit(
    dst: &mut [u8],
    dst_pitch: usize,
    dst_format: &PixelFormat,
    src: &[u8],
    src_pitch: usize,
    src_format: &PixelFormat,
    width: usize,
    height: usize,
) -> bool {
    let row_bytes_src = width * src_format.bytes_per_pixel as usize;

    if dst_format == src_format {
        for y in 0..height {
            let s = &src[y * src_pitch..y * src_pitch + row_bytes_src];
            dst[y * dst_pitch..y * dst_pitch + row_bytes_src].copy_from_slice(s);
        }
        return true;
    }

    if dst_format.is_clut8() || src_format.is_clut8() {
        return false;
    }

    let src_bpp = src_format.bytes_per_pixel as usize;
    let dst_bpp = dst_format.bytes_per_pixel as usize;
    for y in 0..height {
        let src_row = &src[y * src_pitch..];
        let dst_row = &mut dst[y * dst_pitch..];
        for x in 0..width {
            let color = read_pixel(&src_row[x * src_bpp..], src_format.bytes_per_pixel);
            let (a, r, g, b) = src_format.color_to_argb(color);
            let converted = dst_format.argb_to_color(a, r, g, b);
            write_pixel(&mut dst_row[x * dst_bpp..], dst_format.bytes_per_pixel, converted);
        }
    }
    true
}
