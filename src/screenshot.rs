// Screenshot functionality
//
// Encodes the composed output frame as BMP or PNG. The input is the
// device read-back: bottom-up RGB rows, each padded to a multiple of four
// bytes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of the BMP file and info headers
pub const BMP_HEADER_SIZE: u32 = 54;

/// Errors that can occur during screenshot operations
#[derive(Debug, Error)]
pub enum ScreenshotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// Nothing to capture
    #[error("output has no size")]
    EmptyOutput,

    /// The read-back holds fewer bytes than the image needs
    #[error("read-back too short: {actual} bytes, {expected} needed")]
    ShortReadback { expected: usize, actual: usize },
}

/// Screenshot image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Bmp,
    Png,
}

impl ScreenshotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ScreenshotFormat::Bmp => "bmp",
            ScreenshotFormat::Png => "png",
        }
    }
}

/// Bytes per row of a 24-bit BMP of the given width
#[inline]
pub fn line_size(width: u32) -> usize {
    // width * 3 + padding, where the padding 4 - (width * 3) % 4 equals width % 4
    width as usize * 3 + width as usize % 4
}

/// Size of the read-back for an image, checked against `pixels`
fn readback_size(width: u32, height: u32, pixels: &[u8]) -> Result<usize, ScreenshotError> {
    let expected = line_size(width) * height as usize;
    if pixels.len() < expected {
        return Err(ScreenshotError::ShortReadback {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(expected)
}

/// Encode a read-back frame as a 24-bit BMP file
///
/// # Arguments
///
/// * `width` - Image width
/// * `height` - Image height
/// * `pixels` - Bottom-up RGB rows of `line_size(width)` bytes
///
/// # Returns
///
/// The complete file contents, or `ShortReadback` when `pixels` does not
/// cover the image
pub fn encode_bmp(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>, ScreenshotError> {
    let line = line_size(width);
    let data_size = readback_size(width, height, pixels)?;

    let mut out = Vec::with_capacity(BMP_HEADER_SIZE as usize + data_size);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(data_size as u32 + BMP_HEADER_SIZE).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&BMP_HEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    for _ in 0..6 {
        out.extend_from_slice(&0u32.to_le_bytes());
    }

    // BMP wants BGR; swap the components of the RGB read-back.
    for row in pixels[..data_size].chunks_exact(line) {
        let start = out.len();
        out.extend_from_slice(row);
        for px in out[start..start + width as usize * 3].chunks_exact_mut(3) {
            px.swap(0, 2);
        }
    }

    Ok(out)
}

/// Write a read-back frame to a BMP file
pub fn save_bmp(path: &Path, width: u32, height: u32, pixels: &[u8]) -> Result<(), ScreenshotError> {
    let bmp = encode_bmp(width, height, pixels)?;
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    file.write_all(&bmp)?;
    file.flush()?;
    Ok(())
}

/// Write a read-back frame to a PNG file
///
/// Rows are flipped to top-down order and the padding is dropped.
pub fn save_png(path: &Path, width: u32, height: u32, pixels: &[u8]) -> Result<(), ScreenshotError> {
    let line = line_size(width);
    let data_size = readback_size(width, height, pixels)?;
    let row_bytes = width as usize * 3;

    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in pixels[..data_size].chunks_exact(line).rev() {
        data.extend_from_slice(&row[..row_bytes]);
    }

    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;

    Ok(())
}

/// Build a screenshot path inside `directory`
///
/// With `include_timestamp` the name carries the local time, otherwise the
/// first unused `screenshot_NNNN` name is taken.
pub fn screenshot_path(directory: &Path, format: ScreenshotFormat, include_timestamp: bool) -> PathBuf {
    let ext = format.extension();
    if include_timestamp {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        return directory.join(format!("screenshot_{}.{}", timestamp, ext));
    }

    let mut index = 0u32;
    loop {
        let candidate = directory.join(format!("screenshot_{:04}.{}", index, ext));
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_size_padding() {
        assert_eq!(line_size(4), 12);
        assert_eq!(line_size(3), 12);
        assert_eq!(line_size(1), 4);
        assert_eq!(line_size(2), 8);
    }

    #[test]
    fn test_bmp_header_layout() {
        // 2x1 image: one row of 6 bytes plus 2 padding bytes.
        let pixels = [1, 2, 3, 4, 5, 6, 0, 0];
        let bmp = encode_bmp(2, 1, &pixels).unwrap();

        assert_eq!(bmp.len(), 54 + 8);
        assert_eq!(&bmp[0..2], b"BM");
        assert_eq!(u32::from_le_bytes(bmp[2..6].try_into().unwrap()), 62);
        assert_eq!(u32::from_le_bytes(bmp[6..10].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(bmp[10..14].try_into().unwrap()), 54);
        assert_eq!(u32::from_le_bytes(bmp[14..18].try_into().unwrap()), 40);
        assert_eq!(u32::from_le_bytes(bmp[18..22].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(bmp[22..26].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bmp[26..28].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bmp[28..30].try_into().unwrap()), 24);
        assert!(bmp[30..54].iter().all(|&b| b == 0));

        // Components are swapped to BGR, padding kept.
        assert_eq!(&bmp[54..], &[3, 2, 1, 6, 5, 4, 0, 0]);
    }

    #[test]
    fn test_short_readback_rejected() {
        // 640x480 needs 921600 bytes
        let result = encode_bmp(640, 480, &[]);
        assert!(matches!(
            result,
            Err(ScreenshotError::ShortReadback {
                expected: 921_600,
                actual: 0
            })
        ));

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("short.png");
        let pixels = vec![0u8; line_size(4) * 3];
        let result = save_png(&path, 4, 4, &pixels);
        assert!(matches!(result, Err(ScreenshotError::ShortReadback { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_png_header() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("shot.png");

        // 3x2 image with padded rows.
        let pixels = vec![0x80u8; line_size(3) * 2];
        save_png(&path, 3, 2, &pixels).expect("Failed to save PNG");

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(&bytes[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes(bytes[16..20].try_into().unwrap()), 3);
        assert_eq!(u32::from_be_bytes(bytes[20..24].try_into().unwrap()), 2);
    }

    #[test]
    fn test_screenshot_path_numbering() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let first = screenshot_path(dir.path(), ScreenshotFormat::Bmp, false);
        assert!(first.ends_with("screenshot_0000.bmp"));

        fs::write(&first, b"").unwrap();
        let second = screenshot_path(dir.path(), ScreenshotFormat::Bmp, false);
        assert!(second.ends_with("screenshot_0001.bmp"));

        let stamped = screenshot_path(dir.path(), ScreenshotFormat::Png, true);
        assert_eq!(stamped.extension().unwrap(), "png");
    }
}
