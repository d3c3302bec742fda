// Color palette - 256 RGB entries for palette indexed rasters
//
// Stored as 768 bytes (R, G, B per entry), the layout game engines hand to
// `set_palette` and expect back from `grab_palette`.

/// Number of palette entries
pub const PALETTE_SIZE: usize = 256;

/// 256-entry RGB palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [u8; PALETTE_SIZE * 3],
}

impl Palette {
    /// Create an all-black palette
    pub fn new() -> Self {
        Self {
            colors: [0; PALETTE_SIZE * 3],
        }
    }

    /// Create a palette with a gray ramp in the low entries and a hue
    /// wheel in the high entries
    pub fn ramp() -> Self {
        let mut palette = Self::new();
        for i in 0..PALETTE_SIZE {
            let (r, g, b) = if i < 128 {
                let v = (i * 2) as u8;
                (v, v, v)
            } else {
                let h = (i - 128) * 6;
                let sector = h / 128;
                let f = ((h % 128) * 2) as u8;
                match sector {
                    0 => (255, f, 0),
                    1 => (255 - f, 255, 0),
                    2 => (0, 255, f),
                    3 => (0, 255 - f, 255),
                    4 => (f, 0, 255),
                    _ => (255, 0, 255 - f),
                }
            };
            palette.colors[i * 3..i * 3 + 3].copy_from_slice(&[r, g, b]);
        }
        palette
    }

    /// Overwrite entries starting at `start`
    ///
    /// # Arguments
    /// * `start` - First entry to change
    /// * `colors` - RGB triplets, three bytes per entry
    ///
    /// # Panics
    /// Panics if the range runs past the last entry
    pub fn set(&mut self, start: usize, colors: &[u8]) {
        let num = colors.len() / 3;
        assert!(start + num <= PALETTE_SIZE, "Palette range {}..{} out of bounds", start, start + num);

        self.colors[start * 3..(start + num) * 3].copy_from_slice(&colors[..num * 3]);
    }

    /// Copy `num` entries starting at `start` into `colors`
    ///
    /// # Panics
    /// Panics if the range runs past the last entry
    pub fn grab(&self, colors: &mut [u8], start: usize, num: usize) {
        assert!(start + num <= PALETTE_SIZE, "Palette range {}..{} out of bounds", start, start + num);

        colors[..num * 3].copy_from_slice(&self.colors[start * 3..(start + num) * 3]);
    }

    /// RGB of one entry
    #[inline]
    pub fn rgb(&self, index: u8) -> (u8, u8, u8) {
        let i = index as usize * 3;
        (self.colors[i], self.colors[i + 1], self.colors[i + 2])
    }

    /// Get the raw 768-byte table
    pub fn as_bytes(&self) -> &[u8] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
