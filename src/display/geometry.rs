// Display geometry - Where the game screen, overlay and cursor land on the output
//
// All aspect ratio comparisons use exact integer cross-multiplication, so a
// 320x200 game on a 1920x1080 output is placed at x=96 with width 1728.

use std::cmp::Ordering;

/// Virtual resolutions that get a forced 4:3 aspect when correction is on
pub const ASPECT_CORRECTED_SIZES: [(u32, u32); 2] = [(320, 200), (640, 400)];

/// Axis-aligned rectangle with its origin in the top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin covering `width` x `height`
    pub const fn from_size(width: u32, height: u32) -> Self {
        Rect::new(0, 0, width, height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `other` lies completely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both; empty rectangles are ignored
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, (right - x) as u32, (bottom - y) as u32)
    }

    /// Overlapping part of both rectangles
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return Rect::new(x, y, 0, 0);
        }
        Rect::new(x, y, (right - x) as u32, (bottom - y) as u32)
    }
}

/// Exact aspect ratio `num:den`
#[derive(Debug, Clone, Copy)]
pub struct Aspect {
    num: u32,
    den: u32,
}

impl Aspect {
    /// The 4:3 ratio of a classic CRT
    pub const FOUR_THIRDS: Aspect = Aspect { num: 4, den: 3 };

    /// Aspect of a `width` x `height` area
    ///
    /// A zero height is treated as one so the ratio stays defined.
    pub fn of(width: u32, height: u32) -> Self {
        Aspect {
            num: width,
            den: height.max(1),
        }
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn den(&self) -> u32 {
        self.den
    }

    /// Height matching `width` at this aspect, rounded down
    pub fn height_for_width(&self, width: u32) -> u32 {
        if self.num == 0 {
            return 0;
        }
        (width as u64 * self.den as u64 / self.num as u64) as u32
    }

    /// Width matching `height` at this aspect, rounded down
    pub fn width_for_height(&self, height: u32) -> u32 {
        (height as u64 * self.num as u64 / self.den as u64) as u32
    }
}

impl PartialEq for Aspect {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Aspect {}

impl PartialOrd for Aspect {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Aspect {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as u64 * other.den as u64;
        let rhs = other.num as u64 * self.den as u64;
        lhs.cmp(&rhs)
    }
}

/// Aspect ratio the game screen should be shown with
///
/// Correction only applies to the legacy resolutions in
/// [`ASPECT_CORRECTED_SIZES`]; everything else keeps square pixels.
pub fn desired_game_aspect(width: u32, height: u32, aspect_ratio_correction: bool) -> Aspect {
    if aspect_ratio_correction && ASPECT_CORRECTED_SIZES.contains(&(width, height)) {
        return Aspect::FOUR_THIRDS;
    }
    Aspect::of(width, height)
}

/// Largest centered rectangle of aspect `desired` inside the output
pub fn compute_display_area(desired: Aspect, output_width: u32, output_height: u32) -> Rect {
    let output = Aspect::of(output_width, output_height);

    let mut width = output_width;
    let mut height = output_height;
    match output.cmp(&desired) {
        // Output is narrower: full width, shorter picture.
        Ordering::Less => height = desired.height_for_width(width),
        // Output is wider: full height, narrower picture.
        Ordering::Greater => width = desired.width_for_height(height),
        Ordering::Equal => {}
    }

    Rect::new(
        ((output_width - width) / 2) as i32,
        ((output_height - height) / 2) as i32,
        width,
        height,
    )
}

/// Scissor rectangle in hardware coordinates (origin bottom-left)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScissorBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Convert a display area into a bottom-left based scissor box
pub fn scissor_box(display: &Rect, output_height: u32) -> ScissorBox {
    ScissorBox {
        x: display.x,
        y: output_height as i32 - display.height as i32 - display.y,
        width: display.width,
        height: display.height,
    }
}

/// Size of the overlay surface for an output
///
/// The overlay follows the output size, shrinks to the maximum texture size
/// (keeping the output aspect) when the output is larger, and never drops
/// below the minimum size. A `max_texture_size` of 0 means "unknown".
pub fn overlay_size(
    output_width: u32,
    output_height: u32,
    max_texture_size: u32,
    min_size: (u32, u32),
) -> (u32, u32) {
    let mut width = output_width;
    let mut height = output_height;

    if max_texture_size > 0 && (width > max_texture_size || height > max_texture_size) {
        let output = Aspect::of(output_width, output_height);
        if output > Aspect::of(1, 1) {
            width = max_texture_size;
            height = output.height_for_width(width);
        } else {
            height = max_texture_size;
            width = output.width_for_height(height);
        }
    }

    (width.max(min_size.0), height.max(min_size.1))
}

/// Cursor hotspot and size on the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorScale {
    pub hotspot_x: i32,
    pub hotspot_y: i32,
    pub width: u32,
    pub height: u32,
}

/// Scale the cursor along with the game screen
///
/// # Arguments
/// * `hotspot` - Hotspot in cursor pixels
/// * `size` - Cursor image size
/// * `display` - Display area of the game screen
/// * `game_size` - Virtual game resolution
/// * `dont_scale` - Keep the cursor at its native size
pub fn scale_cursor(
    hotspot: (i32, i32),
    size: (u32, u32),
    display: &Rect,
    game_size: (u32, u32),
    dont_scale: bool,
) -> CursorScale {
    if dont_scale || game_size.0 == 0 || game_size.1 == 0 {
        return CursorScale {
            hotspot_x: hotspot.0,
            hotspot_y: hotspot.1,
            width: size.0,
            height: size.1,
        };
    }

    let (gw, gh) = (game_size.0 as i64, game_size.1 as i64);
    let (dw, dh) = (display.width as i64, display.height as i64);
    CursorScale {
        hotspot_x: (hotspot.0 as i64 * dw / gw) as i32,
        hotspot_y: (hotspot.1 as i64 * dh / gh) as i32,
        width: (size.0 as i64 * dw / gw) as u32,
        height: (size.1 as i64 * dh / gh) as u32,
    }
}

/// Map a physical output position onto a virtual resolution
pub fn physical_to_virtual(
    (x, y): (i32, i32),
    virtual_size: (u32, u32),
    output_size: (u32, u32),
) -> (i32, i32) {
    if output_size.0 == 0 || output_size.1 == 0 {
        return (x, y);
    }
    (
        (x as i64 * virtual_size.0 as i64 / output_size.0 as i64) as i32,
        (y as i64 * virtual_size.1 as i64 / output_size.1 as i64) as i32,
    )
}

/// Map a virtual position onto the physical output
pub fn virtual_to_physical(
    (x, y): (i32, i32),
    virtual_size: (u32, u32),
    output_size: (u32, u32),
) -> (i32, i32) {
    if virtual_size.0 == 0 || virtual_size.1 == 0 {
        return (x, y);
    }
    (
        (x as i64 * output_size.0 as i64 / virtual_size.0 as i64) as i32,
        (y as i64 * output_size.1 as i64 / virtual_size.1 as i64) as i32,
    )
}
