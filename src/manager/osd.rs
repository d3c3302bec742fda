// On-screen display
//
// Text messages are rendered into a small surface drawn centered over the
// frame and faded out after a delay. Message submission may come from any
// thread through `OsdMessageQueue`; the manager only takes the lock to
// consume a pending request.

use crate::display::{FrameBuffer, Rect};
use crate::format::PixelFormat;
use parking_lot::Mutex;
use std::sync::Arc;

/// Distance of the first line from the top of the message box
const V_OFFSET: u32 = 6;
/// Blank pixels above and below each line
const LINE_SPACING: u32 = 1;
/// Extra width around the widest line
const H_PADDING: u32 = 14;

/// Font used to render OSD messages
pub trait OsdFont {
    /// Line height in pixels
    fn height(&self) -> u32;

    fn string_width(&self, text: &str) -> u32;

    /// Draw `text` centered within `width` pixels starting at `x`
    fn draw_string(&self, dst: &mut FrameBuffer, text: &str, x: i32, y: i32, width: u32, color: u32);
}

/// Blocky fallback font for shells without a font service
///
/// Every visible character is a solid 5x7 cell; whitespace leaves a gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFont;

impl BlockFont {
    const GLYPH_WIDTH: u32 = 5;
    const GLYPH_HEIGHT: u32 = 7;
    const ADVANCE: u32 = 6;
}

impl OsdFont for BlockFont {
    fn height(&self) -> u32 {
        Self::GLYPH_HEIGHT + 1
    }

    fn string_width(&self, text: &str) -> u32 {
        let count = text.chars().count() as u32;
        if count == 0 {
            return 0;
        }
        count * Self::ADVANCE - 1
    }

    fn draw_string(&self, dst: &mut FrameBuffer, text: &str, x: i32, y: i32, width: u32, color: u32) {
        let text_width = self.string_width(text);
        let mut pen = x + (width as i32 - text_width as i32) / 2;

        for c in text.chars() {
            if !c.is_whitespace() {
                dst.fill_rect(Rect::new(pen, y, Self::GLYPH_WIDTH, Self::GLYPH_HEIGHT), color);
            }
            pen += Self::ADVANCE as i32;
        }
    }
}

/// Pending OSD message shared with foreign threads
#[derive(Debug, Clone, Default)]
pub struct OsdMessageQueue {
    pending: Arc<Mutex<Option<String>>>,
}

impl OsdMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `message` to be shown; replaces a request not yet consumed
    pub fn submit(&self, message: impl Into<String>) {
        *self.pending.lock() = Some(message.into());
    }

    /// Consume the pending request, if any
    pub fn take(&self) -> Option<String> {
        self.pending.lock().take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

/// Render a message box
///
/// Lines are split on `\n` with empty lines dropped. The box is clipped to
/// `max_width` x `max_height` (the display area).
///
/// # Returns
/// `None` when the message has no visible lines
pub fn render_message(
    font: &dyn OsdFont,
    text: &str,
    max_width: u32,
    max_height: u32,
    format: PixelFormat,
) -> Option<FrameBuffer> {
    let lines: Vec<&str> = text.split('\n').filter(|line| !line.is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let line_height = font.height() + 2 * LINE_SPACING;
    let width = lines
        .iter()
        .map(|line| font.string_width(line) + H_PADDING)
        .max()
        .unwrap_or(0)
        .min(max_width);
    let height = (line_height * lines.len() as u32 + 2 * V_OFFSET).min(max_height);
    if width == 0 || height == 0 {
        return None;
    }

    let mut surface = FrameBuffer::new(width, height, format);
    surface.fill(format.rgb_to_color(40, 40, 40));

    let white = format.rgb_to_color(255, 255, 255);
    for (i, line) in lines.iter().enumerate() {
        let y = i as u32 * line_height + V_OFFSET + LINE_SPACING;
        font.draw_string(&mut surface, line, 0, y as i32, width, white);
    }

    Some(surface)
}

/// Opacity (percent) of a message at time `now`
///
/// Stays at `initial` until `fade_start`, then drops linearly to 0 over
/// `duration` milliseconds.
pub fn message_alpha(now: u64, fade_start: u64, initial: u32, duration: u64) -> i32 {
    let diff = now as i64 - fade_start as i64;
    if diff <= 0 {
        return initial as i32;
    }
    if duration == 0 || diff >= duration as i64 {
        return 0;
    }
    initial as i32 - (diff * initial as i64 / duration as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_box_layout() {
        let font = BlockFont;
        let format = PixelFormat::native_rgba();
        let surface = render_message(&font, "Hello\n\nWorld!", 640, 480, format).unwrap();

        // Two lines after dropping the empty one.
        let line_height = font.height() + 2;
        assert_eq!(surface.height(), line_height * 2 + 12);
        assert_eq!(surface.width(), font.string_width("World!") + 14);

        // Corner keeps the background, the first glyph row is white.
        assert_eq!(surface.get_pixel(0, 0), format.rgb_to_color(40, 40, 40));
        let text_x = (surface.width() - font.string_width("Hello")) / 2;
        assert_eq!(surface.get_pixel(text_x, 7), format.rgb_to_color(255, 255, 255));
    }

    #[test]
    fn test_message_box_clipped_to_display() {
        let long = "x".repeat(200);
        let surface = render_message(&BlockFont, &long, 320, 10, PixelFormat::native_rgba()).unwrap();
        assert_eq!(surface.width(), 320);
        assert_eq!(surface.height(), 10);
    }

    #[test]
    fn test_empty_message_renders_nothing() {
        assert!(render_message(&BlockFont, "\n\n", 320, 200, PixelFormat::native_rgba()).is_none());
    }

    #[test]
    fn test_alpha_fade() {
        assert_eq!(message_alpha(1000, 2000, 80, 500), 80);
        assert_eq!(message_alpha(2000, 2000, 80, 500), 80);
        assert_eq!(message_alpha(2250, 2000, 80, 500), 40);
        assert_eq!(message_alpha(2499, 2000, 80, 500), 1);
        assert_eq!(message_alpha(2500, 2000, 80, 500), 0);
    }

    #[test]
    fn test_queue_shared_between_threads() {
        let queue = OsdMessageQueue::new();
        let remote = queue.clone();
        std::thread::spawn(move || remote.submit("Saved"))
            .join()
            .unwrap();

        assert!(queue.has_pending());
        assert_eq!(queue.take().as_deref(), Some("Saved"));
        assert_eq!(queue.take(), None);
    }
}
