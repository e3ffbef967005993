//! Overlay drawing for annotated results.
//!
//! Draws on working-order (BGR) frames, so all colors here are BGR
//! triples; they come out right after the pipeline's final channel
//! conversion. Label text is rendered from a small built-in 5x7 glyph
//! raster covering the label alphabet, which keeps the crate free of
//! bundled font artifacts.

use image::Rgb;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use visage_models::{Detection, Frame};

/// Bounding-box color (BGR green).
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Label text color (BGR).
pub const LABEL_COLOR: Rgb<u8> = Rgb([36, 255, 12]);

/// Landmark dot color (BGR red).
pub const LANDMARK_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Vertical gap between a box's top edge and its label.
const LABEL_OFFSET: i32 = 10;

/// Glyph raster dimensions and rendering scale.
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 2;
/// Horizontal advance per character (one glyph plus tracking).
const GLYPH_ADVANCE: u32 = (GLYPH_WIDTH + 1) * GLYPH_SCALE;

/// Draw a detection's bounding box (2 px) onto a frame.
pub fn draw_detection(frame: &mut Frame, detection: &Detection) {
    let bbox = detection.bbox;
    let x = bbox.x1.round() as i32;
    let y = bbox.y1.round() as i32;
    let w = (bbox.width().round() as u32).max(1);
    let h = (bbox.height().round() as u32).max(1);

    let buf = frame.buffer_mut();
    draw_hollow_rect_mut(buf, Rect::at(x, y).of_size(w, h), BOX_COLOR);
    if w > 2 && h > 2 {
        draw_hollow_rect_mut(buf, Rect::at(x + 1, y + 1).of_size(w - 2, h - 2), BOX_COLOR);
    }
}

/// Draw the five facial landmark dots onto a frame.
pub fn draw_landmarks(frame: &mut Frame, detection: &Detection) {
    let buf = frame.buffer_mut();
    for point in detection.landmarks.points() {
        draw_filled_circle_mut(
            buf,
            (point.x.round() as i32, point.y.round() as i32),
            2,
            LANDMARK_COLOR,
        );
    }
}

/// Draw a label anchored above a box's top-left corner.
///
/// The text block is clamped so it never renders off-frame: pushed
/// right of the left edge, left of the right edge, and below the top
/// edge when the box sits too close to it.
pub fn draw_label(frame: &mut Frame, text: &str, anchor_x: f32, anchor_y: f32) {
    let (text_w, text_h) = text_extent(text);
    let width = frame.width();
    let height = frame.height();

    let max_x = width.saturating_sub(text_w) as i32;
    let max_y = height.saturating_sub(text_h) as i32;

    let x = (anchor_x.round() as i32).clamp(0, max_x);
    let y = (anchor_y.round() as i32 - LABEL_OFFSET - text_h as i32).clamp(0, max_y);

    let mut cursor = x;
    for ch in text.chars() {
        draw_glyph(frame, ch, cursor, y);
        cursor += GLYPH_ADVANCE as i32;
    }
}

/// Pixel extent of a rendered label.
pub fn text_extent(text: &str) -> (u32, u32) {
    let count = text.chars().count() as u32;
    (count * GLYPH_ADVANCE, GLYPH_HEIGHT * GLYPH_SCALE)
}

fn draw_glyph(frame: &mut Frame, ch: char, x: i32, y: i32) {
    let rows = glyph(ch);
    let buf = frame.buffer_mut();
    let (width, height) = (buf.width() as i32, buf.height() as i32);

    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE as i32 {
                for dx in 0..GLYPH_SCALE as i32 {
                    let px = x + col as i32 * GLYPH_SCALE as i32 + dx;
                    let py = y + row as i32 * GLYPH_SCALE as i32 + dy;
                    if px >= 0 && py >= 0 && px < width && py < height {
                        buf.put_pixel(px as u32, py as u32, LABEL_COLOR);
                    }
                }
            }
        }
    }
}

/// 5x7 raster for the label alphabet; unknown characters render blank.
fn glyph(ch: char) -> [u8; 7] {
    match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        'd' => [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        'g' => [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x0E],
        'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x15, 0x15],
        'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        ':' => [0x00, 0x04, 0x00, 0x00, 0x04, 0x00, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        _ => [0x00; 7],
    }
}
