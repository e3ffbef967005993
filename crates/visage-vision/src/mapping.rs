//! Coordinate mapping between image space and detector network space.
//!
//! The detector runs at a fixed input resolution, so every frame is
//! letterboxed before inference: an aspect-preserving resize followed by
//! zero padding up to the network canvas. Detections come back in
//! network space and must be mapped to original-image pixel coordinates
//! before anything downstream touches them.
//!
//! Inverse formula: `x_img = (x_net - pad_left) / scale`, applied
//! identically to box corners and landmark points, then clamped to the
//! frame bounds.

use visage_models::BoundingBox;

/// Letterbox transform between an image and a fixed network canvas.
///
/// Stores everything needed to map coordinates in both directions. The
/// detector anchors the scaled image at the canvas origin (zero
/// offsets, padding on the right/bottom); centered padding is supported
/// for models that expect it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxMap {
    /// Original image width in pixels
    pub image_width: u32,
    /// Original image height in pixels
    pub image_height: u32,
    /// Network canvas width in pixels
    pub net_width: u32,
    /// Network canvas height in pixels
    pub net_height: u32,
    /// Scale factor applied to the image (min of x/y scales)
    pub scale: f32,
    /// Left padding in network space (pixels)
    pub pad_left: f32,
    /// Top padding in network space (pixels)
    pub pad_top: f32,
    /// Scaled image width before padding
    pub scaled_width: u32,
    /// Scaled image height before padding
    pub scaled_height: u32,
}

impl LetterboxMap {
    /// Letterbox with the scaled image anchored at the canvas origin.
    pub fn anchored(image_width: u32, image_height: u32, net_width: u32, net_height: u32) -> Self {
        Self::compute(image_width, image_height, net_width, net_height, false)
    }

    /// Letterbox with centered padding.
    pub fn centered(image_width: u32, image_height: u32, net_width: u32, net_height: u32) -> Self {
        Self::compute(image_width, image_height, net_width, net_height, true)
    }

    fn compute(
        image_width: u32,
        image_height: u32,
        net_width: u32,
        net_height: u32,
        center: bool,
    ) -> Self {
        let scale_x = net_width as f32 / image_width as f32;
        let scale_y = net_height as f32 / image_height as f32;
        let scale = scale_x.min(scale_y);

        let scaled_width = (image_width as f32 * scale).round() as u32;
        let scaled_height = (image_height as f32 * scale).round() as u32;

        let (pad_left, pad_top) = if center {
            (
                (net_width.saturating_sub(scaled_width) / 2) as f32,
                (net_height.saturating_sub(scaled_height) / 2) as f32,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            image_width,
            image_height,
            net_width,
            net_height,
            scale,
            pad_left,
            pad_top,
            scaled_width,
            scaled_height,
        }
    }

    /// Map a point from image space to network space.
    #[inline]
    pub fn to_network(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pad_left, y * self.scale + self.pad_top)
    }

    /// Map a point from network space back to image space, clamped to
    /// the frame bounds.
    #[inline]
    pub fn to_image(&self, x: f32, y: f32) -> (f32, f32) {
        let ix = (x - self.pad_left) / self.scale;
        let iy = (y - self.pad_top) / self.scale;
        (
            ix.clamp(0.0, self.image_width as f32),
            iy.clamp(0.0, self.image_height as f32),
        )
    }

    /// Map a bounding box from network space back to image space.
    ///
    /// Both corners go through the same point transform, so the result
    /// is clamped to the frame and may be degenerate when the raw box
    /// lay entirely inside the padding.
    pub fn box_to_image(&self, bbox: &BoundingBox) -> BoundingBox {
        let (x1, y1) = self.to_image(bbox.x1, bbox.y1);
        let (x2, y2) = self.to_image(bbox.x2, bbox.y2);
        BoundingBox::new(x1, y1, x2, y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_square_input() {
        // 320x240 -> 640x640: scale limited by width (2.0), no offsets
        let map = LetterboxMap::anchored(320, 240, 640, 640);
        assert!((map.scale - 2.0).abs() < 1e-6);
        assert_eq!(map.pad_left, 0.0);
        assert_eq!(map.pad_top, 0.0);
        assert_eq!(map.scaled_width, 640);
        assert_eq!(map.scaled_height, 480);
    }

    #[test]
    fn test_anchored_tall_input() {
        // 480x960 -> 640x640: scale limited by height
        let map = LetterboxMap::anchored(480, 960, 640, 640);
        assert!((map.scale - 640.0 / 960.0).abs() < 1e-6);
        assert_eq!(map.scaled_width, 320);
        assert_eq!(map.scaled_height, 640);
        assert_eq!(map.pad_left, 0.0);
    }

    #[test]
    fn test_centered_padding_offsets() {
        // 640x480 -> 640x640: scale = min(1.0, 640/480) = 1.0,
        // scaled 640x480, vertical padding (640-480)/2 = 80 on top
        let map = LetterboxMap::centered(640, 480, 640, 640);
        assert!((map.scale - 1.0).abs() < 1e-6);
        assert_eq!(map.pad_left, 0.0);
        assert_eq!(map.pad_top, 80.0);
    }

    #[test]
    fn test_round_trip() {
        let map = LetterboxMap::anchored(1920, 1080, 640, 640);
        let (nx, ny) = map.to_network(960.0, 540.0);
        let (bx, by) = map.to_image(nx, ny);
        assert!((bx - 960.0).abs() < 0.5);
        assert!((by - 540.0).abs() < 0.5);
    }

    #[test]
    fn test_round_trip_with_centered_padding() {
        let map = LetterboxMap::centered(400, 800, 640, 640);
        let (nx, ny) = map.to_network(123.0, 456.0);
        let (bx, by) = map.to_image(nx, ny);
        assert!((bx - 123.0).abs() < 0.5);
        assert!((by - 456.0).abs() < 0.5);
    }

    #[test]
    fn test_known_inverse_with_synthetic_padding() {
        let map = LetterboxMap::centered(320, 640, 640, 640);
        // scale = 1.0, scaled 320x640, pad_left = 160
        assert_eq!(map.pad_left, 160.0);
        let (x, y) = map.to_image(260.0, 300.0);
        assert!((x - 100.0).abs() < 1e-4);
        assert!((y - 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_inverse_clamps_to_frame() {
        let map = LetterboxMap::anchored(320, 240, 640, 640);
        // Network-space points inside bottom padding clamp to the frame edge
        let (_, y) = map.to_image(10.0, 600.0);
        assert_eq!(y, 240.0);

        let (x, _) = map.to_image(-20.0, 10.0);
        assert_eq!(x, 0.0);
    }

    #[test]
    fn test_box_in_padding_becomes_degenerate() {
        let map = LetterboxMap::anchored(320, 240, 640, 640);
        // 320x240 scales to 640x480; anything below y=480 is padding
        let bbox = BoundingBox::new(100.0, 500.0, 200.0, 600.0);
        let mapped = map.box_to_image(&bbox);
        assert!(mapped.is_degenerate());
    }

    #[test]
    fn test_box_mapping_matches_point_mapping() {
        let map = LetterboxMap::anchored(1280, 720, 640, 640);
        let bbox = BoundingBox::new(64.0, 32.0, 320.0, 160.0);
        let mapped = map.box_to_image(&bbox);
        let (x1, y1) = map.to_image(64.0, 32.0);
        let (x2, y2) = map.to_image(320.0, 160.0);
        assert_eq!(mapped, BoundingBox::new(x1, y1, x2, y2));
    }
}
