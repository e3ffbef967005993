//! Image codec helpers for the caller boundary.
//!
//! The hosting layer hands uploaded bytes in and renders the annotated
//! result back out as an embeddable data URI, so the codec covers both
//! directions: decode bytes into a working [`Frame`], and encode a
//! display-order image into `data:image/...;base64,...`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};

use visage_models::Frame;

use crate::error::{VisionError, VisionResult};

/// Upload extensions the boundary accepts.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// JPEG quality for encoded results.
const JPEG_QUALITY: u8 = 90;

/// Output encoding for [`encode_data_uri`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    /// MIME type for the encoding.
    pub fn mime(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "image/png",
            ImageEncoding::Jpeg => "image/jpeg",
        }
    }
}

/// Encode a display-order image as a self-describing data URI.
pub fn encode_data_uri(image: &RgbImage, encoding: ImageEncoding) -> VisionResult<String> {
    if image.width() == 0 || image.height() == 0 {
        return Err(VisionError::encode("image has zero dimensions"));
    }

    let mut payload = Vec::new();
    match encoding {
        ImageEncoding::Png => PngEncoder::new(&mut payload)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ColorType::Rgb8,
            )
            .map_err(|e| VisionError::encode(e.to_string()))?,
        ImageEncoding::Jpeg => JpegEncoder::new_with_quality(&mut payload, JPEG_QUALITY)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ColorType::Rgb8,
            )
            .map_err(|e| VisionError::encode(e.to_string()))?,
    }

    Ok(format!(
        "data:{};base64,{}",
        encoding.mime(),
        BASE64.encode(&payload)
    ))
}

/// Decode uploaded image bytes into a working frame.
pub fn decode_frame(bytes: &[u8]) -> VisionResult<Frame> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    Ok(Frame::from_display(&image))
}

/// Whether a filename carries an accepted image extension.
pub fn is_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(16, 12, Rgb([40, 80, 120]));
        img.put_pixel(3, 4, Rgb([250, 10, 10]));
        img
    }

    fn decode_payload(uri: &str, prefix: &str) -> RgbImage {
        let payload = uri.strip_prefix(prefix).expect("data URI prefix");
        let bytes = BASE64.decode(payload).expect("valid base64");
        image::load_from_memory(&bytes).expect("decodable payload").to_rgb8()
    }

    #[test]
    fn test_png_data_uri_round_trip() {
        let img = sample_image();
        let uri = encode_data_uri(&img, ImageEncoding::Png).unwrap();

        let decoded = decode_payload(&uri, "data:image/png;base64,");
        assert_eq!(decoded.dimensions(), img.dimensions());
        // PNG is lossless
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_jpeg_data_uri_dimensions() {
        let img = sample_image();
        let uri = encode_data_uri(&img, ImageEncoding::Jpeg).unwrap();

        let decoded = decode_payload(&uri, "data:image/jpeg;base64,");
        assert_eq!(decoded.dimensions(), img.dimensions());
    }

    #[test]
    fn test_encode_rejects_empty_image() {
        let img = RgbImage::new(0, 0);
        assert!(matches!(
            encode_data_uri(&img, ImageEncoding::Png),
            Err(VisionError::Encode(_))
        ));
    }

    #[test]
    fn test_decode_frame_round_trip() {
        let img = sample_image();
        let uri = encode_data_uri(&img, ImageEncoding::Png).unwrap();
        let bytes = BASE64
            .decode(uri.strip_prefix("data:image/png;base64,").unwrap())
            .unwrap();

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.to_display(), img);
    }

    #[test]
    fn test_decode_frame_rejects_garbage() {
        assert!(decode_frame(b"not an image").is_err());
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(is_allowed_extension("selfie.jpg"));
        assert!(is_allowed_extension("photo.JPEG"));
        assert!(is_allowed_extension("upload.png"));
        assert!(!is_allowed_extension("archive.zip"));
        assert!(!is_allowed_extension("no_extension"));
        assert!(!is_allowed_extension("tricky.png.exe"));
    }
}
