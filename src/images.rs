//! Normalization of uploaded images.

use failure::Fail;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};

/// Largest dimension kept when normalizing an upload.
const MAX_DIMENSION: u32 = 1200;

const JPEG_QUALITY: u8 = 80;

/// Processing applied to images before they reach the file store.
pub trait ImageResizer {
    /// Decode `bytes`, scale them down to fit the platform's bounds, and
    /// re-encode as JPEG. Images already within bounds are re-encoded
    /// without scaling.
    fn normalize(&self, bytes: &[u8]) -> Result<Vec<u8>, ProcessImageError>;
}

/// Production resizer backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Resizer;

impl ImageResizer for Resizer {
    fn normalize(&self, bytes: &[u8]) -> Result<Vec<u8>, ProcessImageError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ProcessImageError(e.to_string()))?;

        let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
            img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
        } else {
            img
        };

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
            .encode_image(&img)
            .map_err(|e| ProcessImageError(e.to_string()))?;

        Ok(out)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "No se pudo procesar la imagen: {}", _0)]
pub struct ProcessImageError(String);

impl crate::api::ApiError for ProcessImageError {
    fn status(&self) -> crate::api::Status {
        crate::api::Status::BadRequest
    }

    fn code(&self) -> Option<&str> {
        Some("image:invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out),
                image::ImageOutputFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn large_images_are_scaled_to_fit() {
        let bytes = checkerboard(2400, 1200);
        let out = Resizer.normalize(&bytes).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.width(), 1200);
        assert_eq!(img.height(), 600);
    }

    #[test]
    fn small_images_keep_their_size() {
        let bytes = checkerboard(300, 200);
        let out = Resizer.normalize(&bytes).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (300, 200));
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert!(Resizer.normalize(b"not an image").is_err());
    }
}
