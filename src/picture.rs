use anyhow::{Context, Result};
use image::GenericImageView;
use std::path::Path;

// Gemini rejects very large inline payloads; downscale before encoding.
const MAX_WIDTH: u32 = 1120;
const MAX_HEIGHT: u32 = 1120;

/// An uploaded image, ready for the wire.
#[derive(Debug, Clone)]
pub struct Picture {
    pub base64: String,
    pub mime_type: &'static str,
}

/// Loads an image file, downscales it when oversized, and re-encodes it as
/// JPEG. Returns the wire form plus the encoded bytes for the preview.
pub fn load_picture(path: &Path) -> Result<(Picture, Vec<u8>)> {
    let mut img = image::open(path).context("Failed to open image")?;

    let (width, height) = img.dimensions();
    if width > MAX_WIDTH || height > MAX_HEIGHT {
        let width_ratio = MAX_WIDTH as f32 / width as f32;
        let height_ratio = MAX_HEIGHT as f32 / height as f32;
        let scale = width_ratio.min(height_ratio);

        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;
        img = img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);
    }

    // JPEG output; drop any alpha channel first
    let img = image::DynamicImage::ImageRgb8(img.into_rgb8());

    let mut buffer = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Jpeg,
    )
    .context("Failed to encode image")?;

    let base64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &buffer);

    Ok((
        Picture {
            base64,
            mime_type: "image/jpeg",
        },
        buffer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_png(name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([120, 40, 200, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_small_image_keeps_dimensions() {
        let path = write_temp_png("reprompt-test-small.png", 64, 48);
        let (picture, bytes) = load_picture(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(picture.mime_type, "image/jpeg");
        assert!(!picture.base64.is_empty());

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_load_oversized_image_downscales() {
        let path = write_temp_png("reprompt-test-wide.png", 3000, 150);
        let (_, bytes) = load_picture(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let decoded = image::load_from_memory(&bytes).unwrap();
        let (width, height) = decoded.dimensions();
        assert!(width <= MAX_WIDTH);
        assert!(height <= MAX_HEIGHT);
        assert_eq!(width, 1120);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("reprompt-test-missing.png");
        assert!(load_picture(&path).is_err());
    }
}
