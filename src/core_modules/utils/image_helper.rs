// Encoding helpers shared by the canvas, the history store and the proxy client.
// PNG is the only format written; data URLs carry it base64-encoded.

use crate::error::{AnalysisError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{ImageEncoder, RgbaImage};
use std::path::Path;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encodes an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

pub fn save(path: &Path, image: &RgbaImage) -> Result<()> {
    std::fs::write(path, encode_png(image)?)?;
    Ok(())
}

/// Encodes `image` as a `data:image/png;base64,...` URL.
pub fn to_data_url(image: &RgbaImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Decodes any base64 `data:<mime>;base64,<payload>` URL into RGBA8.
pub fn from_data_url(url: &str) -> Result<RgbaImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AnalysisError::DataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AnalysisError::DataUrl("missing payload separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(AnalysisError::DataUrl(format!("unsupported encoding in '{header}'")));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AnalysisError::DataUrl(e.to_string()))?;
    crate::core_modules::pixel_buffer::decode_image(&bytes)
}

/// Scales `image` to `width` pixels wide, keeping the aspect ratio (height at least 1).
pub fn thumbnail(image: &RgbaImage, width: u32) -> RgbaImage {
    let width = width.max(1);
    let height = ((image.height() as f64 * (width as f64 / image.width().max(1) as f64)).round() as u32).max(1);
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encodes_non_square_images_with_the_right_dimensions() {
        let image = RgbaImage::from_pixel(30, 10, Rgba([255, 255, 255, 255]));
        let png = encode_png(&image).expect("Error encoding PNG.");
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (30, 10));
    }

    #[test]
    fn save_gradient_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient_file.png");
        let image = RgbaImage::from_fn(50, 20, |x, _| {
            let intensity = (x * 5) as u8;
            Rgba([intensity, intensity, intensity, 255])
        });

        save(&path, &image).expect("Error Saving File.");
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, image);
    }

    #[test]
    fn data_url_carries_the_pixels() {
        let image = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 60, y as u8 * 80, 7, 255]));
        let url = to_data_url(&image).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(from_data_url(&url).unwrap(), image);
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(matches!(from_data_url("https://x/y.png"), Err(AnalysisError::DataUrl(_))));
        assert!(matches!(from_data_url("data:image/png;base64"), Err(AnalysisError::DataUrl(_))));
        assert!(matches!(from_data_url("data:text/plain,hello"), Err(AnalysisError::DataUrl(_))));
        assert!(matches!(from_data_url("data:image/png;base64,@@@"), Err(AnalysisError::DataUrl(_))));
    }

    #[test]
    fn thumbnail_keeps_aspect_ratio() {
        let image = RgbaImage::new(440, 300);
        assert_eq!(thumbnail(&image, 220).dimensions(), (220, 150));
        let sliver = RgbaImage::new(1000, 1);
        assert_eq!(thumbnail(&sliver, 220).dimensions(), (220, 1));
    }
}
