// THEORY:
// The `PixelBuffer` is the immutable RGBA snapshot every analysis pass starts
// from. It plays the role of the "sampler": it takes a decoded bitmap (or a raw
// canvas readback) and turns it into an addressable, row-major grid of `Pixel`s.
//
// Key architectural principles:
// 1.  **Ownership**: The buffer owns its bytes. Once captured it has no link back
//     to the canvas it was read from, so later drawing cannot change an analysis
//     already in flight.
// 2.  **Validated Construction**: A buffer can only be built with nonzero
//     dimensions and exactly `width * height * 4` bytes. Every statistic
//     downstream relies on that and never re-checks it.
// 3.  **Decoding at the Edge**: Turning file bytes into RGBA is delegated to the
//     `image` crate. A decode failure is reported before any buffer exists, so no
//     partial analysis can ever be produced from it.

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use crate::error::{AnalysisError, Result};
use image::RgbaImage;
use image::imageops::FilterType;
use std::path::Path;

/// An owned, row-major RGBA8 snapshot of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes. Fails for empty images or mismatched lengths.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(AnalysisError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Captures a snapshot of an `RgbaImage` (the canvas).
    pub fn from_image(image: &RgbaImage) -> Result<Self> {
        Self::from_rgba(image.width(), image.height(), image.as_raw().clone())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Always false: construction rejects empty images.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let byte_index = ((y as usize * self.width as usize) + x as usize) * CHANNELS;
        let bytes = &self.data[byte_index..byte_index + CHANNELS];
        Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// Iterates every pixel in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|bytes| Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]))
    }
}

/// Decodes encoded image bytes (PNG, JPEG, ...) into RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    ensure_nonempty(&image)?;
    Ok(image)
}

/// Opens and decodes an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)?.to_rgba8();
    ensure_nonempty(&image)?;
    Ok(image)
}

/// Downscales `image` proportionally so it is at most `max_width` wide.
/// Narrower images are returned unchanged.
pub fn fit_to_width(image: RgbaImage, max_width: u32) -> RgbaImage {
    if image.width() <= max_width {
        return image;
    }
    let scale = max_width as f64 / image.width() as f64;
    let width = ((image.width() as f64 * scale).round() as u32).max(1);
    let height = ((image.height() as f64 * scale).round() as u32).max(1);
    image::imageops::resize(&image, width, height, FilterType::Triangle)
}

fn ensure_nonempty(image: &RgbaImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn rejects_empty_and_mismatched_buffers() {
        assert!(matches!(
            PixelBuffer::from_rgba(0, 4, vec![]),
            Err(AnalysisError::EmptyImage { .. })
        ));
        assert!(matches!(
            PixelBuffer::from_rgba(2, 2, vec![0; 15]),
            Err(AnalysisError::BufferSize {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn addresses_pixels_row_major() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([10, 20, 30, 40]));
        let buffer = PixelBuffer::from_image(&image).unwrap();
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.pixel(2, 1), Pixel::new(10, 20, 30, 40));
        assert_eq!(buffer.pixels().last(), Some(Pixel::new(10, 20, 30, 40)));
    }

    #[test]
    fn snapshot_is_detached_from_the_canvas() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let buffer = PixelBuffer::from_image(&canvas).unwrap();
        canvas.put_pixel(0, 0, Rgba([9, 9, 9, 255]));
        assert_eq!(buffer.pixel(0, 0), Pixel::new(1, 2, 3, 255));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(AnalysisError::Decode(_))
        ));
    }

    #[test]
    fn wide_images_are_downscaled_proportionally() {
        let image = RgbaImage::new(2400, 600);
        let fitted = fit_to_width(image, 1200);
        assert_eq!((fitted.width(), fitted.height()), (1200, 300));

        let small = RgbaImage::new(100, 50);
        assert_eq!(fit_to_width(small, 1200).dimensions(), (100, 50));
    }
}
