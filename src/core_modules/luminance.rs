// THEORY:
// The grayscale converter collapses an RGBA snapshot into one byte of luma per
// pixel. It is the first derived layer: contrast, entropy, the gradient field
// and the region masses are all computed from it, never from color.

use crate::core_modules::pixel_buffer::PixelBuffer;

/// One luma sample (0-255) per pixel, row-major, same dimensions as its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceField {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LuminanceField {
    /// Converts every pixel with `round(0.299 R + 0.587 G + 0.114 B)`.
    pub fn from_pixels(buffer: &PixelBuffer) -> Self {
        let data = buffer.pixels().map(|pixel| pixel.luma()).collect();
        Self {
            width: buffer.width(),
            height: buffer.height(),
            data,
        }
    }

    #[inline]
    pub fn at(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// 256-bin histogram of luma values.
    pub fn histogram(&self) -> [u32; 256] {
        let mut histogram = [0u32; 256];
        for &value in &self.data {
            histogram[value as usize] += 1;
        }
        histogram
    }
}
