// THEORY:
// The gradient operator turns the luma field into a normalized edge-magnitude
// field. A 3x3 Sobel pair is convolved at every interior pixel; border pixels
// have no full neighborhood and keep a magnitude of zero. Dividing by the global
// maximum maps the strongest edge of *this* image to 1.0, which makes the fixed
// edge threshold used downstream independent of the image's contrast range.

use crate::core_modules::luminance::LuminanceField;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Normalized edge magnitude (0.0-1.0) per pixel, same dimensions as its source.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl GradientField {
    /// Computes Sobel magnitudes over the interior and normalizes by the maximum.
    /// An image with no edges (or too small to have an interior) is all zeros.
    pub fn sobel(luminance: &LuminanceField) -> Self {
        let w = luminance.width as usize;
        let h = luminance.height as usize;
        let mut magnitudes = vec![0.0f32; w * h];

        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let mut sum_x = 0.0f32;
                let mut sum_y = 0.0f32;
                for (ky, (kx_row, ky_row)) in SOBEL_KERNEL_X.iter().zip(SOBEL_KERNEL_Y.iter()).enumerate() {
                    let row = (y + ky - 1) * w;
                    for kx in 0..3 {
                        let value = luminance.data[row + x + kx - 1] as f32;
                        sum_x += kx_row[kx] * value;
                        sum_y += ky_row[kx] * value;
                    }
                }
                magnitudes[y * w + x] = sum_x.hypot(sum_y);
            }
        }

        let maximum = magnitudes.iter().copied().fold(0.0f32, f32::max);
        if maximum > 0.0 {
            for magnitude in &mut magnitudes {
                *magnitude /= maximum;
            }
        }

        Self {
            width: luminance.width,
            height: luminance.height,
            data: magnitudes,
        }
    }

    #[inline]
    pub fn at(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(width: u32, height: u32, data: Vec<u8>) -> LuminanceField {
        LuminanceField {
            width,
            height,
            data,
        }
    }

    #[test]
    fn flat_field_has_no_edges() {
        let gradient = GradientField::sobel(&field(5, 5, vec![128; 25]));
        assert!(gradient.data.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn tiny_images_have_no_interior() {
        assert_eq!(GradientField::sobel(&field(1, 1, vec![200])).data, vec![0.0]);
        assert_eq!(GradientField::sobel(&field(2, 3, vec![0, 255, 0, 255, 0, 255])).data, vec![0.0; 6]);
    }

    #[test]
    fn vertical_step_peaks_at_one_and_skips_the_border() {
        // Columns 0-1 black, columns 2-3 white.
        let data: Vec<u8> = (0..16).map(|i| if i % 4 < 2 { 0 } else { 255 }).collect();
        let gradient = GradientField::sobel(&field(4, 4, data));

        assert_eq!(gradient.at(1, 1), 1.0);
        assert_eq!(gradient.at(2, 2), 1.0);
        for i in 0..4 {
            assert_eq!(gradient.at(0, i), 0.0);
            assert_eq!(gradient.at(3, i), 0.0);
            assert_eq!(gradient.at(i, 0), 0.0);
            assert_eq!(gradient.at(i, 3), 0.0);
        }
        assert!(gradient.data.iter().all(|&g| (0.0..=1.0).contains(&g)));
    }
}
