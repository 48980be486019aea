// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the analyzer. It is a "dumb"
// data container for a single RGBA sample plus the handful of single-pixel
// heuristics the statistics layer needs: Rec. 601 luma, the HSV decomposition and
// the two opponent-color axes used by the Hasler–Süsstrunk colorfulness metric.
// Nothing here reads a neighbor. Anything that needs more than one pixel
// (gradients, histograms, means) lives in the higher layers.
//
// Key principles:
// 1) Single-pixel scope: heuristics never read neighbors.
// 2) Gamma-encoded math: all formulas operate on the raw sRGB bytes (or their
//    0..1 normalization). Feature thresholds downstream were tuned on that scale.
// 3) Total functions: every heuristic is defined for every byte combination,
//    including pure black and pure gray.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;
    pub type Luma = u8;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Value = f64;

    pub const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Luminance estimate (Rec. 601 luma) on the 0..255 scale, unrounded.
        pub fn luminance(&self) -> Luminance {
            0.299_f64 * self.red as f64 + 0.587_f64 * self.green as f64 + 0.114_f64 * self.blue as f64
        }

        /// Luminance rounded to the nearest integer and clamped to a byte.
        pub fn luma(&self) -> Luma {
            self.luminance().round().clamp(0.0, 255.0) as Luma
        }

        /// HSV decomposition: hue in degrees [0, 360), saturation and value in [0, 1].
        ///
        /// - Hue is 0.0 for achromatic pixels (chroma of zero).
        /// - Saturation is chroma / value, 0.0 for pure black.
        pub fn hsv(&self) -> (Hue, Saturation, Value) {
            let red = self.red as f64 / 255.0;
            let green = self.green as f64 / 255.0;
            let blue = self.blue as f64 / 255.0;
            let maximum_channel = red.max(green.max(blue));
            let minimum_channel = red.min(green.min(blue));
            let chroma = maximum_channel - minimum_channel;

            let mut hue_degrees = if chroma == 0.0 {
                0.0
            } else if maximum_channel == red {
                60.0 * ((green - blue) / chroma).rem_euclid(6.0)
            } else if maximum_channel == green {
                60.0 * ((blue - red) / chroma + 2.0)
            } else {
                60.0 * ((red - green) / chroma + 4.0)
            };
            if hue_degrees >= 360.0 {
                hue_degrees -= 360.0;
            }

            let saturation = if maximum_channel == 0.0 {
                0.0
            } else {
                chroma / maximum_channel
            };
            (hue_degrees, saturation, maximum_channel)
        }

        /// Red-green opponent axis: |R - G|.
        pub fn red_green(&self) -> f64 {
            (self.red as f64 - self.green as f64).abs()
        }

        /// Yellow-blue opponent axis: |0.5 (R + G) - B|.
        pub fn yellow_blue(&self) -> f64 {
            (0.5 * (self.red as f64 + self.green as f64) - self.blue as f64).abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    fn rgb(red: u8, green: u8, blue: u8) -> Pixel {
        Pixel::new(red, green, blue, 255)
    }

    #[test]
    fn luma_rounds_rec601() {
        assert_eq!(rgb(255, 255, 255).luma(), 255);
        assert_eq!(rgb(0, 0, 0).luma(), 0);
        // 0.299 * 255 = 76.245
        assert_eq!(rgb(255, 0, 0).luma(), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(rgb(0, 255, 0).luma(), 150);
    }

    #[test]
    fn hue_follows_the_color_wheel() {
        let (red_hue, red_sat, _) = rgb(255, 0, 0).hsv();
        assert_eq!(red_hue, 0.0);
        assert_eq!(red_sat, 1.0);
        assert!((rgb(255, 255, 0).hsv().0 - 60.0).abs() < 1e-9);
        assert!((rgb(0, 255, 255).hsv().0 - 180.0).abs() < 1e-9);
        assert!((rgb(0, 0, 255).hsv().0 - 240.0).abs() < 1e-9);
        assert!((rgb(255, 0, 255).hsv().0 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn negative_red_sector_wraps_into_range() {
        let (hue, _, _) = rgb(255, 0, 100).hsv();
        assert!(hue > 330.0 && hue < 360.0, "hue was {hue}");
    }

    #[test]
    fn grays_and_black_are_achromatic() {
        assert_eq!(rgb(128, 128, 128).hsv(), (0.0, 0.0, 128.0 / 255.0));
        assert_eq!(rgb(0, 0, 0).hsv(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn opponent_axes() {
        let pixel = rgb(200, 100, 50);
        assert_eq!(pixel.red_green(), 100.0);
        assert_eq!(pixel.yellow_blue(), 100.0);
    }
}
