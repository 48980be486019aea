mod common;

use collage_advisor::core_modules::gradient::GradientField;
use collage_advisor::core_modules::luminance::LuminanceField;
use collage_advisor::core_modules::pixel_buffer::PixelBuffer;
use collage_advisor::core_modules::region::{RegionLabel, RegionPartitioner};
use collage_advisor::core_modules::statistics;
use collage_advisor::{AnalysisPipeline, FeatureSet};
use common::synthetic_image::{checkerboard, noise, solid, split_halves};
use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn features_of(image: &RgbaImage, seed: u64) -> FeatureSet {
    let mut pipeline = AnalysisPipeline::new(StdRng::seed_from_u64(seed));
    pipeline.analyze_image(image).expect("analysis").features
}

fn assert_in_ranges(features: &FeatureSet) {
    assert!((0.0..=1.0).contains(&features.edge_density), "{features:?}");
    assert!((0.0..=0.5).contains(&features.contrast), "{features:?}");
    assert!((0.0..=8.0).contains(&features.entropy), "{features:?}");
    assert!((0.0..360.0).contains(&features.hue), "{features:?}");
    assert!((0.0..=1.0).contains(&features.mean_saturation), "{features:?}");
    assert!(features.colorfulness >= 0.0, "{features:?}");
}

#[test]
fn solid_gray_degrades_to_zero() {
    let _ = env_logger::builder().is_test(true).try_init();
    for value in [0u8, 77, 128, 255] {
        let features = features_of(&solid(40, 30, [value; 3]), 1);
        assert_eq!(features.entropy, 0.0);
        assert_eq!(features.contrast, 0.0);
        assert_eq!(features.colorfulness, 0.0);
        assert_eq!(features.edge_density, 0.0);
        assert_eq!(features.dominant_color, [value; 3]);
    }
}

#[test]
fn solid_color_has_no_spread() {
    let features = features_of(&solid(24, 24, [200, 30, 90]), 2);
    assert_eq!(features.entropy, 0.0);
    assert_eq!(features.contrast, 0.0);
    // Only the mean term of the colorfulness metric survives: rg = 170, yb = 25.
    let expected = 0.3 * (170.0f64.powi(2) + 25.0f64.powi(2)).sqrt();
    assert!((features.colorfulness - expected).abs() < 1e-9, "{}", features.colorfulness);
    assert_eq!(features.dominant_color, [200, 30, 90]);
}

#[test]
fn fine_checkerboard_is_all_edges() {
    let features = features_of(&checkerboard(64, 64, 2), 3);
    assert!(features.edge_density > 0.9, "{}", features.edge_density);
    assert!((features.contrast - 0.5).abs() < 1e-9, "{}", features.contrast);
    assert!((features.entropy - 1.0).abs() < 1e-9, "{}", features.entropy);
    assert_in_ranges(&features);
}

#[test]
fn random_images_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(17);
    for (width, height) in [(1, 1), (2, 2), (3, 7), (50, 40), (97, 13)] {
        let image = noise(width, height, &mut rng);
        assert_in_ranges(&features_of(&image, 5));
    }
}

#[test]
fn one_pixel_images_are_total() {
    let features = features_of(&solid(1, 1, [10, 200, 30]), 0);
    assert_eq!(features.edge_density, 0.0);
    assert_eq!(features.entropy, 0.0);
    assert!(RegionLabel::ALL.contains(&features.suggested_region));
}

#[test]
fn dark_left_bright_right_targets_the_right_column() {
    let image = split_halves(90, 60, 20, 235);
    for seed in 0..64 {
        let features = features_of(&image, seed);
        assert!(
            matches!(
                features.suggested_region,
                RegionLabel::TopRight | RegionLabel::MiddleRight | RegionLabel::BottomRight
            ),
            "seed {seed} picked {}",
            features.suggested_region
        );
    }
}

#[test]
fn split_halves_statistics() {
    let image = split_halves(90, 60, 20, 235);
    let buffer = PixelBuffer::from_image(&image).unwrap();
    let luminance = LuminanceField::from_pixels(&buffer);
    let gradient = GradientField::sobel(&luminance);

    assert!((statistics::contrast(&luminance) - 107.5 / 255.0).abs() < 1e-9);
    assert!((statistics::entropy(&luminance) - 1.0).abs() < 1e-9);

    let masses = RegionPartitioner::new(&luminance, &gradient).masses();
    for row in 0..3 {
        let left = masses[row * 3].mass;
        let middle = masses[row * 3 + 1].mass;
        let right = masses[row * 3 + 2].mass;
        assert!((left - 0.6 * (1.0 - 20.0 / 255.0)).abs() < 1e-9);
        assert!((right - 0.6 * (1.0 - 235.0 / 255.0)).abs() < 1e-9);
        assert!(left > middle && middle > right);
    }
}

#[test]
fn uneven_dimensions_cover_every_pixel() {
    // 10x7: cells are 3x2 with the last column 4 wide and the last row 3 tall.
    let image = solid(10, 7, [0, 0, 0]);
    let buffer = PixelBuffer::from_image(&image).unwrap();
    let luminance = LuminanceField::from_pixels(&buffer);
    let gradient = GradientField::sobel(&luminance);
    let masses = RegionPartitioner::new(&luminance, &gradient).masses();
    assert_eq!(masses.len(), 9);
    assert!(masses.iter().all(|cell| (cell.mass - 0.6).abs() < 1e-12));
}
