// THEORY:
// The recommendation engine turns a `FeatureSet` into three collage
// interventions, each a visible instruction plus a hidden rationale.
//
// Key architectural principles:
// 1.  **Closed Catalog**: The library of interventions is the `Intervention`
//     enum. Each variant carries its category, its phrase template and its
//     rationale, so a lookup can never miss and every match is exhaustive.
// 2.  **Three Independent Rules**: Temperature, edge presence and
//     contrast/complexity are judged separately and always in that order. Each
//     rule chooses from its own disjoint set of variants, so the same
//     intervention can never appear twice.
// 3.  **Injected Chance**: The only random choice (the direction of the
//     checkerboard strip) is drawn from the caller's RNG.
// 4.  **Graceful Absence**: Without a `FeatureSet` the engine returns an empty
//     set instead of failing; callers check `is_empty` before rendering.

use crate::core_modules::features::FeatureSet;
use crate::core_modules::region::RegionLabel;
use crate::core_modules::statistics::Temperature;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this edge density an image counts as texture-poor.
pub const LOW_EDGE_DENSITY: f64 = 0.06;
/// Below this contrast an image counts as flat.
pub const LOW_CONTRAST: f64 = 0.12;
/// Below this entropy (bits) an image counts as tonally simple.
pub const LOW_ENTROPY: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pattern,
    Concept,
    Occurrence,
}

/// Direction of a strip-like intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Diagonally,
    Vertically,
    Horizontally,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Diagonally, Direction::Vertically, Direction::Horizontally];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Diagonally => "diagonally",
            Direction::Vertically => "vertically",
            Direction::Horizontally => "horizontally",
        }
    }
}

/// The static library of collage interventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intervention {
    NewsprintHalftone,
    CheckerboardStrip,
    CmyMisregistration,
    RansomLetters,
    MapFragment,
    BarcodeSliver,
    TornPaperDiagonal,
    MaskingTapeX,
    PhotocopyOverlay,
}

impl Intervention {
    pub const ALL: [Intervention; 9] = [
        Intervention::NewsprintHalftone,
        Intervention::CheckerboardStrip,
        Intervention::CmyMisregistration,
        Intervention::RansomLetters,
        Intervention::MapFragment,
        Intervention::BarcodeSliver,
        Intervention::TornPaperDiagonal,
        Intervention::MaskingTapeX,
        Intervention::PhotocopyOverlay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Intervention::NewsprintHalftone => "newsprint halftone dot field",
            Intervention::CheckerboardStrip => "checkerboard strip",
            Intervention::CmyMisregistration => "CMY misregistration swatch",
            Intervention::RansomLetters => "ransom-letter typography",
            Intervention::MapFragment => "found map fragment",
            Intervention::BarcodeSliver => "barcode/receipt sliver",
            Intervention::TornPaperDiagonal => "torn paper diagonal",
            Intervention::MaskingTapeX => "masking tape X",
            Intervention::PhotocopyOverlay => "photocopy overlay",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Intervention::NewsprintHalftone
            | Intervention::CheckerboardStrip
            | Intervention::CmyMisregistration => Category::Pattern,
            Intervention::RansomLetters | Intervention::MapFragment | Intervention::BarcodeSliver => {
                Category::Concept
            }
            Intervention::TornPaperDiagonal
            | Intervention::MaskingTapeX
            | Intervention::PhotocopyOverlay => Category::Occurrence,
        }
    }

    /// The user-facing instruction, placed in `region`. Only the checkerboard
    /// strip uses `direction`; it reads "diagonally" when none is given.
    pub fn phrase(&self, region: RegionLabel, direction: Option<Direction>) -> String {
        match self {
            Intervention::NewsprintHalftone => format!(
                "Lay a **newsprint halftone dot field** as a translucent sheet across the {region}, letting dots clash with your smooth areas."
            ),
            Intervention::CheckerboardStrip => format!(
                "Tape a **thin checkerboard strip** running {} through the {region}, slightly misaligned.",
                direction.unwrap_or(Direction::Diagonally).as_str()
            ),
            Intervention::CmyMisregistration => format!(
                "Add a **CMY misregistration swatch** (cyan/magenta/yellow blocks) in the {region}, offset 2–4px per channel."
            ),
            Intervention::RansomLetters => {
                format!("Collage a **ransom-letter word** from mismatched magazines across the {region}.")
            }
            Intervention::MapFragment => format!(
                "Glue a **small torn map fragment** into the {region} with a hard edge crossing your calm area."
            ),
            Intervention::BarcodeSliver => {
                format!("Slip a **barcode or receipt sliver** into the {region}, slightly tilted.")
            }
            Intervention::TornPaperDiagonal => format!(
                "Tear a **paper diagonal** from corner to corner through the {region}; let the deckle edge show."
            ),
            Intervention::MaskingTapeX => {
                format!("Place a **masking-tape X** over the {region}; leave a slight shadow gap.")
            }
            Intervention::PhotocopyOverlay => format!(
                "Overlay a **high-contrast photocopy** rectangle in the {region}, 5–10° rotated."
            ),
        }
    }

    /// Why this intervention opposes cohesion in general.
    pub fn rationale(&self) -> &'static str {
        match self {
            Intervention::NewsprintHalftone => {
                "Introduce mechanical texture to disrupt soft gradients / uniform fills."
            }
            Intervention::CheckerboardStrip => {
                "High-contrast, regular checkers oppose blended/low-contrast zones."
            }
            Intervention::CmyMisregistration => {
                "Printers’ marks add industrial color conflict against cohesive palettes."
            }
            Intervention::RansomLetters => {
                "Mixed fonts/forms fracture typographic cohesion and inject narrative tension."
            }
            Intervention::MapFragment => {
                "Cartographic lines disrupt organic imagery; a ‘place’ reference counters abstraction."
            }
            Intervention::BarcodeSliver => {
                "Commodity marks oppose hand-made continuity and draw crisp verticals."
            }
            Intervention::TornPaperDiagonal => "Jagged tear adds directional energy and interrupts symmetry.",
            Intervention::MaskingTapeX => "Tape reads provisional; the X symbolically ‘cancels’ cohesion.",
            Intervention::PhotocopyOverlay => {
                "Brittle, desaturated toner fights saturated blends; rotation breaks alignment."
            }
        }
    }
}

impl fmt::Display for Intervention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The ordered output of the rule table: one entry, phrase and reason per rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationSet {
    pub interventions: Vec<Intervention>,
    pub phrases: Vec<String>,
    pub reasons: Vec<String>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    fn push(&mut self, intervention: Intervention, phrase: String, reason: String) {
        self.interventions.push(intervention);
        self.phrases.push(phrase);
        self.reasons.push(reason);
    }
}

/// Applies the three opposition rules to `features`.
pub fn recommend<R: Rng + ?Sized>(features: Option<&FeatureSet>, rng: &mut R) -> RecommendationSet {
    let mut set = RecommendationSet::default();
    let Some(features) = features else {
        return set;
    };
    let region = features.suggested_region;

    // 1) Color temperature opposition.
    match features.temperature {
        Temperature::Cool => {
            let entry = Intervention::CmyMisregistration;
            set.push(
                entry,
                entry.phrase(region, None),
                format!(
                    "Image skews cool; add warm-biased CMY blocks and misregistration to create chroma conflict near {region}."
                ),
            );
        }
        Temperature::Warm => {
            let entry = Intervention::PhotocopyOverlay;
            set.push(
                entry,
                entry.phrase(region, None),
                format!(
                    "Image reads warm/saturated (colorfulness={}); a desaturated photocopy slab opposes palette unity.",
                    to_fixed(features.colorfulness, 1)
                ),
            );
        }
    }

    // 2) Texture / edge presence.
    if features.edge_density < LOW_EDGE_DENSITY {
        let entry = Intervention::NewsprintHalftone;
        set.push(
            entry,
            entry.phrase(region, None),
            format!(
                "Edge density is low ({}); halftone dots add micro-structure and noise.",
                to_fixed(features.edge_density, 3)
            ),
        );
    } else {
        let entry = Intervention::MaskingTapeX;
        set.push(
            entry,
            entry.phrase(region, None),
            format!(
                "Edges already active ({}); a bold tape ‘X’ creates symbolic interruption instead.",
                to_fixed(features.edge_density, 3)
            ),
        );
    }

    // 3) Contrast / complexity.
    if features.contrast < LOW_CONTRAST || features.entropy < LOW_ENTROPY {
        let entry = Intervention::CheckerboardStrip;
        set.push(
            entry,
            entry.phrase(region, Some(Direction::random(rng))),
            format!(
                "Contrast={}, entropy={}; a crisp checker strip injects periodic contrast.",
                to_fixed(features.contrast, 2),
                to_fixed(features.entropy, 2)
            ),
        );
    } else {
        let entry = Intervention::RansomLetters;
        set.push(
            entry,
            entry.phrase(region, None),
            format!(
                "High image complexity (entropy={}); mixed-letter typography shifts attention and breaks semantic cohesion.",
                to_fixed(features.entropy, 2)
            ),
        );
    }

    set
}

/// Extra digits inspected when checking whether a value sits exactly on a
/// rounding tie.
const TIE_DIGITS: usize = 40;

/// Fixed-point formatting that rounds exact ties away from zero, so 0.125
/// prints as 0.13 at two digits. `format!` alone rounds such ties to even.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format!("{value:.digits$}");
    }
    let exact = format!("{:.*}", digits + TIE_DIGITS, value.abs());
    let (kept, rest) = exact.split_at(exact.len() - TIE_DIGITS);
    let tie = rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0');
    if !tie {
        return format!("{value:.digits$}");
    }
    let rounded = increment_last_digit(kept.trim_end_matches('.'));
    if value.is_sign_negative() {
        format!("-{rounded}")
    } else {
        rounded
    }
}

/// Adds one unit in the last place of a plain decimal string, carrying left.
fn increment_last_digit(number: &str) -> String {
    let mut digits: Vec<char> = number.chars().collect();
    for i in (0..digits.len()).rev() {
        match digits[i] {
            '.' => continue,
            '9' => digits[i] = '0',
            d => {
                digits[i] = char::from(d as u8 + 1);
                return digits.into_iter().collect();
            }
        }
    }
    std::iter::once('1').chain(digits).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn features(temperature: Temperature, edge_density: f64, contrast: f64, entropy: f64) -> FeatureSet {
        FeatureSet {
            dominant_color: [128, 128, 128],
            colorfulness: 23.456,
            contrast,
            edge_density,
            entropy,
            hue: 0.0,
            temperature,
            mean_saturation: 0.0,
            suggested_region: RegionLabel::Center,
        }
    }

    #[test]
    fn missing_features_yield_nothing() {
        let set = recommend(None, &mut StdRng::seed_from_u64(0));
        assert!(set.is_empty());
        assert!(set.reasons.is_empty());
        assert!(set.interventions.is_empty());
    }

    #[test]
    fn warm_branch_reports_colorfulness_to_one_decimal() {
        let set = recommend(
            Some(&features(Temperature::Warm, 0.5, 0.3, 7.0)),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(set.interventions[0], Intervention::PhotocopyOverlay);
        assert!(set.reasons[0].contains("colorfulness=23.5"), "{}", set.reasons[0]);
        assert!(set.reasons[1].contains("Edges already active (0.500)"));
        assert!(set.reasons[2].contains("entropy=7.00"));
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(to_fixed(12.25, 1), "12.3");
        assert_eq!(to_fixed(0.0625, 3), "0.063");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(2.125, 2), "2.13");
        assert_eq!(to_fixed(9.995, 2), "9.99");
        assert_eq!(to_fixed(9.875, 2), "9.88");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(9.5, 0), "10");
        assert_eq!(to_fixed(-0.125, 2), "-0.13");
        // 1.005 is stored just below the tie.
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(23.456, 1), "23.5");
        assert_eq!(to_fixed(0.5, 3), "0.500");
    }

    #[test]
    fn reasons_round_ties_like_the_thresholds_read() {
        let tied = FeatureSet {
            colorfulness: 12.25,
            ..features(Temperature::Warm, 0.0625, 0.125, 2.125)
        };
        let set = recommend(Some(&tied), &mut StdRng::seed_from_u64(0));
        assert!(set.reasons[0].contains("colorfulness=12.3"), "{}", set.reasons[0]);
        assert!(set.reasons[1].contains("Edges already active (0.063)"), "{}", set.reasons[1]);
        assert!(set.reasons[2].contains("Contrast=0.13, entropy=2.13"), "{}", set.reasons[2]);

        let complex = recommend(
            Some(&features(Temperature::Warm, 0.5, 0.3, 7.125)),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(complex.reasons[2].contains("entropy=7.13"), "{}", complex.reasons[2]);

        let flat = recommend(
            Some(&features(Temperature::Cool, 0.03125, 0.3, 7.0)),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(flat.reasons[1].contains("Edge density is low (0.031)"), "{}", flat.reasons[1]);
    }

    #[test]
    fn either_low_contrast_or_low_entropy_picks_the_checker() {
        let mut rng = StdRng::seed_from_u64(3);
        let low_contrast = recommend(Some(&features(Temperature::Warm, 0.1, 0.05, 7.5)), &mut rng);
        let low_entropy = recommend(Some(&features(Temperature::Warm, 0.1, 0.4, 5.9)), &mut rng);
        assert_eq!(low_contrast.interventions[2], Intervention::CheckerboardStrip);
        assert_eq!(low_entropy.interventions[2], Intervention::CheckerboardStrip);
    }

    #[test]
    fn thresholds_are_strict() {
        let set = recommend(
            Some(&features(Temperature::Warm, LOW_EDGE_DENSITY, LOW_CONTRAST, LOW_ENTROPY)),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(set.interventions[1], Intervention::MaskingTapeX);
        assert_eq!(set.interventions[2], Intervention::RansomLetters);
    }

    #[test]
    fn checker_phrase_carries_a_direction() {
        let set = recommend(
            Some(&features(Temperature::Cool, 0.01, 0.01, 1.0)),
            &mut StdRng::seed_from_u64(11),
        );
        let phrase = &set.phrases[2];
        assert!(
            Direction::ALL.iter().any(|d| phrase.contains(&format!("running {} through the center", d.as_str()))),
            "{phrase}"
        );
    }

    #[test]
    fn rules_never_repeat_an_intervention() {
        let mut rng = StdRng::seed_from_u64(5);
        for temperature in [Temperature::Warm, Temperature::Cool] {
            for edge_density in [0.0, 0.5] {
                for (contrast, entropy) in [(0.0, 0.0), (0.4, 7.9)] {
                    let set = recommend(Some(&features(temperature, edge_density, contrast, entropy)), &mut rng);
                    assert_eq!(set.len(), 3);
                    assert_ne!(set.interventions[0], set.interventions[1]);
                    assert_ne!(set.interventions[1], set.interventions[2]);
                    assert_ne!(set.interventions[0], set.interventions[2]);
                }
            }
        }
    }

    #[test]
    fn catalog_is_grouped_by_category() {
        let count = |category| Intervention::ALL.iter().filter(|i| i.category() == category).count();
        assert_eq!(count(Category::Pattern), 3);
        assert_eq!(count(Category::Concept), 3);
        assert_eq!(count(Category::Occurrence), 3);
        for intervention in Intervention::ALL {
            let phrase = intervention.phrase(RegionLabel::TopLeft, None);
            assert!(phrase.contains("top left"), "{phrase}");
            assert!(!intervention.rationale().is_empty());
        }
    }
}
