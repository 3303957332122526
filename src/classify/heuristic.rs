use image::{Rgba, RgbaImage};

use super::template::corner_crop;
use super::CardClassifier;
use crate::detection::preprocessing::{rgb_to_hsv, to_grayscale};
use crate::models::{ClassificationResult, Rank, SuitCall};

/// Fixed confidence reported for every heuristic label
pub const HEURISTIC_SCORE: f32 = 0.5;

/// Cheap fallback for when no templates are available.
///
/// Suit comes from the mean hue and saturation of the region's ink, so it can
/// only say red (hearts or diamonds) or black (spades or clubs). Rank is one of
/// three coarse bands of the corner's mean intensity: K for dark, 7 for mid,
/// A for bright. Every region gets a label.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    /// Pixels at or under this saturation and at or over `value_min` are card background
    pub saturation_max: u8,
    pub value_min: u8,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self {
            saturation_max: 50,
            value_min: 200,
        }
    }
}

impl HeuristicClassifier {
    /// Red when the mean hue sits near 0/180 with saturation above 50, black otherwise
    pub fn suit_color(&self, region: &RgbaImage) -> SuitCall {
        let (hue, saturation) = self.mean_ink_hue_saturation(region);
        let red_hue = !(15.0..=165.0).contains(&hue);
        if red_hue && saturation > 50.0 {
            SuitCall::Red
        } else {
            // blue-ish hues in [90, 150] and every other case
            SuitCall::Black
        }
    }

    pub fn rank_band(&self, region: &RgbaImage) -> Rank {
        let gray = to_grayscale(region);
        let sample = corner_crop(&gray).unwrap_or(gray);
        let count = (sample.width() as u64 * sample.height() as u64).max(1);
        let mean = sample.pixels().map(|p| p[0] as u64).sum::<u64>() as f32 / count as f32;

        match mean {
            m if m < 85.0 => Rank::King,
            m if m < 170.0 => Rank::Seven,
            _ => Rank::Ace,
        }
    }

    /// Circular mean hue (half-degree scale) and mean saturation over
    /// non-background pixels, or over the whole region if it is all background
    fn mean_ink_hue_saturation(&self, region: &RgbaImage) -> (f32, f32) {
        let hsv: Vec<_> = region
            .pixels()
            .map(|&Rgba([r, g, b, _])| rgb_to_hsv(r, g, b))
            .collect();
        let ink: Vec<_> = hsv
            .iter()
            .filter(|p| !(p.s <= self.saturation_max as f32 && p.v >= self.value_min as f32))
            .collect();
        let sample: Vec<_> = if ink.is_empty() { hsv.iter().collect() } else { ink };
        if sample.is_empty() {
            return (0.0, 0.0);
        }

        let n = sample.len() as f32;
        let (mut sin_sum, mut cos_sum, mut sat_sum) = (0.0f32, 0.0f32, 0.0f32);
        for p in &sample {
            // hue wraps at 180, so average it as an angle
            let angle = (p.h * 2.0).to_radians();
            sin_sum += angle.sin();
            cos_sum += angle.cos();
            sat_sum += p.s;
        }
        let mut hue = sin_sum.atan2(cos_sum).to_degrees() / 2.0;
        if hue < 0.0 {
            hue += 180.0;
        }
        (hue, sat_sum / n)
    }
}

impl CardClassifier for HeuristicClassifier {
    fn classify(&self, region: &RgbaImage) -> Option<ClassificationResult> {
        if region.width() == 0 || region.height() == 0 {
            return None;
        }
        Some(ClassificationResult {
            rank: self.rank_band(region),
            suit: self.suit_color(region),
            score: HEURISTIC_SCORE,
        })
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
