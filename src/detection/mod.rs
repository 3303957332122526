pub mod preprocessing;
pub mod contours;
pub mod filter;
pub mod matching;
pub mod templates;
pub mod steps;

use image::{GrayImage, RgbaImage};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::models::Candidate;
use filter::CandidateLimits;

/// Segmentation and geometric filtering of card regions in one frame
#[derive(Debug, Clone)]
pub struct CardDetector {
    pub saturation_max: u8,
    pub value_min: u8,
    pub morph_radius: u8,
    pub limits: CandidateLimits,
}

impl CardDetector {
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            saturation_max: config.saturation_max,
            value_min: config.value_min,
            morph_radius: config.morph_radius,
            limits: CandidateLimits {
                min_area: config.min_area,
                min_aspect: config.min_aspect,
                max_aspect: config.max_aspect,
            },
        }
    }

    /// Cleaned binary mask of card-background pixels
    pub fn mask(&self, img: &RgbaImage) -> GrayImage {
        let raw = preprocessing::card_background_mask(img, self.saturation_max, self.value_min);
        preprocessing::clean_mask(&raw, self.morph_radius)
    }

    /// Every outer region of the mask, before filtering (for debugging)
    pub fn segment(&self, img: &RgbaImage) -> Vec<Candidate> {
        contours::find_external_candidates(&self.mask(img))
    }

    /// Card-shaped candidates in discovery order
    pub fn detect(&self, img: &RgbaImage) -> Vec<Candidate> {
        let all = self.segment(img);
        let total = all.len();
        let kept = filter::filter_candidates(all, &self.limits, img.width(), img.height());
        debug!("Kept {} of {} candidate regions", kept.len(), total);
        kept
    }
}

impl Default for CardDetector {
    fn default() -> Self {
        Self::new()
    }
}
