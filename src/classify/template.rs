use image::imageops;
use image::{GrayImage, RgbaImage};
use std::sync::Arc;
use tracing::debug;

use super::CardClassifier;
use crate::detection::matching::best_match;
use crate::detection::preprocessing::to_grayscale;
use crate::detection::templates::{AssetStore, TemplateCache};
use crate::models::{ClassificationResult, Rank, Suit, SuitCall};

/// Rank and suit by normalized cross-correlation against glyph templates.
///
/// Suits are searched over the whole region; ranks only in the top-left
/// corner square (side = shorter edge / 4), where the index is printed.
pub struct TemplateClassifier {
    cache: TemplateCache,
    threshold: f32,
}

impl TemplateClassifier {
    pub fn new(store: Arc<dyn AssetStore>, threshold: f32) -> Self {
        Self {
            cache: TemplateCache::new(store),
            threshold,
        }
    }

    /// Best suit scoring above the threshold
    pub fn identify_suit(&self, gray: &GrayImage) -> Option<(Suit, f32)> {
        let templates = self.cache.get();
        pick_best(
            templates.suits.iter().map(|(suit, t)| (*suit, t)),
            gray,
            self.threshold,
        )
    }

    /// Best rank scoring above the threshold, searched in the corner only
    pub fn identify_rank(&self, gray: &GrayImage) -> Option<(Rank, f32)> {
        let corner = corner_crop(gray)?;
        let templates = self.cache.get();
        pick_best(
            templates.ranks.iter().map(|(rank, t)| (*rank, t)),
            &corner,
            self.threshold,
        )
    }
}

impl CardClassifier for TemplateClassifier {
    fn classify(&self, region: &RgbaImage) -> Option<ClassificationResult> {
        if self.cache.get().is_empty() {
            debug!("No templates available, skipping region");
            return None;
        }
        let gray = to_grayscale(region);
        let suit = self.identify_suit(&gray);
        let rank = self.identify_rank(&gray);

        match (rank, suit) {
            (Some((rank, rank_score)), Some((suit, suit_score))) => Some(ClassificationResult {
                rank,
                suit: SuitCall::Exact(suit),
                score: ((rank_score + suit_score) / 2.0).clamp(0.0, 1.0),
            }),
            _ => {
                debug!(
                    "Incomplete match: rank {:?}, suit {:?}",
                    rank.map(|(r, _)| r),
                    suit.map(|(s, _)| s)
                );
                None
            }
        }
    }

    fn name(&self) -> &str {
        "template"
    }
}

/// Top-left square whose side is a quarter of the region's shorter edge
pub fn corner_crop(gray: &GrayImage) -> Option<GrayImage> {
    let (w, h) = gray.dimensions();
    let side = w.min(h) / 4;
    if side == 0 || side > w || side > h {
        return None;
    }
    Some(imageops::crop_imm(gray, 0, 0, side, side).to_image())
}

/// Highest-scoring label strictly above `threshold`; the first one wins a tie
fn pick_best<'a, L: Copy>(
    templates: impl Iterator<Item = (L, &'a GrayImage)>,
    search: &GrayImage,
    threshold: f32,
) -> Option<(L, f32)> {
    let mut best: Option<(L, f32)> = None;
    for (label, template) in templates {
        let Some(m) = best_match(search, template) else {
            continue;
        };
        if m.score > threshold && best.is_none_or(|(_, score)| m.score > score) {
            best = Some((label, m.score));
        }
    }
    best
}
