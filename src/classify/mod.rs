//! Turning candidate regions (or whole frames) into card labels

pub mod template;
pub mod heuristic;
pub mod recognition;

use image::RgbaImage;
use std::sync::Arc;

use crate::models::ClassificationResult;
use recognition::TextRecognizer;

pub use heuristic::HeuristicClassifier;
pub use template::TemplateClassifier;

/// Maps one cropped candidate region to a label, or nothing
pub trait CardClassifier: Send + Sync {
    fn classify(&self, region: &RgbaImage) -> Option<ClassificationResult>;

    fn name(&self) -> &str;
}

/// How a frame pipeline labels cards, fixed when the pipeline is built
pub enum Strategy {
    /// Segment the frame and classify each candidate synchronously
    Regions(Arc<dyn CardClassifier>),
    /// Hand the whole frame to a text recognizer without waiting for it
    TextRecognition {
        recognizer: Arc<dyn TextRecognizer>,
        runtime: tokio::runtime::Handle,
    },
}

/// Comma-joined labels, or `empty` when nothing was identified
pub fn display_text(results: &[ClassificationResult], empty: &str) -> String {
    if results.is_empty() {
        return empty.to_string();
    }
    results
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rank, Suit, SuitCall};

    #[test]
    fn test_display_text_joins_in_order() {
        let results = [
            ClassificationResult { rank: Rank::King, suit: SuitCall::Exact(Suit::Hearts), score: 0.9 },
            ClassificationResult { rank: Rank::Ace, suit: SuitCall::Exact(Suit::Spades), score: 0.8 },
            ClassificationResult { rank: Rank::Seven, suit: SuitCall::Exact(Suit::Diamonds), score: 0.75 },
        ];
        assert_eq!(display_text(&results, "none"), "Kh, As, 7d");
    }

    #[test]
    fn test_display_text_empty() {
        assert_eq!(display_text(&[], "No cards identified"), "No cards identified");
    }
}
