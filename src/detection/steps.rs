use crate::classify::CardClassifier;
use crate::detection::contours;
use crate::detection::filter::CandidateLimits;
use crate::detection::CardDetector;
use crate::error::Result;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

/// Threshold the frame to near-white pixels and clean the mask
pub struct MaskStep {
    pub detector: CardDetector,
}

impl PipelineStep for MaskStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let rgba = item.image.to_rgba8();
            result.push(PipelineData {
                image: DynamicImage::ImageLuma8(self.detector.mask(&rgba)),
                ..item
            });
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Mask"
    }
}

/// Split a mask into one item per outer region, cropped from the original frame
pub struct ContourStep;

impl PipelineStep for ContourStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask = item.image.to_luma8();
            for candidate in contours::find_external_candidates(&mask) {
                // contours come from a mask of the frame's own size, so the crop always fits
                let Some(roi) = candidate.extract_roi(&item.original) else {
                    continue;
                };
                let crop = DynamicImage::ImageRgba8(roi.to_image());
                result.push(PipelineData::from_region(crop, item.original.clone(), candidate));
            }
        }

        debug!("Found {} outer regions", result.len());
        Ok(result)
    }

    fn name(&self) -> &str {
        "Contours"
    }
}

/// Drop regions that cannot be a card
pub struct CandidateFilterStep {
    pub limits: CandidateLimits,
}

impl PipelineStep for CandidateFilterStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let total = data.len();
        let result: Vec<PipelineData> = data
            .into_iter()
            .filter(|item| {
                let (w, h) = (item.original.width(), item.original.height());
                item.candidate
                    .as_ref()
                    .is_some_and(|c| self.limits.accepts(c, w, h))
            })
            .collect();

        debug!("Kept {} of {} candidates", result.len(), total);
        Ok(result)
    }

    fn name(&self) -> &str {
        "Candidate Filter"
    }
}

/// Label each candidate; candidates without a full rank and suit are dropped
pub struct ClassifyStep {
    pub classifier: Arc<dyn CardClassifier>,
}

impl PipelineStep for ClassifyStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let region = item.image.to_rgba8();
            match self.classifier.classify(&region) {
                Some(label) => {
                    debug!("{} classified {} (score {:.2})", self.classifier.name(), label.label(), label.score);
                    result.push(PipelineData {
                        label: Some(label),
                        ..item
                    });
                }
                None => debug!("{} found no label for region", self.classifier.name()),
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Classify"
    }
}

/// Mask, contours and filter in the order the frame analysis runs them
pub fn detection_steps(detector: &CardDetector) -> Vec<Arc<dyn PipelineStep>> {
    vec![
        Arc::new(MaskStep {
            detector: detector.clone(),
        }),
        Arc::new(ContourStep),
        Arc::new(CandidateFilterStep {
            limits: detector.limits,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn context() -> PipelineContext {
        PipelineContext { debug: None }
    }

    #[test]
    fn test_contour_step_crops_from_original() {
        let mut frame = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        for y in 10..80 {
            for x in 20..70 {
                frame.put_pixel(x, y, Rgba([250, 250, 250, 255]));
            }
        }
        let data = vec![PipelineData::from_frame(&frame)];
        let masked = MaskStep { detector: CardDetector::new() }
            .process(data, &context())
            .unwrap();
        let regions = ContourStep.process(masked, &context()).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].image.width(), 50);
        assert_eq!(regions[0].image.height(), 70);
        assert_eq!(regions[0].image.to_rgba8().get_pixel(0, 0), &Rgba([250, 250, 250, 255]));
    }

    #[test]
    fn test_filter_step_drops_items_without_candidate() {
        let frame = RgbaImage::new(10, 10);
        let data = vec![PipelineData::from_frame(&frame)];
        let kept = CandidateFilterStep { limits: CandidateLimits::default() }
            .process(data, &context())
            .unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_detection_steps_keep_only_card_shaped_candidates() {
        // card, square, tall strip, landscape strip, tiny chip
        let mut frame = RgbaImage::from_pixel(320, 240, Rgba([20, 90, 40, 255]));
        for &(x0, y0, w, h) in &[(10, 10, 40, 56), (100, 10, 60, 60), (200, 100, 20, 60), (60, 150, 120, 40), (280, 200, 10, 10)] {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    frame.put_pixel(x, y, Rgba([245, 245, 240, 255]));
                }
            }
        }

        let detector = CardDetector::new();
        let mut pipeline = crate::pipeline::Pipeline::new().add_steps(detection_steps(&detector));
        let kept = pipeline.run(&frame).unwrap();

        let mut boxes: Vec<_> = kept.iter().filter_map(|item| item.candidate.as_ref()).map(|c| c.bbox).collect();
        for c in kept.iter().filter_map(|item| item.candidate.as_ref()) {
            assert!((0.4..=1.0).contains(&c.aspect_ratio()));
            assert!(c.area >= 500.0);
            assert!(c.bbox.fits_within(frame.width(), frame.height()));
        }
        boxes.sort_by_key(|b| b.x);
        assert_eq!(boxes.len(), 2);
        assert_eq!((boxes[0].x, boxes[0].y), (10, 10));
        assert_eq!((boxes[1].x, boxes[1].y), (100, 10));

        // the standalone detector agrees with the step chain
        let mut direct: Vec<_> = detector.detect(&frame).into_iter().map(|c| c.bbox).collect();
        direct.sort_by_key(|b| b.x);
        assert_eq!(direct, boxes);
    }
}
