use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use imageproc::template_matching::{match_template_parallel, MatchTemplateMethod};

/// Best placement of a template inside a search image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Zero-mean normalized cross-correlation, in [-1, 1]
    pub score: f32,
    pub x: u32,
    pub y: u32,
}

/// Slide `template` over `image` and return the best-correlated position.
///
/// The raw cross term comes from imageproc's parallel matcher; window means and
/// variances come from integral images, so each placement costs O(1) on top
/// of it. When the search image is smaller than the template in either
/// direction it is first resized up so the template fits. Returns `None` only
/// for empty inputs.
pub fn best_match(image: &GrayImage, template: &GrayImage) -> Option<TemplateMatch> {
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || image.width() == 0 || image.height() == 0 {
        return None;
    }

    let resized;
    let search = if image.width() < tw || image.height() < th {
        resized = imageops::resize(
            image,
            image.width().max(tw),
            image.height().max(th),
            FilterType::Triangle,
        );
        &resized
    } else {
        image
    };

    let count = u64::from(tw) * u64::from(th);
    let n = count as f64;
    let (t_sum, t_sq_sum) = template.pixels().fold((0u64, 0u64), |(s, sq), p| {
        let v = u64::from(p[0]);
        (s + v, sq + v * v)
    });
    let t_mean = t_sum as f64 / n;
    let t_dev = squared_deviation(count, t_sum, t_sq_sum);

    let cross = match_template_parallel(search, template, MatchTemplateMethod::CrossCorrelation);
    let sums = integral_image::<_, u64>(search);
    let squares = integral_squared_image::<_, u64>(search);

    let mut best: Option<TemplateMatch> = None;
    for (x, y, Luma([c])) in cross.enumerate_pixels() {
        let w_sum = sum_image_pixels(&sums, x, y, x + tw - 1, y + th - 1)[0];
        let w_sq_sum = sum_image_pixels(&squares, x, y, x + tw - 1, y + th - 1)[0];
        let w_dev = squared_deviation(count, w_sum, w_sq_sum);

        let denom = (w_dev * t_dev).sqrt();
        // flat window or flat template carries no shape information
        let score = if denom <= f64::EPSILON {
            0.0
        } else {
            ((f64::from(*c) - w_sum as f64 * t_mean) / denom).clamp(-1.0, 1.0) as f32
        };
        if best.is_none_or(|b| score > b.score) {
            best = Some(TemplateMatch { score, x, y });
        }
    }
    best
}

/// Sum of squared deviations from the mean, `sq - sum^2 / n`, exact in integers
fn squared_deviation(count: u64, sum: u64, sq_sum: u64) -> f64 {
    let scaled = u128::from(count) * u128::from(sq_sum) - u128::from(sum) * u128::from(sum);
    scaled as f64 / count as f64
}
