use image::{GenericImageView, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

/// Hue on the half-degree scale (0-180), saturation and value on 0-255
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta) + 120.0
    } else {
        60.0 * ((r - g) / delta) + 240.0
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    Hsv { h: h / 2.0, s, v: max }
}

/// Convert image to grayscale
pub fn to_grayscale<I>(img: &I) -> GrayImage
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, _]) = img.get_pixel(x, y);
        // Rec. 601 luma, as used by most camera pipelines
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Binary mask of near-white pixels: low saturation and high value, any hue
pub fn card_background_mask(img: &RgbaImage, saturation_max: u8, value_min: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let Rgba([r, g, b, _]) = *img.get_pixel(x, y);
        let hsv = rgb_to_hsv(r, g, b);
        if hsv.s <= saturation_max as f32 && hsv.v >= value_min as f32 {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Open to drop speckles, then close to fill small gaps.
/// A radius of 2 under the chessboard norm is a 5x5 square element.
pub fn clean_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    let opened = open(mask, Norm::LInf, radius);
    close(&opened, Norm::LInf, radius)
}
