use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::warn;

use crate::config::PipelineConfig;

/// DejaVu Sans Mono, used until a caller supplies another font
const FALLBACK_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");

pub fn fallback_font() -> Option<FontArc> {
    match FontArc::try_from_slice(FALLBACK_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Bundled overlay font is unusable: {}", e);
            None
        }
    }
}

const BANNER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BANNER_PADDING: u32 = 4;

/// Tints the whole frame and writes the display text near the top-left corner
#[derive(Clone)]
pub struct OverlayCompositor {
    pub tint: [u8; 3],
    pub tint_weight: f32,
    pub anchor: (i32, i32),
    pub scale: f32,
    /// Bundled font unless replaced; without one only the banner is drawn
    pub font: Option<FontArc>,
}

impl OverlayCompositor {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            tint: config.tint,
            tint_weight: config.tint_weight,
            anchor: config.text_anchor,
            scale: config.text_scale,
            font: fallback_font(),
        }
    }

    pub fn composite(&self, image: &mut RgbaImage, text: &str) {
        self.blend_tint(image);
        if !text.is_empty() {
            self.draw_label(image, text);
        }
    }

    fn blend_tint(&self, image: &mut RgbaImage) {
        let keep = 1.0 - self.tint_weight;
        for pixel in image.pixels_mut() {
            for (channel, tint) in pixel.0.iter_mut().take(3).zip(self.tint) {
                let blended = *channel as f32 * keep + tint as f32 * self.tint_weight;
                *channel = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    fn draw_label(&self, image: &mut RgbaImage, text: &str) {
        let (x, y) = self.anchor;
        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(self.scale, font, text),
            None => (
                (text.chars().count() as f32 * self.scale * 0.6) as u32,
                self.scale as u32,
            ),
        };

        let banner = Rect::at(x - BANNER_PADDING as i32, y - BANNER_PADDING as i32)
            .of_size(text_w.max(1) + 2 * BANNER_PADDING, text_h.max(1) + 2 * BANNER_PADDING);
        draw_filled_rect_mut(image, banner, BANNER_COLOR);

        if let Some(font) = &self.font {
            draw_text_mut(image, TEXT_COLOR, x, y, self.scale, font, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compositor() -> OverlayCompositor {
        OverlayCompositor::from_config(&PipelineConfig::default())
    }

    #[test]
    fn test_tint_blends_eighty_twenty() {
        let mut img = RgbaImage::from_pixel(200, 100, Rgba([100, 100, 100, 255]));
        compositor().composite(&mut img, "");
        // 0.8 * 100 + 0.2 * tint
        assert_eq!(img.get_pixel(150, 90), &Rgba([80, 131, 80, 255]));
    }

    #[test]
    fn test_preserves_dimensions() {
        let mut img = RgbaImage::new(64, 48);
        compositor().composite(&mut img, "Kh, As");
        assert_eq!(img.dimensions(), (64, 48));
    }

    #[test]
    fn test_label_is_redrawn_identically() {
        let overlay = compositor();
        let mut img = RgbaImage::from_pixel(300, 120, Rgba([200, 200, 200, 255]));
        overlay.composite(&mut img, "No cards identified");
        let first = img.clone();

        overlay.composite(&mut img, "No cards identified");
        // the banner is opaque, so everything inside it is redrawn the same way
        assert_eq!(img.get_pixel(7, 7), &BANNER_COLOR);
        let mut lit = 0;
        for y in 6..26 {
            for x in 6..200 {
                assert_eq!(img.get_pixel(x, y), first.get_pixel(x, y));
                if img.get_pixel(x, y)[0] > 128 {
                    lit += 1;
                }
            }
        }
        assert!(lit > 0);
    }

    #[test]
    fn test_different_texts_draw_different_glyphs() {
        let overlay = compositor();
        assert!(overlay.font.is_some());

        let mut kh = RgbaImage::from_pixel(300, 120, Rgba([200, 200, 200, 255]));
        let mut a_s = kh.clone();
        overlay.composite(&mut kh, "Kh");
        overlay.composite(&mut a_s, "As");
        assert_ne!(kh, a_s);
    }

    #[test]
    fn test_bundled_font_loads() {
        assert!(fallback_font().is_some());
    }
}
