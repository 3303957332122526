use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use crate::models::Candidate;

/// Find the outermost boundaries in a binary mask.
/// Hole borders and anything nested inside a hole are ignored.
pub fn find_external_candidates(mask: &GrayImage) -> Vec<Candidate> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| Candidate::from_contour(c.points))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, value: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_candidates() {
        let mask = GrayImage::new(50, 50);
        assert!(find_external_candidates(&mask).is_empty());
    }

    #[test]
    fn test_two_blobs_give_two_candidates() {
        let mut mask = GrayImage::new(200, 100);
        fill(&mut mask, 10, 10, 40, 60, 255);
        fill(&mut mask, 100, 20, 30, 50, 255);

        let mut found = find_external_candidates(&mask);
        found.sort_by_key(|c| c.bbox.x);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].bbox.x, found[0].bbox.y, found[0].bbox.width, found[0].bbox.height), (10, 10, 40, 60));
        assert_eq!((found[1].bbox.x, found[1].bbox.width), (100, 30));
    }

    #[test]
    fn test_inner_blob_inside_hole_is_ignored() {
        let mut mask = GrayImage::new(120, 120);
        fill(&mut mask, 10, 10, 100, 100, 255);
        fill(&mut mask, 30, 30, 60, 60, 0);
        fill(&mut mask, 50, 50, 20, 20, 255);

        let found = find_external_candidates(&mask);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bbox.width, 100);
    }
}
