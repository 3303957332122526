use image::{RgbaImage, SubImage, GenericImageView};
use imageproc::point::Point;
use std::fmt;
use std::time::Instant;

/// One captured image handed to the pipeline by the frame source
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(image: RgbaImage, timestamp: Instant) -> Self {
        Self { image, timestamp }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Axis-aligned box in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// True when the whole box lies inside a `frame_width` x `frame_height` image
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= frame_width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= frame_height)
    }
}

/// A card-shaped region found in one frame
#[derive(Debug, Clone)]
pub struct Candidate {
    pub contour: Vec<Point<u32>>,
    pub bbox: BoundingBox,
    pub area: f32,
}

impl Candidate {
    /// Build a candidate from an ordered outer boundary
    pub fn from_contour(points: Vec<Point<u32>>) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let area = polygon_area(&points);
        Some(Self {
            contour: points,
            bbox: BoundingBox {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            },
            area,
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.bbox.aspect_ratio()
    }

    /// View of the candidate's region in the source image, `None` if the box falls outside it
    pub fn extract_roi<'a>(&self, img: &'a RgbaImage) -> Option<SubImage<&'a RgbaImage>> {
        if !self.bbox.fits_within(img.width(), img.height()) {
            return None;
        }
        Some(img.view(self.bbox.x, self.bbox.y, self.bbox.width, self.bbox.height))
    }
}

/// Shoelace area of a closed polygon
fn polygon_area(points: &[Point<u32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f32 / 2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Ace,
    King,
    Queen,
    Jack,
    Ten,
    Nine,
    Eight,
    Seven,
    Six,
    Five,
    Four,
    Three,
    Two,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::King,
        Rank::Queen,
        Rank::Jack,
        Rank::Ten,
        Rank::Nine,
        Rank::Eight,
        Rank::Seven,
        Rank::Six,
        Rank::Five,
        Rank::Four,
        Rank::Three,
        Rank::Two,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::King => "K",
            Rank::Queen => "Q",
            Rank::Jack => "J",
            Rank::Ten => "10",
            Rank::Nine => "9",
            Rank::Eight => "8",
            Rank::Seven => "7",
            Rank::Six => "6",
            Rank::Five => "5",
            Rank::Four => "4",
            Rank::Three => "3",
            Rank::Two => "2",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let upper = symbol.to_ascii_uppercase();
        Rank::ALL.into_iter().find(|r| r.symbol() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Hearts,
    Spades,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Spades, Suit::Diamonds, Suit::Clubs];

    pub fn letter(&self) -> char {
        match self {
            Suit::Hearts => 'h',
            Suit::Spades => 's',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        let lower = letter.to_ascii_lowercase();
        Suit::ALL.into_iter().find(|s| s.letter() == lower)
    }

    /// Asset name stem for this suit's glyph template
    pub fn name(&self) -> &'static str {
        match self {
            Suit::Hearts => "hearts",
            Suit::Spades => "spades",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
        }
    }
}

/// What a classifier could tell about the suit.
///
/// The colour-only calls come from the heuristic strategy, which cannot tell
/// hearts from diamonds or spades from clubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuitCall {
    Exact(Suit),
    Red,
    Black,
}

impl fmt::Display for SuitCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuitCall::Exact(suit) => write!(f, "{}", suit.letter()),
            SuitCall::Red => f.write_str("h/d"),
            SuitCall::Black => f.write_str("s/c"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub rank: Rank,
    pub suit: SuitCall,
    /// Confidence in [0, 1]
    pub score: f32,
}

impl ClassificationResult {
    /// Short card label such as "Kh" or "10s"
    pub fn label(&self) -> String {
        format!("{}{}", self.rank.symbol(), self.suit)
    }
}

/// One piece of text reported by a recognition service
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub region: Option<BoundingBox>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_outline(x: u32, y: u32, w: u32, h: u32) -> Vec<Point<u32>> {
        vec![
            Point::new(x, y),
            Point::new(x + w - 1, y),
            Point::new(x + w - 1, y + h - 1),
            Point::new(x, y + h - 1),
        ]
    }

    #[test]
    fn test_candidate_geometry() {
        let c = Candidate::from_contour(rect_outline(10, 20, 50, 70)).unwrap();
        assert_eq!(c.bbox, BoundingBox { x: 10, y: 20, width: 50, height: 70 });
        assert_eq!(c.area, 49.0 * 69.0);
        assert!((c.aspect_ratio() - 50.0 / 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_contour_has_no_candidate() {
        assert!(Candidate::from_contour(Vec::new()).is_none());
    }

    #[test]
    fn test_fits_within() {
        let b = BoundingBox { x: 90, y: 0, width: 10, height: 10 };
        assert!(b.fits_within(100, 10));
        assert!(!b.fits_within(99, 10));
        assert!(!BoundingBox { x: 0, y: 0, width: 0, height: 5 }.fits_within(10, 10));
    }

    #[test]
    fn test_labels() {
        let exact = ClassificationResult { rank: Rank::King, suit: SuitCall::Exact(Suit::Hearts), score: 0.9 };
        assert_eq!(exact.label(), "Kh");
        let ten = ClassificationResult { rank: Rank::Ten, suit: SuitCall::Black, score: 0.5 };
        assert_eq!(ten.label(), "10s/c");
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(Rank::from_symbol("q"), Some(Rank::Queen));
        assert_eq!(Rank::from_symbol("10"), Some(Rank::Ten));
        assert_eq!(Rank::from_symbol("1"), None);
        assert_eq!(Suit::from_letter('D'), Some(Suit::Diamonds));
        assert_eq!(Suit::from_letter('x'), None);
    }
}
