use cardsight::detection::templates::{rank_template_name, suit_template_name, MemoryAssetStore};
use cardsight::{Rank, Suit};
use image::{GrayImage, Luma, Rgba, RgbaImage};

pub const FELT: Rgba<u8> = Rgba([20, 90, 40, 255]);
pub const CARD_WHITE: Rgba<u8> = Rgba([240, 240, 240, 255]);

/// Card size with the usual 2.5:3.5 proportions
pub const CARD_W: u32 = 100;
pub const CARD_H: u32 = 140;

/// Creates a green table with nothing on it
pub fn empty_table() -> RgbaImage {
    RgbaImage::from_pixel(320, 240, FELT)
}

/// Two-tone glyph whose pattern depends on `seed`; different seeds barely correlate
pub fn glyph(size: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let v = (x * x * (seed + 3) + y * (seed * 7 + 1) + x * y * seed) % 11;
        Luma([if v < 5 { 20 } else { 235 }])
    })
}

pub fn king_glyph() -> GrayImage {
    glyph(20, 1)
}

pub fn hearts_glyph() -> GrayImage {
    glyph(30, 3)
}

pub fn paste_glyph(img: &mut RgbaImage, glyph: &GrayImage, x0: u32, y0: u32) {
    for (x, y, p) in glyph.enumerate_pixels() {
        let v = p[0];
        img.put_pixel(x0 + x, y0 + y, Rgba([v, v, v, 255]));
    }
}

pub fn draw_card(img: &mut RgbaImage, x0: u32, y0: u32) {
    for y in y0..y0 + CARD_H {
        for x in x0..x0 + CARD_W {
            img.put_pixel(x, y, CARD_WHITE);
        }
    }
}

/// Table with a single king of hearts at (40, 30)
pub fn king_of_hearts_frame() -> RgbaImage {
    let mut img = empty_table();
    draw_card(&mut img, 40, 30);
    // rank index inside the top-left quarter, suit pip in the middle
    paste_glyph(&mut img, &king_glyph(), 43, 33);
    paste_glyph(&mut img, &hearts_glyph(), 75, 85);
    img
}

/// Full set of templates: the glyphs above plus unrelated decoys
pub fn card_store() -> MemoryAssetStore {
    MemoryAssetStore::new()
        .with_template(rank_template_name(Rank::King), king_glyph())
        .with_template(rank_template_name(Rank::Queen), glyph(20, 2))
        .with_template(rank_template_name(Rank::Jack), glyph(20, 7))
        .with_template(suit_template_name(Suit::Hearts), hearts_glyph())
        .with_template(suit_template_name(Suit::Spades), glyph(30, 4))
        .with_template(suit_template_name(Suit::Diamonds), glyph(30, 8))
        .with_template(suit_template_name(Suit::Clubs), glyph(30, 9))
}

/// Templates that appear nowhere on the king of hearts
pub fn decoy_store() -> MemoryAssetStore {
    MemoryAssetStore::new()
        .with_template(rank_template_name(Rank::Queen), glyph(20, 2))
        .with_template(rank_template_name(Rank::Jack), glyph(20, 7))
        .with_template(suit_template_name(Suit::Spades), glyph(30, 4))
        .with_template(suit_template_name(Suit::Diamonds), glyph(30, 8))
}

/// 1280x720 table with one 250x350 card: a 40px rank index at (8, 8) and a
/// 60px suit pip in the middle of the card
pub fn hd_king_of_hearts_frame() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(1280, 720, FELT);
    for y in 180..530 {
        for x in 500..750 {
            img.put_pixel(x, y, CARD_WHITE);
        }
    }
    paste_glyph(&mut img, &glyph(40, 1), 508, 188);
    paste_glyph(&mut img, &glyph(60, 3), 595, 325);
    img
}

/// All 13 rank and 4 suit templates at camera resolution; only K and hearts
/// appear on `hd_king_of_hearts_frame`
pub fn hd_card_store() -> MemoryAssetStore {
    let decoys = [(40, 2), (40, 3), (40, 4), (40, 5), (40, 6), (40, 7), (40, 8), (40, 9), (40, 10), (40, 11), (36, 2), (36, 3)];
    let mut store = MemoryAssetStore::new().with_template(rank_template_name(Rank::King), glyph(40, 1));
    let others = Rank::ALL.into_iter().filter(|r| *r != Rank::King);
    for (rank, (size, seed)) in others.zip(decoys) {
        store = store.with_template(rank_template_name(rank), glyph(size, seed));
    }
    store
        .with_template(suit_template_name(Suit::Hearts), glyph(60, 3))
        .with_template(suit_template_name(Suit::Spades), glyph(60, 4))
        .with_template(suit_template_name(Suit::Diamonds), glyph(60, 8))
        .with_template(suit_template_name(Suit::Clubs), glyph(60, 9))
}
