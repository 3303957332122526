use ab_glyph::FontArc;
use image::GrayImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::models::{Rank, Suit};

/// Source of reference glyphs. A missing asset is a normal outcome.
pub trait AssetStore: Send + Sync {
    fn load_template(&self, name: &str) -> Option<GrayImage>;

    /// Font used by the overlay, if the store bundles one
    fn load_font(&self) -> Option<FontArc> {
        None
    }
}

pub fn rank_template_name(rank: Rank) -> String {
    format!("ranks/{}", rank.symbol())
}

pub fn suit_template_name(suit: Suit) -> String {
    format!("suits/{}", suit.name())
}

/// Reads `<root>/<name>.png` files and an optional `<root>/font.ttf`
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    root: PathBuf,
}

impl DirectoryAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for DirectoryAssetStore {
    fn load_template(&self, name: &str) -> Option<GrayImage> {
        let path = self.root.join(format!("{}.png", name));
        match image::open(&path) {
            Ok(img) => Some(img.to_luma8()),
            Err(e) => {
                debug!("Template {} unavailable at {}: {}", name, path.display(), e);
                None
            }
        }
    }

    fn load_font(&self) -> Option<FontArc> {
        let path = self.root.join("font.ttf");
        let bytes = std::fs::read(&path).ok()?;
        match FontArc::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(e) => {
                debug!("Font at {} is unusable: {}", path.display(), e);
                None
            }
        }
    }
}

/// Templates held in memory, keyed by asset name
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    templates: HashMap<String, GrayImage>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, name: impl Into<String>, template: GrayImage) -> Self {
        self.templates.insert(name.into(), template);
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn load_template(&self, name: &str) -> Option<GrayImage> {
        self.templates.get(name).cloned()
    }
}

/// Every rank and suit glyph that could be loaded
#[derive(Debug, Default)]
pub struct TemplateSet {
    pub ranks: Vec<(Rank, GrayImage)>,
    pub suits: Vec<(Suit, GrayImage)>,
}

impl TemplateSet {
    pub fn load(store: &dyn AssetStore) -> Self {
        let ranks: Vec<_> = Rank::ALL
            .into_iter()
            .filter_map(|r| store.load_template(&rank_template_name(r)).map(|t| (r, t)))
            .collect();
        let suits: Vec<_> = Suit::ALL
            .into_iter()
            .filter_map(|s| store.load_template(&suit_template_name(s)).map(|t| (s, t)))
            .collect();

        debug!(
            "Loaded {}/{} rank and {}/{} suit templates",
            ranks.len(),
            Rank::ALL.len(),
            suits.len(),
            Suit::ALL.len()
        );
        Self { ranks, suits }
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty() && self.suits.is_empty()
    }
}

/// Loads the template set on first use and hands out shared read-only access
/// afterwards. Never invalidated.
pub struct TemplateCache {
    store: Arc<dyn AssetStore>,
    templates: Mutex<Option<Arc<TemplateSet>>>,
}

impl TemplateCache {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            templates: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Arc<TemplateSet> {
        // Clone the Arc so the lock is released before matching starts
        let mut guard = self.templates.lock();
        guard
            .get_or_insert_with(|| Arc::new(TemplateSet::load(self.store.as_ref())))
            .clone()
    }
}
