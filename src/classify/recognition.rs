use image::{DynamicImage, RgbaImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use regex::Regex;
use rten::Model;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::{CardError, Result};
use crate::models::{BoundingBox, Rank, Suit, TextBlock};
use crate::state::SharedResultState;

/// Whole-frame text recognition. May block; callers run it off the capture path.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<TextBlock>>;
}

/// Standard cache location used by `ocrs-cli` for downloaded models
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| CardError::Config("Neither HOME nor USERPROFILE is set".to_string()))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize the OCR engine from `text-detection.rten` and `text-recognition.rten`
pub fn init_ocr_engine(model_dir: &Path) -> Result<OcrEngine> {
    let detection_model_path = model_dir.join("text-detection.rten");
    let recognition_model_path = model_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(CardError::Ocr(format!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        )));
    }

    let detection_model =
        Model::load_file(&detection_model_path).map_err(|e| CardError::Ocr(e.to_string()))?;
    let recognition_model =
        Model::load_file(&recognition_model_path).map_err(|e| CardError::Ocr(e.to_string()))?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| CardError::Ocr(e.to_string()))
}

/// `TextRecognizer` backed by the ocrs engine; one block per recognized line
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    pub fn new(model_dir: Option<&Path>) -> Result<Self> {
        let dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_model_dir()?,
        };
        Ok(Self {
            engine: init_ocr_engine(&dir)?,
        })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<TextBlock>> {
        let ocr_err = |e: &dyn std::fmt::Display| CardError::Ocr(e.to_string());

        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions()).map_err(|e| ocr_err(&e))?;
        let input = self.engine.prepare_input(source).map_err(|e| ocr_err(&e))?;

        let words = self.engine.detect_words(&input).map_err(|e| ocr_err(&e))?;
        let lines = self.engine.find_text_lines(&input, &words);
        let texts = self.engine.recognize_text(&input, &lines).map_err(|e| ocr_err(&e))?;

        Ok(texts
            .into_iter()
            .flatten()
            .map(|line| {
                let rect = line.bounding_rect();
                TextBlock {
                    text: line.to_string(),
                    region: Some(BoundingBox {
                        x: rect.left().max(0) as u32,
                        y: rect.top().max(0) as u32,
                        width: rect.width().max(0) as u32,
                        height: rect.height().max(0) as u32,
                    }),
                }
            })
            .collect())
    }
}

/// Rank symbol then suit letter, nothing else on the line
static CARD_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(10|[2-9ajqk])([hdsc])\s*$").ok());

/// Parse one block as rank-then-suit-letter ("Kh", "10s"), case-insensitively.
/// Returns the canonical label.
pub fn parse_card_label(text: &str) -> Option<String> {
    let caps = CARD_RE.as_ref()?.captures(text)?;
    let rank = Rank::from_symbol(caps.get(1)?.as_str())?;
    let suit = Suit::from_letter(caps.get(2)?.as_str().chars().next()?)?;
    Some(format!("{}{}", rank.symbol(), suit.letter()))
}

/// Accepted blocks in recognition order, joined with ", "
pub fn card_text(blocks: &[TextBlock], empty: &str) -> String {
    let labels: Vec<String> = blocks.iter().filter_map(|b| parse_card_label(&b.text)).collect();
    if labels.is_empty() {
        empty.to_string()
    } else {
        labels.join(", ")
    }
}

/// Where completed recognitions land. Holds the state weakly and can be
/// closed, so a completion arriving after teardown is dropped.
///
/// Every submission takes a ticket; a completion older than the newest one
/// already published is dropped, so a slow call never overwrites a fresher result.
pub struct RecognitionSink {
    state: Weak<SharedResultState>,
    closed: AtomicBool,
    next_ticket: AtomicU64,
    newest_published: Mutex<u64>,
    no_cards_text: String,
    error_text: String,
}

impl RecognitionSink {
    pub fn new(state: &Arc<SharedResultState>, config: &PipelineConfig) -> Self {
        Self {
            state: Arc::downgrade(state),
            closed: AtomicBool::new(false),
            next_ticket: AtomicU64::new(1),
            newest_published: Mutex::new(0),
            no_cards_text: config.no_cards_text.clone(),
            error_text: config.ocr_error_text.clone(),
        }
    }

    /// Sequence number for the next submission, increasing from 1
    pub fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    /// Fold the outcome of submission `ticket` into the shared state.
    /// Returns false when the result was discarded.
    pub fn complete(&self, ticket: u64, outcome: Result<Vec<TextBlock>>) -> bool {
        if self.closed.load(Ordering::Acquire) {
            debug!("Recognition finished after shutdown, discarding");
            return false;
        }
        let Some(state) = self.state.upgrade() else {
            debug!("Recognition finished after its state was dropped, discarding");
            return false;
        };

        let text = match outcome {
            Ok(blocks) => {
                debug!("Recognized {} text blocks", blocks.len());
                card_text(&blocks, &self.no_cards_text)
            }
            Err(e) => {
                warn!("Text recognition failed: {}", e);
                self.error_text.clone()
            }
        };

        let mut newest = self.newest_published.lock();
        if ticket < *newest {
            debug!("Recognition {} superseded by {}, discarding", ticket, *newest);
            return false;
        }
        *newest = ticket;
        state.publish(text, Instant::now());
        true
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Submits frames to a `TextRecognizer` on the runtime's blocking pool and
/// returns immediately
pub struct AsyncRecognizer {
    recognizer: Arc<dyn TextRecognizer>,
    runtime: Handle,
    sink: Arc<RecognitionSink>,
}

impl AsyncRecognizer {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        runtime: Handle,
        state: &Arc<SharedResultState>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            recognizer,
            runtime,
            sink: Arc::new(RecognitionSink::new(state, config)),
        }
    }

    pub fn submit(&self, image: RgbaImage) -> JoinHandle<()> {
        let recognizer = self.recognizer.clone();
        let sink = self.sink.clone();
        let ticket = sink.ticket();
        debug!("Submitting {}x{} frame for recognition (#{})", image.width(), image.height(), ticket);
        self.runtime.spawn_blocking(move || {
            let outcome = recognizer.recognize(&image);
            sink.complete(ticket, outcome);
        })
    }

    pub fn shutdown(&self) {
        self.sink.close();
    }
}
