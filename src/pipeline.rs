use ab_glyph::FontArc;
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classify::{display_text, recognition::AsyncRecognizer, CardClassifier, Strategy};
use crate::config::PipelineConfig;
use crate::detection::steps::{detection_steps, ClassifyStep};
use crate::detection::CardDetector;
use crate::error::{CardError, Result};
use crate::models::{Candidate, ClassificationResult, Frame};
use crate::overlay::OverlayCompositor;
use crate::state::{SharedResultState, ThrottleDecision};

/// Data that flows through the analysis steps.
/// Each item is either the whole frame, its mask, or one candidate region.
#[derive(Clone)]
pub struct PipelineData {
    /// Working image for the next step (frame, mask or region crop)
    pub image: DynamicImage,

    /// The frame under analysis, shared between all items
    pub original: Arc<RgbaImage>,

    /// Set once contours have been extracted
    pub candidate: Option<Candidate>,

    /// Set by the classify step
    pub label: Option<ClassificationResult>,
}

impl PipelineData {
    /// Item covering a full frame
    pub fn from_frame(frame: &RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(frame.clone()),
            original: Arc::new(frame.clone()),
            candidate: None,
            label: None,
        }
    }

    /// Item for one candidate region of a frame
    pub fn from_region(image: DynamicImage, original: Arc<RgbaImage>, candidate: Candidate) -> Self {
        Self {
            image,
            original,
            candidate: Some(candidate),
            label: None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all analysis steps implement.
/// Steps can split data (1 → many), filter (many → fewer), or transform (many → many).
pub trait PipelineStep: Send + Sync {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name, also used for debug directories
    fn name(&self) -> &str;
}

/// Composable chain of analysis steps
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
    runs: usize,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
            runs: 0,
        }
    }

    /// Enable debug dumps. The directory must be empty or non-existent.
    fn enable_debug(&mut self, output_dir: PathBuf) -> Result<()> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(CardError::Config(format!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });
        Ok(())
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn add_steps(mut self, steps: impl IntoIterator<Item = Arc<dyn PipelineStep>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Run every step over one frame
    pub fn run(&mut self, frame: &RgbaImage) -> Result<Vec<PipelineData>> {
        self.runs += 1;
        let run_dir = self
            .context
            .debug
            .as_ref()
            .map(|d| d.output_dir.join(format!("frame_{:04}", self.runs)));

        let mut data = vec![PipelineData::from_frame(frame)];
        if let Some(dir) = &run_dir {
            save_debug_images(&dir.join("00_input"), &data)?;
        }

        for (step_idx, step) in self.steps.iter().enumerate() {
            let input_count = data.len();
            data = step.process(data, &self.context)?;
            debug!("Step {}: {} → {} items", step.name(), input_count, data.len());

            if let Some(dir) = &run_dir {
                let step_dir_name = format!(
                    "{:02}_{}",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                save_debug_images(&dir.join(step_dir_name), &data)?;
            }
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn save_debug_images(step_dir: &std::path::Path, data: &[PipelineData]) -> Result<()> {
    std::fs::create_dir_all(step_dir)?;
    for (idx, item) in data.iter().enumerate() {
        item.image.save(step_dir.join(format!("{:02}.png", idx + 1)))?;
    }
    Ok(())
}

/// Build the segmentation → filter → classify chain for a region classifier
pub fn build_region_pipeline(detector: &CardDetector, classifier: Arc<dyn CardClassifier>) -> Pipeline {
    Pipeline::new()
        .add_steps(detection_steps(detector))
        .add_step(Arc::new(ClassifyStep { classifier }))
}

/// What happened to one frame
#[derive(Debug)]
pub enum FrameOutcome {
    /// Reused the previous display text
    Throttled,
    /// Segmented and classified synchronously
    Analyzed,
    /// Whole frame handed to the text recognizer; completes later
    Submitted(tokio::task::JoinHandle<()>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames: u64,
    pub analyzed: u64,
    pub submitted: u64,
    pub throttled: u64,
}

enum Analysis {
    Regions(Pipeline),
    TextRecognition(AsyncRecognizer),
}

/// Per-frame driver: throttle, analyse, publish, composite
pub struct FramePipeline {
    config: PipelineConfig,
    state: Arc<SharedResultState>,
    analysis: Analysis,
    overlay: OverlayCompositor,
    stats: PipelineStats,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig, strategy: Strategy) -> Self {
        let state = Arc::new(SharedResultState::new(config.throttle_interval()));
        let analysis = match strategy {
            Strategy::Regions(classifier) => {
                let detector = CardDetector::from_config(&config);
                Analysis::Regions(build_region_pipeline(&detector, classifier))
            }
            Strategy::TextRecognition { recognizer, runtime } => {
                Analysis::TextRecognition(AsyncRecognizer::new(recognizer, runtime, &state, &config))
            }
        };
        let overlay = OverlayCompositor::from_config(&config);

        Self {
            config,
            state,
            analysis,
            overlay,
            stats: PipelineStats::default(),
        }
    }

    /// Replace the bundled overlay font; `None` keeps the current one
    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        if let Some(font) = font {
            self.overlay.font = Some(font);
        }
        self
    }

    /// Dump intermediate images of every region analysis under `output_dir`
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        match &mut self.analysis {
            Analysis::Regions(pipeline) => pipeline.enable_debug(output_dir)?,
            Analysis::TextRecognition(_) => warn!("Debug dumps only apply to region analysis"),
        }
        Ok(self)
    }

    pub fn state(&self) -> Arc<SharedResultState> {
        self.state.clone()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Analyse the frame if the throttle allows it, then draw the current
    /// display text onto it. Never fails: analysis errors degrade to "no cards".
    pub fn process_frame(&mut self, frame: &mut Frame) -> FrameOutcome {
        self.stats.frames += 1;

        let outcome = match self.state.gate(frame.timestamp) {
            ThrottleDecision::Skip => {
                self.stats.throttled += 1;
                debug!(
                    "Frame throttled ({:?} window), reusing previous result",
                    self.state.interval()
                );
                FrameOutcome::Throttled
            }
            ThrottleDecision::Run => match &mut self.analysis {
                Analysis::Regions(pipeline) => {
                    let text = match pipeline.run(&frame.image) {
                        Ok(items) => {
                            let labels: Vec<ClassificationResult> =
                                items.iter().filter_map(|item| item.label).collect();
                            display_text(&labels, &self.config.no_cards_text)
                        }
                        Err(e) => {
                            warn!("Frame analysis failed: {}", e);
                            self.config.no_cards_text.clone()
                        }
                    };
                    self.state.publish(text, frame.timestamp);
                    self.stats.analyzed += 1;
                    FrameOutcome::Analyzed
                }
                Analysis::TextRecognition(recognizer) => {
                    let handle = recognizer.submit(frame.image.clone());
                    self.stats.submitted += 1;
                    FrameOutcome::Submitted(handle)
                }
            },
        };

        let text = self.state.display_text();
        self.overlay.composite(&mut frame.image, &text);
        outcome
    }

    /// Stop accepting recognition results; completions still in flight are discarded
    pub fn shutdown(&self) {
        if let Analysis::TextRecognition(recognizer) = &self.analysis {
            recognizer.shutdown();
        }
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
