pub mod classify;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod overlay;
pub mod pipeline;
pub mod state;

pub use classify::{CardClassifier, HeuristicClassifier, Strategy, TemplateClassifier};
pub use config::PipelineConfig;
pub use detection::CardDetector;
pub use error::CardError;
pub use models::{BoundingBox, Candidate, ClassificationResult, Frame, Rank, Suit, SuitCall, TextBlock};
pub use pipeline::{
    FrameOutcome, FramePipeline, Pipeline, PipelineContext, PipelineData, PipelineStats, PipelineStep,
    DebugConfig,
};
pub use state::{ResultState, SharedResultState, ThrottleDecision};
