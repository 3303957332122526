#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from cardsight for tests
pub use cardsight::{
    CardClassifier, Frame, FrameOutcome, FramePipeline, HeuristicClassifier, PipelineConfig, Strategy,
    TemplateClassifier,
};
