//! The `/ackaud` assessment pipeline.
//!
//! Transcription, normalization, pronunciation assessment and band scoring run
//! strictly in sequence; the first failure ends the run.

mod orchestrator;
mod stage;

pub use orchestrator::{AssessmentPipeline, AssessmentReport, PipelineError};
pub use stage::{PipelineRun, PipelineStage};
