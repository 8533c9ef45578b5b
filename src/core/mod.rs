//! Upstream clients and the assessment pipeline.
//!
//! - `audio`: upload handling and normalization to 16 kHz mono PCM WAV
//! - `stt`: Whisper transcription
//! - `assessment`: Azure Speech pronunciation assessment
//! - `scoring`: band estimation through an Azure OpenAI chat deployment
//! - `pipeline`: sequencing of the four steps above
//! - `token`: browser speech tokens
//! - `tts`: speech synthesis

pub mod assessment;
pub mod audio;
pub mod pipeline;
pub mod scoring;
pub mod stt;
pub mod token;
pub mod tts;

pub use audio::{AudioBlob, NormalizedAudio};
pub use pipeline::{AssessmentPipeline, AssessmentReport, PipelineError};
