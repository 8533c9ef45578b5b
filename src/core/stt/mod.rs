//! Speech-to-text clients.
//!
//! The assessment flow only needs a single batch transcription of an uploaded
//! recording, so the abstraction is a one-shot [`Transcriber`] rather than a
//! streaming session.

mod base;
pub mod whisper;

pub use base::{Transcriber, TranscriptionError, TranscriptionOutput};
pub use whisper::{WhisperConfig, WhisperTranscriber};
