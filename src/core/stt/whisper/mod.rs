//! Azure OpenAI Whisper transcription.
//!
//! A single multipart POST of the uploaded recording to a Whisper deployment.
//! The recording is forwarded as received; the service accepts the common
//! browser containers directly.
//!
//! - [`config`]: deployment URL and key
//! - [`messages`]: response and error payloads
//! - [`client`]: the [`WhisperTranscriber`]

mod client;
mod config;
mod messages;


pub use client::WhisperTranscriber;
pub use config::{UPLOAD_FILE_NAME, WhisperConfig};
pub use messages::{AzureErrorResponse, TranscriptionResponse};
