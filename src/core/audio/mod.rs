//! Audio handling for uploaded recordings.
//!
//! - [`AudioBlob`]: the raw upload exactly as the browser sent it
//! - [`normalizer`]: conversion of arbitrary containers into the canonical
//!   16 kHz mono 16-bit PCM WAV the pronunciation endpoint accepts
//! - [`wav`]: RIFF/WAVE packaging helpers

mod normalizer;
mod opus_stream;
pub mod wav;

use bytes::Bytes;

pub use normalizer::{
    ConversionError, NormalizedAudio, TARGET_BITS_PER_SAMPLE, TARGET_CHANNELS, TARGET_SAMPLE_RATE,
    normalize,
};

/// Fallback MIME type when the client does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Uploaded audio as received from the client.
///
/// Owned by the request handler for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct AudioBlob {
    /// Raw bytes of the uploaded file
    pub data: Bytes,
    /// Declared MIME type (may not match the actual container)
    pub content_type: String,
    /// File name supplied with the multipart part, if any
    pub file_name: Option<String>,
}

impl AudioBlob {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        Self {
            data: data.into(),
            content_type: if content_type.trim().is_empty() {
                DEFAULT_CONTENT_TYPE.to_string()
            } else {
                content_type
            },
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
