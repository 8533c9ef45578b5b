//! Framing for the Azure Speech synthesis WebSocket.
//!
//! Text frames are `Header:Value` lines, a blank line, then a body. Binary
//! frames start with a big-endian `u16` header length followed by the same
//! header block and the raw audio payload.

use bytes::Bytes;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Word-boundary offsets are reported in 100 ns ticks.
pub const TICKS_PER_MILLISECOND: f64 = 10_000.0;

pub const OUTPUT_FORMAT: &str = "raw-16khz-16bit-mono-pcm";

const HEADER_SEPARATOR: &str = "\r\n\r\n";

/// A frame received from the service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    TurnStart,
    /// Word-boundary offsets (ms) carried by one `audio.metadata` frame.
    WordBoundaries(Vec<f64>),
    Audio(Bytes),
    TurnEnd,
    /// Any other path, e.g. `response`.
    Other(String),
}

#[derive(Debug, Deserialize)]
struct MetadataEnvelope {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Data")]
    data: Option<MetadataData>,
}

#[derive(Debug, Deserialize)]
struct MetadataData {
    #[serde(rename = "Offset")]
    offset: Option<u64>,
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn text_message(path: &str, request_id: &str, content_type: &str, body: &str) -> String {
    format!(
        "X-Timestamp:{}\r\nPath:{path}\r\nX-RequestId:{request_id}\r\nContent-Type:{content_type}{HEADER_SEPARATOR}{body}",
        timestamp()
    )
}

/// `synthesis.context` message enabling word-boundary metadata.
pub fn synthesis_context(request_id: &str) -> String {
    let body = serde_json::json!({
        "synthesis": {
            "audio": {
                "metadataOptions": {
                    "bookmarkEnabled": false,
                    "punctuationBoundaryEnabled": false,
                    "sentenceBoundaryEnabled": false,
                    "wordBoundaryEnabled": true,
                    "visemeEnabled": false,
                    "sessionEndEnabled": true
                },
                "outputFormat": OUTPUT_FORMAT
            },
            "language": {"autoDetection": false}
        }
    });
    text_message(
        "synthesis.context",
        request_id,
        "application/json",
        &body.to_string(),
    )
}

pub fn ssml_message(request_id: &str, ssml: &str) -> String {
    text_message("ssml", request_id, "application/ssml+xml", ssml)
}

fn header_path(headers: &str) -> Option<&str> {
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("path")
            .then(|| value.trim())
    })
}

fn word_boundaries(body: &str) -> Vec<f64> {
    serde_json::from_str::<MetadataEnvelope>(body)
        .map(|envelope| {
            envelope
                .metadata
                .into_iter()
                .filter(|entry| entry.kind == "WordBoundary")
                .filter_map(|entry| entry.data?.offset)
                .map(|ticks| ticks as f64 / TICKS_PER_MILLISECOND)
                .collect()
        })
        .unwrap_or_default()
}

/// Classify a text frame. Returns `None` when no `Path` header is present.
pub fn parse_text_frame(frame: &str) -> Option<ServerFrame> {
    let (headers, body) = frame
        .split_once(HEADER_SEPARATOR)
        .unwrap_or((frame, ""));
    let path = header_path(headers)?;

    Some(match path {
        "turn.start" => ServerFrame::TurnStart,
        "turn.end" => ServerFrame::TurnEnd,
        "audio.metadata" => ServerFrame::WordBoundaries(word_boundaries(body)),
        other => ServerFrame::Other(other.to_string()),
    })
}

/// Classify a binary frame. Returns `None` for truncated frames.
pub fn parse_binary_frame(frame: &Bytes) -> Option<ServerFrame> {
    if frame.len() < 2 {
        return None;
    }
    let header_len = usize::from(u16::from_be_bytes([frame[0], frame[1]]));
    let payload_start = 2 + header_len;
    if frame.len() < payload_start {
        return None;
    }

    let headers = std::str::from_utf8(&frame[2..payload_start]).ok()?;
    match header_path(headers)? {
        "audio" => Some(ServerFrame::Audio(frame.slice(payload_start..))),
        other => Some(ServerFrame::Other(other.to_string())),
    }
}

#[cfg(test)]
pub(crate) fn binary_audio_frame(request_id: &str, pcm: &[u8]) -> Vec<u8> {
    let headers = format!("X-RequestId:{request_id}\r\nContent-Type:audio/x-wav\r\nPath:audio\r\n");
    let mut frame = Vec::with_capacity(2 + headers.len() + pcm.len());
    frame.extend_from_slice(&(headers.len() as u16).to_be_bytes());
    frame.extend_from_slice(headers.as_bytes());
    frame.extend_from_slice(pcm);
    frame
}
