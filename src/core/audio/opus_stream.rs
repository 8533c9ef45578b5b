//! Opus tracks in Ogg and WebM containers.
//!
//! Browser `MediaRecorder` uploads are Opus. symphonia demuxes both
//! containers but has no Opus decoder, so the packets go to libopus here.

use opus::{Channels, Decoder};
use symphonia::core::codecs::CodecParameters;
use symphonia::core::formats::FormatReader;
use tracing::{debug, warn};

use super::normalizer::{ConversionError, TARGET_SAMPLE_RATE, downmix_into, next_track_packet};

const OPUS_HEAD: &[u8] = b"OpusHead";
const OPUS_TAGS: &[u8] = b"OpusTags";

/// Pre-skip is counted at 48 kHz whatever the decode rate.
const OPUS_CLOCK_RATE: u64 = 48_000;

/// libopus resamples internally, so decode straight to the target rate.
pub(super) const DECODE_RATE: u32 = TARGET_SAMPLE_RATE;

/// Samples per channel in the longest Opus packet (120 ms).
const MAX_PACKET_FRAMES: usize = DECODE_RATE as usize * 120 / 1000;

/// The parts of the `OpusHead` identification header the decoder needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpusHead {
    channels: u8,
    pre_skip: u16,
}

impl OpusHead {
    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 19 || !data.starts_with(OPUS_HEAD) {
            return None;
        }
        Some(Self {
            channels: data[9],
            pre_skip: u16::from_le_bytes([data[10], data[11]]),
        })
    }
}

/// Decode every packet of `track_id` to mono f32 at [`DECODE_RATE`].
pub(super) fn decode_to_mono(
    format: &mut dyn FormatReader,
    track_id: u32,
    params: &CodecParameters,
) -> Result<Vec<f32>, ConversionError> {
    let head = params.extra_data.as_deref().and_then(OpusHead::parse);

    let channel_count = head
        .map(|head| usize::from(head.channels))
        .or_else(|| params.channels.map(|channels| channels.count()))
        .unwrap_or(1);
    let channels = match channel_count {
        1 => Channels::Mono,
        2 => Channels::Stereo,
        n => {
            return Err(ConversionError::UnsupportedCodec(format!(
                "opus with {n} channels"
            )));
        }
    };
    let pre_skip = head
        .map(|head| u32::from(head.pre_skip))
        .or(params.delay)
        .unwrap_or(0);

    let mut decoder =
        Decoder::new(DECODE_RATE, channels).map_err(|e| ConversionError::Decode(e.to_string()))?;
    let mut pcm = vec![0.0f32; MAX_PACKET_FRAMES * channel_count];
    let mut mono = Vec::new();

    while let Some(packet) = next_track_packet(format, track_id)? {
        let data = packet.buf();
        if data.is_empty() || data.starts_with(OPUS_HEAD) || data.starts_with(OPUS_TAGS) {
            continue;
        }
        match decoder.decode_float(data, &mut pcm, false) {
            Ok(frames) => downmix_into(&mut mono, &pcm[..frames * channel_count], channel_count),
            Err(e) => warn!(error = %e, "Skipping corrupt Opus packet"),
        }
    }

    let skip = (u64::from(pre_skip) * u64::from(DECODE_RATE) / OPUS_CLOCK_RATE) as usize;
    mono.drain(..skip.min(mono.len()));

    debug!(
        channels = channel_count,
        pre_skip,
        frames = mono.len(),
        "Opus track decoded"
    );
    Ok(mono)
}
