//! Conversion of uploaded recordings into 16 kHz mono 16-bit PCM WAV.

use std::io::Cursor;
use std::time::Duration;

use bytes::Bytes;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, CODEC_TYPE_OPUS, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

use super::{opus_stream, wav};

pub const TARGET_SAMPLE_RATE: u32 = 16_000;
pub const TARGET_CHANNELS: u16 = 1;
pub const TARGET_BITS_PER_SAMPLE: u16 = 16;

const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Errors raised while converting uploaded audio.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Audio payload is empty")]
    Empty,

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("No decodable audio track found")]
    NoAudioTrack,

    #[error("Unsupported audio codec: {0}")]
    UnsupportedCodec(String),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Audio contained no samples")]
    NoSamples,

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("WAV encoding failed: {0}")]
    Encode(#[from] hound::Error),

    #[error("Conversion task failed: {0}")]
    Task(String),
}

/// Canonical WAV payload: mono, 16-bit, 16 000 Hz.
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    wav: Bytes,
    frames: usize,
}

impl NormalizedAudio {
    pub const CONTENT_TYPE: &'static str = "audio/wav; codecs=audio/pcm; samplerate=16000";

    /// The complete WAV file, header included.
    pub fn bytes(&self) -> &Bytes {
        &self.wav
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames as f64 / f64::from(TARGET_SAMPLE_RATE))
    }
}

/// Decode any supported container and re-encode it as canonical WAV.
///
/// CPU bound; callers on the async runtime should use `spawn_blocking`.
pub fn normalize(data: &[u8]) -> Result<NormalizedAudio, ConversionError> {
    if data.is_empty() {
        return Err(ConversionError::Empty);
    }

    let (mono, source_rate) = decode_to_mono(data)?;

    let resampled = if source_rate == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, source_rate, TARGET_SAMPLE_RATE)?
    };

    let samples: Vec<i16> = resampled.iter().map(|&s| quantize(s)).collect();
    let wav = wav::encode_pcm16(&samples, TARGET_SAMPLE_RATE, TARGET_CHANNELS)?;

    debug!(
        source_rate,
        frames = samples.len(),
        bytes = wav.len(),
        "Audio normalized to 16kHz mono PCM"
    );

    Ok(NormalizedAudio {
        wav: Bytes::from(wav),
        frames: samples.len(),
    })
}

fn quantize(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn decode_to_mono(data: &[u8]) -> Result<(Vec<f32>, u32), ConversionError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ConversionError::UnsupportedFormat(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(ConversionError::NoAudioTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    if codec_params.codec == CODEC_TYPE_OPUS {
        let mono = opus_stream::decode_to_mono(format.as_mut(), track_id, &codec_params)?;
        if mono.is_empty() {
            return Err(ConversionError::NoSamples);
        }
        return Ok((mono, opus_stream::DECODE_RATE));
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| ConversionError::UnsupportedCodec(e.to_string()))?;

    let mut sample_rate = codec_params.sample_rate;
    let mut mono: Vec<f32> = Vec::new();

    while let Some(packet) = next_track_packet(format.as_mut(), track_id)? {
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(ConversionError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }
        sample_rate.get_or_insert(spec.rate);

        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(frames as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        downmix_into(&mut mono, buffer.samples(), channels);
    }

    if mono.is_empty() {
        return Err(ConversionError::NoSamples);
    }
    let sample_rate = sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| ConversionError::Decode("unknown sample rate".to_string()))?;

    Ok((mono, sample_rate))
}

/// Next packet belonging to `track_id`, or `None` once the stream ends.
pub(super) fn next_track_packet(
    format: &mut dyn FormatReader,
    track_id: u32,
) -> Result<Option<Packet>, ConversionError> {
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => return Ok(Some(packet)),
            Ok(_) => continue,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            }
            Err(SymphoniaError::ResetRequired) => return Ok(None),
            Err(e) => return Err(ConversionError::Decode(e.to_string())),
        }
    }
}

/// Average interleaved frames down to one channel.
pub(super) fn downmix_into(mono: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        mono.extend_from_slice(interleaved);
    } else {
        mono.extend(
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, ConversionError> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK_FRAMES, 1)
        .map_err(|e| ConversionError::Resample(e.to_string()))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK_FRAMES);

    let mut process = |chunk: &[f32], output: &mut Vec<f32>| -> Result<(), ConversionError> {
        let mut input = chunk.to_vec();
        input.resize(RESAMPLE_CHUNK_FRAMES, 0.0);
        let result = resampler
            .process(&[input], None)
            .map_err(|e| ConversionError::Resample(e.to_string()))?;
        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
        Ok(())
    };

    for chunk in samples.chunks(RESAMPLE_CHUNK_FRAMES) {
        process(chunk, &mut output)?;
    }
    // Flush the filter tail so the delayed output covers the full input.
    while output.len() < expected + delay {
        process(&[], &mut output)?;
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}
