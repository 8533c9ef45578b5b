//! RIFF/WAVE packaging for 16-bit PCM.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Basic facts about a WAV payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Number of sample frames (samples per channel)
    pub frames: u32,
}

fn pcm16_spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encode interleaved 16-bit samples into a complete WAV file.
pub fn encode_pcm16(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, pcm16_spec(sample_rate, channels))?;
        let mut i16_writer = writer.get_i16_writer(samples.len() as u32);
        for &sample in samples {
            i16_writer.write_sample(sample);
        }
        i16_writer.flush()?;
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Wrap raw little-endian 16-bit PCM bytes in a WAV container.
///
/// A trailing odd byte is dropped.
pub fn wrap_pcm16le(pcm: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>, hound::Error> {
    let samples: Vec<i16> = pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    encode_pcm16(&samples, sample_rate, channels)
}

/// Read the format header of a WAV payload.
pub fn inspect(wav: &[u8]) -> Result<WavInfo, hound::Error> {
    let reader = WavReader::new(Cursor::new(wav))?;
    let spec = reader.spec();
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}
