//! Audio clip decoding: WAV via `hound`, Ogg/Vorbis via `symphonia`.
//!
//! Everything decodes to interleaved `f32` so the mixer has a single format
//! to deal with.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Decoded clip: interleaved samples, `channels` per frame.
#[derive(Debug, Clone)]
pub struct SoundData {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("unsupported audio extension on {0} (expected .wav or .ogg)")]
    UnsupportedExtension(String),
    #[error("wav decode failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("ogg decode failed: {0}")]
    Ogg(#[from] symphonia::core::errors::Error),
    #[error("audio stream has no decodable track")]
    NoTrack,
}

/// Loads and decodes a clip, dispatching on the file extension.
pub fn load_clip(path: &Path) -> Result<SoundData, SoundError> {
    let decode: fn(&[u8]) -> Result<SoundData, SoundError> =
        match path.extension().and_then(|e| e.to_str()) {
            Some("wav") => decode_wav,
            Some("ogg") => decode_ogg,
            _ => return Err(SoundError::UnsupportedExtension(path.display().to_string())),
        };

    let bytes = fs::read(path).map_err(|source| SoundError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode(&bytes)
}

fn decode_wav(bytes: &[u8]) -> Result<SoundData, SoundError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect()
        }
    };

    Ok(SoundData {
        samples: samples?,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

fn decode_ogg(bytes: &[u8]) -> Result<SoundData, SoundError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("ogg");
    let fmt_opts: FormatOptions = Default::default();
    let meta_opts: MetadataOptions = Default::default();
    let probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;
    let mut format = probed.format;

    let track = format.default_track().ok_or(SoundError::NoTrack)?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or(SoundError::NoTrack)?;
    let channels = track.codec_params.channels.ok_or(SoundError::NoTrack)?;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::<f32>::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream.
            Err(symphonia::core::errors::Error::IoError(_)) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            // A bad packet is not fatal for playback.
            Err(e) => log::warn!("audio decode error (skipping packet): {e}"),
        }
    }

    Ok(SoundData {
        samples,
        channels: channels.count() as u16,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_16_bit_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            for s in [0i16, 8192, -8192, 16384] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let clip = decode_wav(bytes.get_ref()).unwrap();
        assert_eq!(clip.channels, 1);
        assert_eq!(clip.sample_rate, 44_100);
        assert_eq!(clip.samples.len(), 4);
        assert!((clip.samples[1] - 0.25).abs() < 1e-4);
        assert!((clip.samples[2] + 0.25).abs() < 1e-4);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_clip(Path::new("clip.mp3")).unwrap_err();
        assert!(matches!(err, SoundError::UnsupportedExtension(_)));
    }
}
