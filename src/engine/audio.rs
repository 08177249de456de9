//! Audio output facade: the default cpal stream plus a trivial additive
//! mixer. Entirely optional — when no output device exists the caller just
//! runs without sound.
//!
//! No resampling: clips are mixed at the device rate as-is. Channel
//! adaptation is duplicate-mono / first-channel-downmix only.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::engine::assets::sound::SoundData;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no default audio output device")]
    NoDevice,
    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error(transparent)]
    Build(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    Play(#[from] cpal::PlayStreamError),
}

struct Voice {
    clip: Arc<SoundData>,
    /// Frame cursor into the clip.
    frame: usize,
}

#[derive(Default)]
struct Mixer {
    voices: Vec<Voice>,
}

impl Mixer {
    fn mix(&mut self, output: &mut [f32], output_channels: u16) {
        output.fill(0.0);
        let output_channels = usize::from(output_channels).max(1);

        for voice in &mut self.voices {
            let clip_channels = usize::from(voice.clip.channels).max(1);
            let clip_frames = voice.clip.samples.len() / clip_channels;

            for frame in output.chunks_exact_mut(output_channels) {
                if voice.frame >= clip_frames {
                    break;
                }
                let base = voice.frame * clip_channels;
                for (channel, slot) in frame.iter_mut().enumerate() {
                    let source = base + channel.min(clip_channels - 1);
                    *slot += voice.clip.samples[source];
                }
                voice.frame += 1;
            }
        }

        self.voices.retain(|v| {
            let clip_channels = usize::from(v.clip.channels).max(1);
            v.frame < v.clip.samples.len() / clip_channels
        });
    }
}

pub struct Audio {
    // Dropping the stream stops playback; keep it alive with the facade.
    _stream: cpal::Stream,
    mixer: Arc<Mutex<Mixer>>,
}

impl Audio {
    /// Opens the default output device and starts the mix callback.
    pub fn start() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device.default_output_config()?;
        let channels = config.channels();

        let mixer = Arc::new(Mutex::new(Mixer::default()));
        let callback_mixer = mixer.clone();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if let Ok(mut mixer) = callback_mixer.lock() {
                        mixer.mix(output, channels);
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )?,
            format => return Err(AudioError::UnsupportedFormat(format.to_string())),
        };

        stream.play()?;
        log::info!("audio output started ({channels} channels)");

        Ok(Self {
            _stream: stream,
            mixer,
        })
    }

    /// Queues a clip for playback, mixed on top of whatever is playing.
    pub fn play(&self, clip: Arc<SoundData>) {
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.voices.push(Voice { clip, frame: 0 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(samples: Vec<f32>, channels: u16) -> Arc<SoundData> {
        Arc::new(SoundData {
            samples,
            channels,
            sample_rate: 48_000,
        })
    }

    #[test]
    fn mono_clip_is_duplicated_across_stereo_output() {
        let mut mixer = Mixer::default();
        mixer.voices.push(Voice {
            clip: clip(vec![0.5, -0.5], 1),
            frame: 0,
        });

        let mut output = [1.0f32; 6];
        mixer.mix(&mut output, 2);

        assert_eq!(output, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
        // Finished voices are dropped.
        assert!(mixer.voices.is_empty());
    }

    #[test]
    fn concurrent_voices_are_summed() {
        let mut mixer = Mixer::default();
        mixer.voices.push(Voice {
            clip: clip(vec![0.25, 0.25], 1),
            frame: 0,
        });
        mixer.voices.push(Voice {
            clip: clip(vec![0.5], 1),
            frame: 0,
        });

        let mut output = [0.0f32; 2];
        mixer.mix(&mut output, 1);
        assert_eq!(output, [0.75, 0.25]);
    }

    #[test]
    fn voice_survives_across_callback_buffers() {
        let mut mixer = Mixer::default();
        mixer.voices.push(Voice {
            clip: clip(vec![0.1, 0.2, 0.3], 1),
            frame: 0,
        });

        let mut first = [0.0f32; 2];
        mixer.mix(&mut first, 1);
        assert_eq!(first, [0.1, 0.2]);
        assert_eq!(mixer.voices.len(), 1);

        let mut second = [0.0f32; 2];
        mixer.mix(&mut second, 1);
        assert_eq!(second, [0.3, 0.0]);
        assert!(mixer.voices.is_empty());
    }
}
