use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use crate::audio::decoder::{self, DecodedClip};
use crate::audio::resampler;
use crate::audio::{AudioBackend, SoundHandle};
use crate::error::AudioError;

/// Plays sounds on a cpal output device
pub struct NativeBackend {
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    volume: f32,
}

impl NativeBackend {
    /// Open the named output device, or the host default when `preferred`
    /// is `None` or not found.
    pub fn new(preferred: Option<&str>, volume: f32) -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let named = preferred.and_then(|name| {
            let found = host
                .output_devices()
                .ok()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false));
            if found.is_none() {
                log::warn!("Output device '{}' not found, using default", name);
            }
            found
        });

        let device = match named {
            Some(device) => device,
            None => host
                .default_output_device()
                .ok_or_else(|| AudioError::DeviceUnavailable("No default output device".to_string()))?,
        };

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceUnavailable(format!("Failed to get device config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();

        log::info!(
            "Audio output: {} ({} Hz, {} channels, {:?})",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            volume: volume.clamp(0.0, 1.0),
        })
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn open_stream(&self, samples: Vec<f32>) -> Result<(Stream, Arc<SharedPlayback>), AudioError> {
        let shared = Arc::new(SharedPlayback::new(samples, self.volume));

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&shared)?,
            SampleFormat::I16 => self.build_stream::<i16>(&shared)?,
            SampleFormat::U16 => self.build_stream::<u16>(&shared)?,
            other => {
                return Err(AudioError::UnsupportedFormat {
                    format: format!("device sample format {:?}", other),
                })
            }
        };

        Ok((stream, shared))
    }

    fn build_stream<T>(&self, shared: &Arc<SharedPlayback>) -> Result<Stream, AudioError>
    where
        T: cpal::Sample + cpal::SizedSample + Send + 'static,
        T: cpal::FromSample<f32>,
    {
        let shared = Arc::clone(shared);

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| shared.fill(data),
                move |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamError(format!("Failed to build output stream: {}", e)))
    }
}

impl AudioBackend for NativeBackend {
    type Handle = NativeSound;

    async fn load(&self, path: &Path) -> Result<NativeSound, AudioError> {
        let owned = path.to_path_buf();
        let clip: DecodedClip = tokio::task::spawn_blocking(move || decoder::decode_file(&owned))
            .await
            .map_err(|e| AudioError::DecodeFailed(format!("Decoder task failed: {}", e)))??;

        let channels = self.config.channels as usize;
        let sample_rate = self.config.sample_rate.0;
        let duration = clip.duration();
        let samples = resampler::prepare_clip(&clip, sample_rate, channels);

        let (stream, shared) = self.open_stream(samples)?;
        log::debug!("Loaded {} ({:.2}s)", path.display(), duration.as_secs_f64());

        Ok(NativeSound {
            stream,
            shared,
            duration,
            sample_rate,
            channels,
        })
    }
}

/// State shared between a sound handle and its output callback
struct SharedPlayback {
    samples: Vec<f32>,
    cursor: AtomicUsize,
    playing: AtomicBool,
    volume: AtomicU32,
}

impl SharedPlayback {
    fn new(samples: Vec<f32>, volume: f32) -> Self {
        Self {
            samples,
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            volume: AtomicU32::new(volume.to_bits()),
        }
    }

    fn fill<T>(&self, data: &mut [T])
    where
        T: cpal::Sample + cpal::FromSample<f32>,
    {
        if !self.playing.load(Ordering::Acquire) {
            for sample in data.iter_mut() {
                *sample = cpal::Sample::from_sample(0.0f32);
            }
            return;
        }

        let volume = f32::from_bits(self.volume.load(Ordering::Relaxed));
        let start = self.cursor.load(Ordering::Acquire).min(self.samples.len());
        let available = &self.samples[start..];

        for (i, sample) in data.iter_mut().enumerate() {
            let value = available.get(i).map_or(0.0, |s| s * volume);
            *sample = cpal::Sample::from_sample(value);
        }

        self.advance(start, start + data.len().min(available.len()));
    }

    /// Move the cursor from `from` to `to` unless a seek moved it meanwhile.
    /// Returns false when the seek won.
    fn advance(&self, from: usize, to: usize) -> bool {
        self.cursor
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_finished(&self) -> bool {
        self.cursor.load(Ordering::Acquire) >= self.samples.len()
    }
}

/// A decoded sound bound to its own output stream
pub struct NativeSound {
    stream: Stream,
    shared: Arc<SharedPlayback>,
    duration: Duration,
    sample_rate: u32,
    channels: usize,
}

impl NativeSound {
    pub fn set_volume(&self, volume: f32) {
        self.shared
            .volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

impl SoundHandle for NativeSound {
    fn play(&mut self) -> Result<(), AudioError> {
        self.shared.playing.store(true, Ordering::Release);
        self.stream
            .play()
            .map_err(|e| AudioError::StreamError(format!("Failed to start stream: {}", e)))
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.shared.playing.store(false, Ordering::Release);
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamError(format!("Failed to pause stream: {}", e)))
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.pause()?;
        self.shared.cursor.store(0, Ordering::Release);
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), AudioError> {
        self.shared.cursor.store(0, Ordering::Release);
        Ok(())
    }

    fn position(&self) -> Duration {
        if self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.shared.cursor.load(Ordering::Acquire) / self.channels;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64).min(self.duration)
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn is_finished(&self) -> bool {
        self.shared.is_finished()
    }
}
