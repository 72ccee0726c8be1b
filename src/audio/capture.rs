use crate::audio::AudioClip;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CaptureError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Switch to voice mode to record")]
    NotInVoiceMode,

    #[error("Stop the recording first")]
    RecordingActive,

    #[error("Nothing recorded yet")]
    NothingRecorded,

    #[error("Playback unavailable: {0}")]
    PlaybackUnavailable(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Buffer the data callback writes into. Once `accepting` is cleared under
/// the lock, no further chunk can land.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    accepting: bool,
    clip: AudioClip,
}

pub type SharedCapture = Arc<Mutex<CaptureBuffer>>;

impl CaptureBuffer {
    pub fn begin(&mut self, sample_rate: u32, channels: u16) {
        self.clip = AudioClip::new(sample_rate, channels);
        self.accepting = true;
    }

    pub fn push(&mut self, data: &[i16]) {
        if self.accepting {
            self.clip.append(data);
        }
    }

    pub fn push_f32(&mut self, data: &[f32]) {
        if self.accepting {
            self.clip.append_f32(data);
        }
    }

    /// Stop accepting chunks and hand back what was captured
    pub fn finish(&mut self) -> AudioClip {
        self.accepting = false;
        std::mem::take(&mut self.clip)
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }
}

/// Audio input device. `start` must register the data callback against
/// `buffer` and call `CaptureBuffer::begin` with the stream format.
pub trait Microphone: Send {
    fn start(&mut self, buffer: SharedCapture) -> Result<(), CaptureError>;

    fn stop(&mut self);

    fn name(&self) -> String;
}

/// Audio output device used to replay a recorded answer
pub trait AudioOutput: Send {
    fn play(&mut self, clip: &AudioClip) -> Result<(), CaptureError>;

    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// Stand-in when the binary is built without the `microphone` feature
pub struct NoMicrophone;

impl Microphone for NoMicrophone {
    fn start(&mut self, _buffer: SharedCapture) -> Result<(), CaptureError> {
        Err(CaptureError::PermissionDenied(
            "no microphone support in this build".to_string(),
        ))
    }

    fn stop(&mut self) {}

    fn name(&self) -> String {
        "none".to_string()
    }
}

pub struct NoSpeaker;

impl AudioOutput for NoSpeaker {
    fn play(&mut self, _clip: &AudioClip) -> Result<(), CaptureError> {
        Err(CaptureError::PlaybackUnavailable(
            "no audio output support in this build".to_string(),
        ))
    }

    fn stop(&mut self) {}

    fn is_playing(&self) -> bool {
        false
    }
}

#[cfg(feature = "microphone")]
pub use self::device::{CpalMicrophone, CpalSpeaker};

#[cfg(feature = "microphone")]
mod device {
    use super::{AudioOutput, CaptureError, Microphone, SharedCapture};
    use crate::audio::AudioClip;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use tracing::{error, info};

    pub struct CpalMicrophone {
        stream: Option<cpal::Stream>,
        selected_input_device: Option<String>,
    }

    impl CpalMicrophone {
        pub fn new(selected_input_device: Option<String>) -> Self {
            Self {
                stream: None,
                selected_input_device: selected_input_device
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
            }
        }

        fn pick_input_device(host: &cpal::Host, preferred_name: Option<&str>) -> Option<cpal::Device> {
            if let Some(name) = preferred_name {
                if let Ok(mut devices) = host.input_devices() {
                    if let Some(device) = devices.find(|d| device_display_name(d) == name) {
                        return Some(device);
                    }
                }
                tracing::warn!(
                    "Preferred input device '{}' not found, falling back to default",
                    name
                );
            }
            let default_device = host.default_input_device()?;

            let default_name = device_display_name(&default_device);
            if !looks_like_loopback(&default_name) {
                return Some(default_device);
            }

            tracing::warn!(
                "Default device '{}' looks like loopback, trying to pick a microphone input",
                default_name
            );

            if let Ok(mut devices) = host.input_devices() {
                if let Some(alternative) =
                    devices.find(|d| !looks_like_loopback(&device_display_name(d)))
                {
                    return Some(alternative);
                }
            }

            Some(default_device)
        }
    }

    impl Microphone for CpalMicrophone {
        fn start(&mut self, buffer: SharedCapture) -> Result<(), CaptureError> {
            let host = cpal::default_host();
            let device = Self::pick_input_device(&host, self.selected_input_device.as_deref())
                .ok_or_else(|| {
                    CaptureError::PermissionDenied("No input device available".to_string())
                })?;

            info!("Input device: {}", device_display_name(&device));

            let config = device
                .default_input_config()
                .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
            if let Ok(mut guard) = buffer.lock() {
                guard.begin(config.sample_rate(), config.channels());
            }

            let sink = buffer.clone();
            let err_fn = |err| error!("an error occurred on input stream: {}", err);

            let stream = match config.sample_format() {
                cpal::SampleFormat::I16 => device.build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &_| {
                        if let Ok(mut guard) = sink.lock() {
                            guard.push(data);
                        }
                    },
                    err_fn,
                    None,
                ),
                cpal::SampleFormat::F32 => device.build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &_| {
                        if let Ok(mut guard) = sink.lock() {
                            guard.push_f32(data);
                        }
                    },
                    err_fn,
                    None,
                ),
                other => {
                    return Err(CaptureError::Stream(format!(
                        "Unsupported sample format {:?}",
                        other
                    )))
                }
            }
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

            stream
                .play()
                .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
            self.stream = Some(stream);
            Ok(())
        }

        fn stop(&mut self) {
            if let Some(stream) = self.stream.take() {
                let _ = stream.pause();
            }
        }

        fn name(&self) -> String {
            self.selected_input_device
                .clone()
                .unwrap_or_else(|| "default".to_string())
        }
    }

    pub struct CpalSpeaker {
        stream: Option<cpal::Stream>,
        playing: Arc<AtomicBool>,
    }

    impl CpalSpeaker {
        pub fn new() -> Self {
            Self {
                stream: None,
                playing: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Default for CpalSpeaker {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioOutput for CpalSpeaker {
        fn play(&mut self, clip: &AudioClip) -> Result<(), CaptureError> {
            self.stop();

            let host = cpal::default_host();
            let device = host.default_output_device().ok_or_else(|| {
                CaptureError::PlaybackUnavailable("No output device available".to_string())
            })?;
            let config = device
                .default_output_config()
                .map_err(|e| CaptureError::PlaybackUnavailable(e.to_string()))?;

            let out_rate = config.sample_rate().max(1);
            let out_channels = config.channels().max(1) as usize;
            let samples = resample_nearest(&clip.mono_f32(), clip.sample_rate, out_rate);

            let playing = self.playing.clone();
            playing.store(true, Ordering::Relaxed);
            let mut position = 0usize;
            let err_fn = |err| error!("an error occurred on output stream: {}", err);

            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => device.build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &_| {
                        for frame in data.chunks_mut(out_channels) {
                            let value = next_sample(&samples, &mut position, &playing);
                            frame.iter_mut().for_each(|s| *s = value);
                        }
                    },
                    err_fn,
                    None,
                ),
                cpal::SampleFormat::I16 => device.build_output_stream(
                    &config.into(),
                    move |data: &mut [i16], _: &_| {
                        for frame in data.chunks_mut(out_channels) {
                            let value = next_sample(&samples, &mut position, &playing);
                            let scaled = (value * i16::MAX as f32) as i16;
                            frame.iter_mut().for_each(|s| *s = scaled);
                        }
                    },
                    err_fn,
                    None,
                ),
                other => {
                    self.playing.store(false, Ordering::Relaxed);
                    return Err(CaptureError::PlaybackUnavailable(format!(
                        "Unsupported sample format {:?}",
                        other
                    )));
                }
            }
            .map_err(|e| CaptureError::PlaybackUnavailable(e.to_string()))?;

            stream
                .play()
                .map_err(|e| CaptureError::PlaybackUnavailable(e.to_string()))?;
            self.stream = Some(stream);
            Ok(())
        }

        fn stop(&mut self) {
            self.stream.take();
            self.playing.store(false, Ordering::Relaxed);
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::Relaxed)
        }
    }

    fn next_sample(samples: &[f32], position: &mut usize, playing: &AtomicBool) -> f32 {
        match samples.get(*position) {
            Some(&value) => {
                *position += 1;
                value
            }
            None => {
                playing.store(false, Ordering::Relaxed);
                0.0
            }
        }
    }

    fn resample_nearest(samples: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
        if src_rate == 0 || src_rate == dst_rate || samples.is_empty() {
            return samples.to_vec();
        }
        let out_len = (samples.len() as u64 * dst_rate as u64 / src_rate as u64) as usize;
        (0..out_len)
            .map(|i| {
                let src = (i as u64 * src_rate as u64 / dst_rate as u64) as usize;
                samples[src.min(samples.len() - 1)]
            })
            .collect()
    }

    fn device_display_name(device: &cpal::Device) -> String {
        device
            .name()
            .or_else(|_| device.description().map(|d| d.name().to_string()))
            .unwrap_or_else(|_| "Unknown input".to_string())
    }

    fn looks_like_loopback(name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        let patterns = [
            "stereo mix",
            "what u hear",
            "wave out",
            "loopback",
            "monitor",
        ];
        patterns.iter().any(|p| lower.contains(p))
    }
}
