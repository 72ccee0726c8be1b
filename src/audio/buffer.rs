use serde::{Deserialize, Serialize};

/// Interleaved 16-bit PCM captured from the microphone
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let channels = self.channels.max(1) as f32;
        self.samples.len() as f32 / (self.sample_rate as f32 * channels)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn append(&mut self, data: &[i16]) {
        self.samples.extend_from_slice(data);
    }

    /// Frames averaged across channels, scaled to -1.0..=1.0
    pub fn mono_f32(&self) -> Vec<f32> {
        let channels = self.channels.max(1) as usize;
        self.samples
            .chunks(channels)
            .filter(|frame| frame.len() == channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                sum as f32 / channels as f32 / i16::MAX as f32
            })
            .collect()
    }

    pub fn append_f32(&mut self, data: &[f32]) {
        self.samples.extend(
            data.iter()
                .map(|&x| (x.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
        );
    }
}
