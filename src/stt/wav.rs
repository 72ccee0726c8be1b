use super::SttError;
use crate::audio::AudioClip;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Downmix to mono and linearly resample to 16 kHz, then encode as WAV
pub fn to_wav_16k_mono(clip: &AudioClip) -> Result<Vec<u8>, SttError> {
    let mono = clip.mono_f32();
    if mono.is_empty() {
        return Err(SttError::InvalidAudio);
    }

    let src_rate = clip.sample_rate.max(1) as f32;
    let dst_rate = TARGET_SAMPLE_RATE as f32;

    let out_len = ((mono.len() as f32) * dst_rate / src_rate).ceil() as usize;
    if out_len == 0 {
        return Err(SttError::InvalidAudio);
    }

    let ratio = src_rate / dst_rate;
    let mut resampled = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_pos = i as f32 * ratio;
        let idx = src_pos.floor() as usize;
        let frac = src_pos - idx as f32;
        let s0 = *mono.get(idx).unwrap_or(&0.0);
        let s1 = *mono.get(idx + 1).unwrap_or(&s0);
        let sample = (s0 + (s1 - s0) * frac).clamp(-1.0, 1.0);
        resampled.push((sample * i16::MAX as f32) as i16);
    }

    Ok(encode_wav_i16(&resampled, TARGET_SAMPLE_RATE, 1))
}

pub fn encode_wav_i16(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let mut wav = Vec::with_capacity(44 + samples.len() * 2);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    let file_size = (36 + samples.len() * 2) as u32;
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * channels as u32 * 2;
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&(channels * 2).to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    wav.extend_from_slice(b"data");
    let data_size = (samples.len() * 2) as u32;
    wav.extend_from_slice(&data_size.to_le_bytes());

    for &sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_describes_16k_mono_pcm() {
        let mut clip = AudioClip::new(48_000, 2);
        clip.append(&vec![1000i16; 48_000 * 2]);

        let wav = to_wav_16k_mono(&clip).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
            TARGET_SAMPLE_RATE
        );
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
        assert_eq!(data_size, 16_000 * 2);
        assert_eq!(wav.len(), 44 + data_size);
    }

    #[test]
    fn empty_clip_is_invalid() {
        let clip = AudioClip::new(16_000, 1);
        assert_eq!(to_wav_16k_mono(&clip), Err(SttError::InvalidAudio));
    }
}
