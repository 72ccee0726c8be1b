pub mod buffer;
pub mod capture;

pub use buffer::AudioClip;
pub use capture::{AudioOutput, CaptureError, Microphone, NoMicrophone, NoSpeaker, SharedCapture};

#[cfg(feature = "microphone")]
pub use capture::{CpalMicrophone, CpalSpeaker};

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Stopped,
    Recording,
}

/// Finalized clip plus the whole seconds counted while it was recorded
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub clip: AudioClip,
    pub elapsed_secs: u32,
}

#[derive(Debug, Default)]
struct ElapsedTimer {
    running: bool,
    secs: u32,
}

/// Microphone session bookkeeping: the capture stream plus a once-per-second
/// elapsed counter. Needs a tokio runtime for the counter task.
pub struct VoiceRecorder {
    microphone: Box<dyn Microphone>,
    state: RecordingState,
    capture: SharedCapture,
    timer: Arc<Mutex<ElapsedTimer>>,
    ticker: Option<JoinHandle<()>>,
}

impl VoiceRecorder {
    pub fn new(microphone: Box<dyn Microphone>) -> Self {
        Self {
            microphone,
            state: RecordingState::Stopped,
            capture: SharedCapture::default(),
            timer: Arc::new(Mutex::new(ElapsedTimer::default())),
            ticker: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.timer.lock().map(|t| t.secs).unwrap_or(0)
    }

    /// Open the microphone and start the counter. On failure nothing is
    /// started and the recorder stays `Stopped`.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_recording() {
            return Err(CaptureError::AlreadyRecording);
        }

        self.microphone.start(self.capture.clone())?;

        if let Ok(mut timer) = self.timer.lock() {
            timer.secs = 0;
            timer.running = true;
        }
        self.ticker = Some(spawn_ticker(self.timer.clone()));
        self.state = RecordingState::Recording;

        tracing::info!("Recording started on '{}'", self.microphone.name());
        Ok(())
    }

    /// Halt the counter and the capture, then return the clip. After this
    /// returns no tick and no audio chunk is applied.
    pub fn stop(&mut self) -> Result<Recording, CaptureError> {
        if !self.is_recording() {
            return Err(CaptureError::NotRecording);
        }

        let elapsed_secs = {
            let mut timer = self
                .timer
                .lock()
                .map_err(|e| CaptureError::Stream(e.to_string()))?;
            timer.running = false;
            timer.secs
        };
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }

        self.microphone.stop();
        let clip = self
            .capture
            .lock()
            .map_err(|e| CaptureError::Stream(e.to_string()))?
            .finish();
        self.state = RecordingState::Stopped;

        tracing::info!(
            "Recording stopped: {}s counted, {:.1}s of audio",
            elapsed_secs,
            clip.duration_secs()
        );
        Ok(Recording { clip, elapsed_secs })
    }

    /// Stop if recording, dropping the clip
    pub fn cancel(&mut self) {
        if self.is_recording() {
            let _ = self.stop();
        }
    }

    pub fn reset_elapsed(&mut self) {
        if let Ok(mut timer) = self.timer.lock() {
            if !timer.running {
                timer.secs = 0;
            }
        }
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn spawn_ticker(timer: Arc<Mutex<ElapsedTimer>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let Ok(mut guard) = timer.lock() else {
                break;
            };
            if !guard.running {
                break;
            }
            guard.secs += 1;
        }
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{AudioClip, AudioOutput, CaptureError, Microphone, SharedCapture};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    /// Microphone double: records what it was asked and exposes the buffer
    /// so tests can push chunks as if the device produced them.
    #[derive(Clone, Default)]
    pub struct FakeMicrophone {
        pub deny: bool,
        pub buffer: Arc<Mutex<Option<SharedCapture>>>,
        pub open: Arc<AtomicBool>,
    }

    impl FakeMicrophone {
        pub fn denying() -> Self {
            Self {
                deny: true,
                ..Self::default()
            }
        }

        pub fn feed(&self, data: &[i16]) {
            if let Some(shared) = self.buffer.lock().unwrap().as_ref() {
                shared.lock().unwrap().push(data);
            }
        }

        pub fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }
    }

    impl Microphone for FakeMicrophone {
        fn start(&mut self, buffer: SharedCapture) -> Result<(), CaptureError> {
            if self.deny {
                return Err(CaptureError::PermissionDenied("user declined".to_string()));
            }
            buffer.lock().unwrap().begin(16_000, 1);
            *self.buffer.lock().unwrap() = Some(buffer);
            self.open.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.open.store(false, Ordering::SeqCst);
        }

        fn name(&self) -> String {
            "fake".to_string()
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeSpeaker {
        pub playing: Arc<AtomicBool>,
    }

    impl AudioOutput for FakeSpeaker {
        fn play(&mut self, _clip: &AudioClip) -> Result<(), CaptureError> {
            self.playing.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.playing.store(false, Ordering::SeqCst);
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeMicrophone;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counter_ticks_once_per_second_and_halts_on_stop() {
        let mic = FakeMicrophone::default();
        let mut recorder = VoiceRecorder::new(Box::new(mic.clone()));

        recorder.start().unwrap();
        assert!(mic.is_open());
        mic.feed(&[1, 2, 3, 4]);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(recorder.elapsed_secs(), 3);

        let recording = recorder.stop().unwrap();
        assert_eq!(recording.elapsed_secs, 3);
        assert_eq!(recording.clip.samples, vec![1, 2, 3, 4]);
        assert!(!mic.is_open());

        mic.feed(&[9, 9]);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.elapsed_secs(), 3);
        assert_eq!(recorder.state(), RecordingState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_permission_starts_nothing() {
        let mut recorder = VoiceRecorder::new(Box::new(FakeMicrophone::denying()));

        let err = recorder.start().unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied(_)));
        assert_eq!(recorder.state(), RecordingState::Stopped);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(recorder.elapsed_secs(), 0);
    }

    #[tokio::test]
    async fn double_start_and_idle_stop_are_rejected() {
        let mut recorder = VoiceRecorder::new(Box::new(FakeMicrophone::default()));
        assert_eq!(recorder.stop().unwrap_err(), CaptureError::NotRecording);

        recorder.start().unwrap();
        assert_eq!(recorder.start().unwrap_err(), CaptureError::AlreadyRecording);
        recorder.cancel();
        assert!(!recorder.is_recording());
    }
}
