use std::sync::Arc;

use crate::api::Question;
use crate::audio::{AudioOutput, CaptureError, Microphone, Recording, RecordingState, VoiceRecorder};
use crate::stt::{
    self, CapabilityProbe, SpeechCapability, Transcriber, Transcript, UNAVAILABLE_PLACEHOLDER,
};

use super::{AnswerSubmission, InputMode, PracticeError};

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionOutcome {
    Transcribed(Transcript),
    /// Neither path produced text; the clip is kept and the user types instead
    Unavailable,
}

/// Collects one answer, typed or spoken. Local state survives submission and
/// is only cleared by a mode switch, `clear` or `shutdown`.
pub struct AnswerCapture {
    mode: InputMode,
    draft: String,
    placeholder: Option<&'static str>,
    recorder: VoiceRecorder,
    recording: Option<Recording>,
    output: Box<dyn AudioOutput>,
    probe: CapabilityProbe,
    capability: Option<SpeechCapability>,
    server: Option<Arc<dyn Transcriber>>,
}

impl AnswerCapture {
    pub fn new(
        microphone: Box<dyn Microphone>,
        output: Box<dyn AudioOutput>,
        probe: CapabilityProbe,
        server: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        Self {
            mode: InputMode::Text,
            draft: String::new(),
            placeholder: None,
            recorder: VoiceRecorder::new(microphone),
            recording: None,
            output,
            probe,
            capability: None,
            server,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Shown in place of the draft while it is empty
    pub fn placeholder(&self) -> Option<&'static str> {
        self.placeholder
    }

    pub fn recording_state(&self) -> RecordingState {
        self.recorder.state()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.recorder.elapsed_secs()
    }

    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }

    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.output.is_playing()
    }

    /// Capability probed for the current voice session, if any
    pub fn capability(&self) -> Option<&SpeechCapability> {
        self.capability.as_ref()
    }

    /// Switch input mode. Refused while recording; otherwise discards draft,
    /// clip, placeholder and elapsed time and stops playback.
    pub fn set_mode(&mut self, mode: InputMode) -> Result<(), CaptureError> {
        if self.recorder.is_recording() {
            return Err(CaptureError::RecordingActive);
        }
        if mode == self.mode {
            return Ok(());
        }

        self.discard_answer();
        self.mode = mode;
        self.capability = match mode {
            InputMode::Voice => {
                let capability = (self.probe)();
                tracing::info!("Voice session started, speech capability: {:?}", capability);
                Some(capability)
            }
            InputMode::Text => None,
        };
        Ok(())
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
        if !self.draft.trim().is_empty() {
            self.placeholder = None;
        }
    }

    pub fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.mode != InputMode::Voice {
            return Err(CaptureError::NotInVoiceMode);
        }
        self.output.stop();

        if let Err(e) = self.recorder.start() {
            tracing::warn!("Could not start recording: {}", e);
            return Err(e);
        }

        self.recording = None;
        self.draft.clear();
        self.placeholder = None;
        Ok(())
    }

    /// Halt capture and counter, keep the clip, then transcribe it. A failed
    /// transcription is not an error: the draft stays empty with a placeholder.
    pub async fn stop_recording(&mut self) -> Result<TranscriptionOutcome, CaptureError> {
        let recording = self.recorder.stop()?;
        let capability = self
            .capability
            .get_or_insert_with(|| (self.probe)())
            .clone();

        let result =
            stt::transcribe_with_fallback(&capability, self.server.as_ref(), &recording.clip).await;
        self.recording = Some(recording);

        match result {
            Ok(transcript) => {
                self.draft = transcript.text.clone();
                self.placeholder = None;
                Ok(TranscriptionOutcome::Transcribed(transcript))
            }
            Err(e) => {
                tracing::warn!("Transcription unavailable: {}", e);
                self.draft.clear();
                self.placeholder = Some(UNAVAILABLE_PLACEHOLDER);
                Ok(TranscriptionOutcome::Unavailable)
            }
        }
    }

    pub fn play(&mut self) -> Result<(), CaptureError> {
        if self.recorder.is_recording() {
            return Err(CaptureError::RecordingActive);
        }
        let recording = self.recording.as_ref().ok_or(CaptureError::NothingRecorded)?;
        self.output.play(&recording.clip)
    }

    pub fn stop_playback(&mut self) {
        self.output.stop();
    }

    /// Drop draft, clip and elapsed time. Stops an active recording first.
    pub fn clear(&mut self) {
        self.recorder.cancel();
        self.discard_answer();
    }

    /// Build the submission for `question`. Local state is left as is.
    pub fn submission(&self, question: &Question) -> Result<AnswerSubmission, PracticeError> {
        if self.recorder.is_recording() {
            return Err(CaptureError::RecordingActive.into());
        }
        let answer_text = self.draft.trim();
        if answer_text.is_empty() {
            return Err(PracticeError::EmptyAnswer);
        }

        let recording_duration_secs = match (self.mode, &self.recording) {
            (InputMode::Voice, Some(recording)) => recording.elapsed_secs,
            _ => 0,
        };

        Ok(AnswerSubmission {
            question: question.question.clone(),
            answer_text: answer_text.to_string(),
            input_mode: self.mode,
            recording_duration_secs,
        })
    }

    /// Stop any recording and playback and forget the answer
    pub fn shutdown(&mut self) {
        self.clear();
    }

    fn discard_answer(&mut self) {
        self.output.stop();
        self.draft.clear();
        self.placeholder = None;
        self.recording = None;
        self.recorder.reset_elapsed();
    }
}

/// `m:ss`
pub fn format_elapsed(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
