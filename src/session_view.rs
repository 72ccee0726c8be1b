// src/session_view.rs
// One interview-prep session: question list, practice flow, explanations

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, TimeZone};
use thiserror::Error;

use crate::api::{
    AppendError, ApiError, EvaluationRequest, Explanation, FeedbackResult, GenerationRequest,
    Question, Session, SessionDataClient,
};
use crate::audio::CaptureError;
use crate::config::AppConfig;
use crate::explanation::{ExplanationDrawer, ExplanationTicket};
use crate::notify::Notifications;
use crate::practice::{
    AnswerCapture, FeedbackRenderer, FeedbackView, InputMode, PracticeController, PracticeError,
    SubmissionOutcome, SubmissionTicket, TranscriptionOutcome,
};

const FALLBACK_ERROR: &str = "Something went wrong. Please try again.";
const QUESTIONS_ADDED: &str = "Added More Q&A !!";
const EVALUATION_DONE: &str = "AI evaluation completed!";
const EVALUATION_FAILED: &str = "Failed to get AI feedback. Please try again.";

#[derive(Debug, Error)]
pub enum LoadMoreError {
    #[error("Session not loaded")]
    NotLoaded,

    #[error("Already loading more questions")]
    InProgress,

    #[error(transparent)]
    Append(#[from] AppendError),

    #[error("refresh stage failed: {0}")]
    Refresh(#[source] ApiError),
}

#[derive(Debug, Error)]
pub enum PinError {
    #[error(transparent)]
    Toggle(ApiError),

    /// The flag changed on the server but the list could not be reloaded
    #[error("refresh stage failed: {source}")]
    Refresh {
        pinned: bool,
        #[source]
        source: ApiError,
    },
}

/// Summary shown above the question list
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHeader {
    pub role: String,
    pub experience: String,
    pub topics_to_focus: String,
    /// Question count, `-` when the session has none
    pub questions: String,
    pub description: String,
    /// `Do MMM YYYY`, empty when unknown
    pub last_updated: String,
}

impl SessionHeader {
    pub fn from_session(session: &Session) -> Self {
        Self {
            role: session.role.clone(),
            experience: session.experience.clone(),
            topics_to_focus: session.topics_to_focus.clone(),
            questions: match session.questions.len() {
                0 => "-".to_string(),
                n => n.to_string(),
            },
            description: session.description.clone(),
            last_updated: session
                .updated_at
                .map(|at| format_ordinal_date(&at.with_timezone(&Local)))
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for SessionHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.role)?;
        writeln!(f, "{}", self.topics_to_focus)?;
        write!(
            f,
            "Experience: {} | {} Q&A",
            self.experience, self.questions
        )?;
        if !self.last_updated.is_empty() {
            write!(f, " | Last Updated: {}", self.last_updated)?;
        }
        if !self.description.trim().is_empty() {
            write!(f, "\n{}", self.description.trim())?;
        }
        Ok(())
    }
}

/// `3rd Mar 2025`
pub fn format_ordinal_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let day = at.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{} {}", day, suffix, at.format("%b %Y"))
}

/// Evaluation started by `begin_evaluation`, to be run by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvaluation {
    pub ticket: SubmissionTicket,
    pub request: EvaluationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingExplanation {
    pub ticket: ExplanationTicket,
    pub question: String,
}

pub struct SessionView {
    session_id: String,
    client: Arc<dyn SessionDataClient>,
    session: Option<Session>,
    practice: PracticeController,
    capture: AnswerCapture,
    drawer: ExplanationDrawer,
    renderer: FeedbackRenderer,
    notifications: Notifications,
    questions_per_batch: u32,
    loading_more: bool,
}

impl SessionView {
    pub fn new(
        session_id: &str,
        client: Arc<dyn SessionDataClient>,
        capture: AnswerCapture,
        config: &AppConfig,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            client,
            session: None,
            practice: PracticeController::new(),
            capture,
            drawer: ExplanationDrawer::new(),
            renderer: FeedbackRenderer::new(config.score_bands),
            notifications: Notifications::default(),
            questions_per_batch: config.questions_per_batch,
            loading_more: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn client(&self) -> Arc<dyn SessionDataClient> {
        self.client.clone()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        self.session
            .as_ref()
            .map(|s| s.questions.as_slice())
            .unwrap_or_default()
    }

    pub fn header(&self) -> Option<SessionHeader> {
        self.session.as_ref().map(SessionHeader::from_session)
    }

    pub fn practice(&self) -> &PracticeController {
        &self.practice
    }

    pub fn capture(&self) -> &AnswerCapture {
        &self.capture
    }

    pub fn drawer(&self) -> &ExplanationDrawer {
        &self.drawer
    }

    pub fn notifications(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    // ---- session data ----

    pub async fn load(&mut self) -> Result<(), ApiError> {
        match self.client.fetch_session(&self.session_id).await {
            Ok(session) => {
                tracing::info!(
                    "Session {} loaded with {} questions",
                    session.id,
                    session.questions.len()
                );
                self.practice.reconcile(&session);
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                self.notifications.error(surface(&e));
                Err(e)
            }
        }
    }

    /// Flip the pin flag, then refetch so the list reflects the server
    pub async fn toggle_pin(&mut self, question_id: &str) -> Result<bool, PinError> {
        let pinned = match self.client.toggle_pin(question_id).await {
            Ok(pinned) => pinned,
            Err(e) => {
                self.notifications.error(surface(&e));
                return Err(PinError::Toggle(e));
            }
        };
        tracing::info!("Question {} pinned={}", question_id, pinned);
        if let Err(source) = self.load().await {
            tracing::error!("Pin refresh failed: {}", source);
            return Err(PinError::Refresh { pinned, source });
        }
        Ok(pinned)
    }

    /// Generate → Append → Refresh. Refused while a previous run is pending;
    /// on failure the question list is left as it was.
    pub async fn load_more(&mut self) -> Result<usize, LoadMoreError> {
        if self.loading_more {
            tracing::debug!("Load more ignored: already in progress");
            return Err(LoadMoreError::InProgress);
        }
        let request = match &self.session {
            Some(session) => GenerationRequest::for_session(session, self.questions_per_batch),
            None => return Err(LoadMoreError::NotLoaded),
        };

        self.loading_more = true;
        let result = self.run_load_more(&request).await;
        self.loading_more = false;

        match &result {
            Ok(added) => {
                tracing::info!("Appended {} questions to {}", added, self.session_id);
                self.notifications.success(QUESTIONS_ADDED);
            }
            Err(LoadMoreError::Append(e)) => {
                tracing::error!("Load more failed: {}", e);
                self.notifications.error(surface(&e.source));
            }
            Err(LoadMoreError::Refresh(e)) => {
                tracing::error!("Load more refresh failed: {}", e);
                self.notifications.error(surface(e));
            }
            Err(_) => {}
        }
        result
    }

    async fn run_load_more(&mut self, request: &GenerationRequest) -> Result<usize, LoadMoreError> {
        let added = self.client.append_generated_questions(request).await?;
        let session = self
            .client
            .fetch_session(&self.session_id)
            .await
            .map_err(LoadMoreError::Refresh)?;
        self.practice.reconcile(&session);
        self.session = Some(session);
        Ok(added.len())
    }

    // ---- practice ----

    pub fn enable_practice(&mut self) {
        self.practice.enable();
    }

    /// Leave practice mode, stopping any recording or playback
    pub fn exit_practice(&mut self) {
        self.capture.shutdown();
        self.practice.exit();
    }

    pub fn select_question(&mut self, question_id: &str) -> Result<(), PracticeError> {
        let Some(session) = &self.session else {
            return Err(PracticeError::UnknownQuestion(question_id.to_string()));
        };
        match self.practice.select(session, question_id) {
            Ok(_) => {
                self.capture.clear();
                Ok(())
            }
            Err(e) => {
                self.notifications.error(e.to_string());
                Err(e)
            }
        }
    }

    pub fn try_another(&mut self) -> Result<(), PracticeError> {
        self.practice.try_another()?;
        self.capture.clear();
        Ok(())
    }

    pub fn practice_again(&mut self) -> Result<(), PracticeError> {
        self.practice.practice_again()
    }

    pub fn set_input_mode(&mut self, mode: InputMode) -> Result<(), CaptureError> {
        self.capture
            .set_mode(mode)
            .inspect_err(|e| self.notifications.warning(e.to_string()))
    }

    pub fn set_draft(&mut self, text: &str) {
        self.capture.set_draft(text);
    }

    pub fn start_recording(&mut self) -> Result<(), CaptureError> {
        self.capture
            .start_recording()
            .inspect_err(|e| self.notifications.error(e.to_string()))
    }

    pub async fn stop_recording(&mut self) -> Result<TranscriptionOutcome, CaptureError> {
        let outcome = self.capture.stop_recording().await;
        match &outcome {
            Ok(TranscriptionOutcome::Unavailable) => self
                .notifications
                .warning(crate::stt::UNAVAILABLE_PLACEHOLDER),
            Err(e) => self.notifications.error(e.to_string()),
            Ok(TranscriptionOutcome::Transcribed(_)) => {}
        }
        outcome
    }

    pub fn play_recording(&mut self) -> Result<(), CaptureError> {
        self.capture
            .play()
            .inspect_err(|e| self.notifications.warning(e.to_string()))
    }

    pub fn stop_playback(&mut self) {
        self.capture.stop_playback();
    }

    pub fn clear_answer(&mut self) {
        self.capture.clear();
    }

    /// Validate the captured answer and mark the attempt as submitting.
    /// `Ok(None)` when an evaluation for this attempt is already pending.
    pub fn begin_evaluation(&mut self) -> Result<Option<PendingEvaluation>, PracticeError> {
        let result = self.prepare_evaluation();
        if let Err(e) = &result {
            self.notifications.error(e.to_string());
        }
        result
    }

    fn prepare_evaluation(&mut self) -> Result<Option<PendingEvaluation>, PracticeError> {
        if self.practice.is_submitting() {
            tracing::debug!("Evaluation already pending");
            return Ok(None);
        }
        let question = self
            .practice
            .current_question()
            .cloned()
            .ok_or(PracticeError::NoQuestionSelected)?;
        let submission = self.capture.submission(&question)?;
        Ok(self
            .practice
            .begin_submission(submission)?
            .map(|(ticket, request)| PendingEvaluation { ticket, request }))
    }

    pub fn finish_evaluation(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<FeedbackResult, ApiError>,
    ) -> SubmissionOutcome {
        let outcome = self.practice.complete_submission(ticket, result);
        match &outcome {
            SubmissionOutcome::Reviewed => self.notifications.success(EVALUATION_DONE),
            SubmissionOutcome::Failed(_) => self.notifications.error(EVALUATION_FAILED),
            SubmissionOutcome::Stale => {}
        }
        outcome
    }

    /// Begin, evaluate and apply in one call
    pub async fn submit_answer(&mut self) -> Result<Option<SubmissionOutcome>, PracticeError> {
        let Some(pending) = self.begin_evaluation()? else {
            return Ok(None);
        };
        let result = self.client.evaluate_answer(&pending.request).await;
        Ok(Some(self.finish_evaluation(pending.ticket, result)))
    }

    pub fn feedback_view(&self) -> Option<FeedbackView> {
        self.practice
            .feedback()
            .map(|(attempt, feedback)| self.renderer.render(attempt, feedback))
    }

    // ---- explanations ----

    pub fn begin_explanation(&mut self, question_id: &str) -> Option<PendingExplanation> {
        let Some(question) = self
            .session
            .as_ref()
            .and_then(|s| s.question(question_id))
            .map(|q| q.question.clone())
        else {
            self.notifications
                .error(format!("Question {} is not part of this session", question_id));
            return None;
        };

        let ticket = self.drawer.open(&question);
        Some(PendingExplanation { ticket, question })
    }

    pub fn finish_explanation(
        &mut self,
        ticket: ExplanationTicket,
        result: Result<Explanation, ApiError>,
    ) -> bool {
        self.drawer.finish(ticket, result)
    }

    pub fn close_explanation(&mut self) {
        self.drawer.close();
    }

    pub async fn explain(&mut self, question_id: &str) -> bool {
        let Some(pending) = self.begin_explanation(question_id) else {
            return false;
        };
        let result = self.client.fetch_explanation(&pending.question).await;
        self.finish_explanation(pending.ticket, result)
    }
}

/// Text shown to the user for a backend failure; server messages pass through
fn surface(err: &ApiError) -> String {
    match err {
        ApiError::GenerationError(message)
        | ApiError::EvaluationError(message)
        | ApiError::NotFound(message)
            if !message.trim().is_empty() =>
        {
            message.clone()
        }
        ApiError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
        _ => FALLBACK_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{closures_session, FakeBackend};
    use crate::api::AppendStage;
    use crate::audio::testing::{FakeMicrophone, FakeSpeaker};
    use crate::audio::NoMicrophone;
    use crate::explanation::DrawerState;
    use crate::notify::Level;
    use crate::practice::PracticePhase;
    use crate::stt::{CapabilityProbe, SpeechCapability};
    use chrono::Utc;

    fn unavailable_probe() -> CapabilityProbe {
        Arc::new(|| SpeechCapability::Unavailable)
    }

    fn view_with(backend: Arc<FakeBackend>) -> SessionView {
        let capture = AnswerCapture::new(
            Box::new(NoMicrophone),
            Box::new(FakeSpeaker::default()),
            unavailable_probe(),
            None,
        );
        SessionView::new("s1", backend, capture, &AppConfig::default())
    }

    async fn loaded_view() -> (SessionView, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::with_session(closures_session()));
        let mut view = view_with(backend.clone());
        view.load().await.unwrap();
        (view, backend)
    }

    fn score(value: f64) -> FeedbackResult {
        FeedbackResult {
            overall_score: Some(value),
            ..FeedbackResult::default()
        }
    }

    #[test]
    fn ordinal_dates() {
        let at = |d| Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap();
        assert_eq!(format_ordinal_date(&at(1)), "1st Mar 2025");
        assert_eq!(format_ordinal_date(&at(3)), "3rd Mar 2025");
        assert_eq!(format_ordinal_date(&at(11)), "11th Mar 2025");
        assert_eq!(format_ordinal_date(&at(22)), "22nd Mar 2025");
        assert_eq!(format_ordinal_date(&at(13)), "13th Mar 2025");
    }

    #[tokio::test]
    async fn header_summarizes_session() {
        let (view, _) = loaded_view().await;
        let header = view.header().unwrap();
        assert_eq!(header.role, "Frontend Developer");
        assert_eq!(header.questions, "1");
        assert_eq!(header.last_updated, "");
        assert!(header.to_string().contains("Experience: 2 | 1 Q&A"));
    }

    #[tokio::test]
    async fn missing_session_notifies() {
        let backend = Arc::new(FakeBackend::default());
        let mut view = view_with(backend);
        let err = view.load().await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(view.session().is_none());
        assert_eq!(view.notifications().latest().unwrap().level, Level::Error);
    }

    #[tokio::test]
    async fn load_more_appends_batch_then_refreshes() {
        let (mut view, _) = loaded_view().await;
        let before = view.questions().len();

        let added = view.load_more().await.unwrap();
        assert_eq!(added, 10);
        assert_eq!(view.questions().len(), before + 10);
        assert_eq!(view.questions()[0].id, "q1");
        assert!(!view.is_loading_more());
        assert_eq!(
            view.notifications().latest().unwrap().message,
            "Added More Q&A !!"
        );
    }

    #[tokio::test]
    async fn failed_generation_leaves_list_untouched() {
        let (mut view, backend) = loaded_view().await;
        *backend.generated.lock().unwrap() = Some(Ok(Vec::new()));

        let err = view.load_more().await.unwrap_err();
        match err {
            LoadMoreError::Append(e) => assert_eq!(e.stage, AppendStage::Generate),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(view.questions().len(), 1);
        assert!(!view.is_loading_more());

        *backend.generated.lock().unwrap() =
            Some(Err(ApiError::GenerationError("Quota exceeded".to_string())));
        view.load_more().await.unwrap_err();
        assert_eq!(view.notifications().latest().unwrap().message, "Quota exceeded");
    }

    #[tokio::test]
    async fn pin_toggle_twice_restores_flag() {
        let (mut view, _) = loaded_view().await;

        assert!(view.toggle_pin("q1").await.unwrap());
        assert!(view.questions()[0].is_pinned);

        assert!(!view.toggle_pin("q1").await.unwrap());
        assert!(!view.questions()[0].is_pinned);
    }

    #[tokio::test]
    async fn pinned_question_unpins() {
        let mut session = closures_session();
        session.questions[0].is_pinned = true;
        let backend = Arc::new(FakeBackend::with_session(session));
        let mut view = view_with(backend);
        view.load().await.unwrap();

        assert!(!view.toggle_pin("q1").await.unwrap());
        assert!(!view.questions()[0].is_pinned);
    }

    #[tokio::test]
    async fn pin_survives_failed_refetch() {
        let (mut view, backend) = loaded_view().await;
        *backend.fetch_failure.lock().unwrap() =
            Some(ApiError::NetworkError("connection reset".to_string()));

        let err = view.toggle_pin("q1").await.unwrap_err();
        assert!(matches!(err, PinError::Refresh { pinned: true, .. }));
        assert!(!view.questions()[0].is_pinned);
        assert!(!view.notifications().is_empty());

        *backend.fetch_failure.lock().unwrap() = None;
        view.load().await.unwrap();
        assert!(view.questions()[0].is_pinned);
    }

    #[tokio::test]
    async fn empty_answer_never_reaches_evaluator() {
        let (mut view, backend) = loaded_view().await;
        view.enable_practice();
        view.select_question("q1").unwrap();
        view.set_draft("   ");

        assert_eq!(view.submit_answer().await, Err(PracticeError::EmptyAnswer));
        assert_eq!(backend.evaluate_call_count(), 0);
        assert_eq!(view.practice().phase(), PracticePhase::Answering);
    }

    #[tokio::test]
    async fn evaluated_answer_shows_feedback() {
        let (mut view, backend) = loaded_view().await;
        backend.set_feedback(Ok(score(72.0)));
        view.enable_practice();
        view.select_question("q1").unwrap();
        view.set_draft("A closure captures variables.");

        let outcome = view.submit_answer().await.unwrap();
        assert_eq!(outcome, Some(SubmissionOutcome::Reviewed));
        assert_eq!(view.practice().phase(), PracticePhase::Reviewing);

        let calls = backend.evaluate_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].question, "Explain closures");
        assert_eq!(calls[0].input_mode, InputMode::Text);

        let view_model = view.feedback_view().unwrap();
        assert_eq!(view_model.overall.unwrap().label, "72/100");
        assert_eq!(
            view.notifications().latest().unwrap().message,
            "AI evaluation completed!"
        );
    }

    #[tokio::test]
    async fn duplicate_submission_is_a_noop() {
        let (mut view, backend) = loaded_view().await;
        view.select_question("q1").unwrap();
        view.set_draft("first answer");

        let pending = view.begin_evaluation().unwrap().unwrap();
        assert_eq!(view.begin_evaluation(), Ok(None));
        assert_eq!(view.submit_answer().await, Ok(None));
        assert_eq!(backend.evaluate_call_count(), 0);

        view.finish_evaluation(pending.ticket, Ok(score(50.0)));
        assert_eq!(view.practice().phase(), PracticePhase::Reviewing);
    }

    #[tokio::test]
    async fn evaluation_failure_stays_answering() {
        let (mut view, backend) = loaded_view().await;
        backend.set_feedback(Err(ApiError::EvaluationError("model down".to_string())));
        view.select_question("q1").unwrap();
        view.set_draft("answer");

        let outcome = view.submit_answer().await.unwrap();
        assert!(matches!(outcome, Some(SubmissionOutcome::Failed(_))));
        assert_eq!(view.practice().phase(), PracticePhase::Answering);
        assert!(!view.practice().is_submitting());
        assert_eq!(view.capture().draft(), "answer");
        assert_eq!(
            view.notifications().latest().unwrap().message,
            "Failed to get AI feedback. Please try again."
        );
    }

    #[tokio::test]
    async fn late_evaluation_after_exit_is_dropped() {
        let (mut view, _) = loaded_view().await;
        view.select_question("q1").unwrap();
        view.set_draft("answer");
        let pending = view.begin_evaluation().unwrap().unwrap();

        view.exit_practice();
        assert_eq!(
            view.finish_evaluation(pending.ticket, Ok(score(99.0))),
            SubmissionOutcome::Stale
        );
        assert_eq!(view.practice().phase(), PracticePhase::Idle);
        assert!(view.feedback_view().is_none());
    }

    #[tokio::test]
    async fn selecting_another_question_clears_answer() {
        let (mut view, _) = loaded_view().await;
        view.load_more().await.unwrap();
        view.select_question("q1").unwrap();
        view.set_draft("draft for q1");

        let other = view.questions()[1].id.clone();
        view.select_question(&other).unwrap();
        assert_eq!(view.capture().draft(), "");
        assert_eq!(view.practice().current_question().unwrap().id, other);

        assert!(view.select_question("missing").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn exit_stops_active_recording() {
        let backend = Arc::new(FakeBackend::with_session(closures_session()));
        let mic = FakeMicrophone::default();
        let capture = AnswerCapture::new(
            Box::new(mic.clone()),
            Box::new(FakeSpeaker::default()),
            unavailable_probe(),
            None,
        );
        let mut view = SessionView::new("s1", backend, capture, &AppConfig::default());
        view.load().await.unwrap();
        view.select_question("q1").unwrap();
        view.set_input_mode(InputMode::Voice).unwrap();
        view.start_recording().unwrap();
        assert!(mic.is_open());

        view.exit_practice();
        assert!(!mic.is_open());
    }

    #[tokio::test]
    async fn denied_microphone_becomes_notification() {
        let (mut view, _) = loaded_view().await;
        view.select_question("q1").unwrap();
        view.set_input_mode(InputMode::Voice).unwrap();

        assert!(matches!(
            view.start_recording(),
            Err(CaptureError::PermissionDenied(_))
        ));
        assert_eq!(view.notifications().latest().unwrap().level, Level::Error);
    }

    #[tokio::test]
    async fn explanation_flow() {
        let (mut view, backend) = loaded_view().await;

        assert!(view.explain("q1").await);
        assert!(matches!(
            view.drawer().state(),
            DrawerState::Loaded { explanation, .. } if explanation.title == "About: Explain closures"
        ));

        *backend.explanation.lock().unwrap() =
            Some(Err(ApiError::GenerationError("busy".to_string())));
        view.explain("q1").await;
        assert!(matches!(view.drawer().state(), DrawerState::Failed { .. }));

        let pending = view.begin_explanation("q1").unwrap();
        view.close_explanation();
        assert!(!view.finish_explanation(
            pending.ticket,
            Ok(Explanation {
                title: "late".to_string(),
                explanation: "late".to_string(),
            })
        ));
        assert_eq!(view.drawer().state(), &DrawerState::Closed);

        assert!(view.begin_explanation("nope").is_none());
    }

    #[tokio::test]
    async fn reload_drops_vanished_selection() {
        let backend = Arc::new(FakeBackend::with_session(closures_session()));
        let mut view = view_with(backend.clone());
        view.load().await.unwrap();
        view.select_question("q1").unwrap();

        let mut emptied = closures_session();
        emptied.questions.clear();
        let replacement = Arc::new(FakeBackend::with_session(emptied));
        view.client = replacement;
        view.load().await.unwrap();
        assert_eq!(view.practice().phase(), PracticePhase::Selecting);
        assert_eq!(view.header().unwrap().questions, "-");
    }
}
