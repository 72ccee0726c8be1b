use crate::api::{ApiError, EvaluationRequest, FeedbackResult, Question, Session};

use super::{AnswerSubmission, PracticeAttempt, PracticeError};

/// Identifies one in-flight evaluation. A result is applied only while the
/// ticket still matches the pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub ticket: SubmissionTicket,
    pub attempt: PracticeAttempt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeState {
    Idle,
    Selecting,
    Answering {
        question: Question,
        pending: Option<PendingSubmission>,
    },
    Reviewing {
        question: Question,
        attempt: PracticeAttempt,
        feedback: FeedbackResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticePhase {
    Idle,
    Selecting,
    Answering,
    Reviewing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Reviewed,
    Failed(ApiError),
    /// The attempt was abandoned before the result arrived
    Stale,
}

pub struct PracticeController {
    state: PracticeState,
    next_ticket: u64,
}

impl Default for PracticeController {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticeController {
    pub fn new() -> Self {
        Self {
            state: PracticeState::Idle,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &PracticeState {
        &self.state
    }

    pub fn phase(&self) -> PracticePhase {
        match self.state {
            PracticeState::Idle => PracticePhase::Idle,
            PracticeState::Selecting => PracticePhase::Selecting,
            PracticeState::Answering { .. } => PracticePhase::Answering,
            PracticeState::Reviewing { .. } => PracticePhase::Reviewing,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() != PracticePhase::Idle
    }

    pub fn is_submitting(&self) -> bool {
        matches!(
            self.state,
            PracticeState::Answering {
                pending: Some(_),
                ..
            }
        )
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            PracticeState::Answering { question, .. } | PracticeState::Reviewing { question, .. } => {
                Some(question)
            }
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<(&PracticeAttempt, &FeedbackResult)> {
        match &self.state {
            PracticeState::Reviewing {
                attempt, feedback, ..
            } => Some((attempt, feedback)),
            _ => None,
        }
    }

    pub fn enable(&mut self) {
        if self.state == PracticeState::Idle {
            tracing::info!("Practice mode enabled");
            self.state = PracticeState::Selecting;
        }
    }

    /// Leave practice mode from any state, dropping question, attempt and feedback
    pub fn exit(&mut self) {
        if self.state != PracticeState::Idle {
            tracing::info!("Practice mode exited");
        }
        self.state = PracticeState::Idle;
    }

    /// Pick a question of `session`. Allowed from any state; from `Idle` it
    /// turns practice mode on. Any attempt or feedback in progress is dropped.
    pub fn select(&mut self, session: &Session, question_id: &str) -> Result<&Question, PracticeError> {
        let question = session
            .question(question_id)
            .cloned()
            .ok_or_else(|| PracticeError::UnknownQuestion(question_id.to_string()))?;

        tracing::info!("Practicing question {}", question.id);
        self.state = PracticeState::Answering {
            question,
            pending: None,
        };
        self.current_question().ok_or(PracticeError::NoQuestionSelected)
    }

    /// Start an evaluation. `Ok(None)` when one is already pending for this
    /// attempt (duplicate submit is a no-op). Resubmitting while reviewing
    /// discards the shown feedback.
    pub fn begin_submission(
        &mut self,
        submission: AnswerSubmission,
    ) -> Result<Option<(SubmissionTicket, EvaluationRequest)>, PracticeError> {
        let question = match &self.state {
            PracticeState::Idle => return Err(PracticeError::NotPracticing),
            PracticeState::Selecting => return Err(PracticeError::NoQuestionSelected),
            PracticeState::Answering {
                pending: Some(_), ..
            } => {
                tracing::debug!("Submission ignored: evaluation already pending");
                return Ok(None);
            }
            PracticeState::Answering { question, .. } | PracticeState::Reviewing { question, .. } => {
                question.clone()
            }
        };

        if submission.answer_text.trim().is_empty() {
            return Err(PracticeError::EmptyAnswer);
        }

        self.next_ticket += 1;
        let ticket = SubmissionTicket(self.next_ticket);
        let attempt = PracticeAttempt::new(&question, submission);
        let request = attempt.evaluation_request(Some(&question.answer));

        self.state = PracticeState::Answering {
            question,
            pending: Some(PendingSubmission { ticket, attempt }),
        };
        Ok(Some((ticket, request)))
    }

    /// Apply an evaluation result if its ticket is still the pending one
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<FeedbackResult, ApiError>,
    ) -> SubmissionOutcome {
        let matches_pending = matches!(
            &self.state,
            PracticeState::Answering { pending: Some(p), .. } if p.ticket == ticket
        );
        if !matches_pending {
            tracing::debug!("Dropping stale evaluation result {:?}", ticket);
            return SubmissionOutcome::Stale;
        }

        let (question, pending) = match std::mem::replace(&mut self.state, PracticeState::Idle) {
            PracticeState::Answering {
                question,
                pending: Some(pending),
            } => (question, pending),
            other => {
                self.state = other;
                return SubmissionOutcome::Stale;
            }
        };

        match result {
            Ok(feedback) => {
                self.state = PracticeState::Reviewing {
                    question,
                    attempt: pending.attempt,
                    feedback,
                };
                SubmissionOutcome::Reviewed
            }
            Err(e) => {
                tracing::error!("Evaluation failed: {}", e);
                self.state = PracticeState::Answering {
                    question,
                    pending: None,
                };
                SubmissionOutcome::Failed(e)
            }
        }
    }

    /// Reviewing → Selecting
    pub fn try_another(&mut self) -> Result<(), PracticeError> {
        match self.phase() {
            PracticePhase::Reviewing => {
                self.state = PracticeState::Selecting;
                Ok(())
            }
            _ => Err(PracticeError::NotReviewing),
        }
    }

    /// Reviewing → Answering on the same question
    pub fn practice_again(&mut self) -> Result<(), PracticeError> {
        let state = std::mem::replace(&mut self.state, PracticeState::Idle);
        match state {
            PracticeState::Reviewing { question, .. } => {
                self.state = PracticeState::Answering {
                    question,
                    pending: None,
                };
                Ok(())
            }
            other => {
                self.state = other;
                Err(PracticeError::NotReviewing)
            }
        }
    }

    /// After a reload, pick up the server's copy of the selected question, or
    /// fall back to `Selecting` if it is gone
    pub fn reconcile(&mut self, session: &Session) {
        let missing = match &mut self.state {
            PracticeState::Answering { question, .. } | PracticeState::Reviewing { question, .. } => {
                match session.question(&question.id) {
                    Some(fresh) => {
                        *question = fresh.clone();
                        false
                    }
                    None => true,
                }
            }
            _ => false,
        };
        if missing {
            tracing::warn!("Selected question no longer in session, back to selection");
            self.state = PracticeState::Selecting;
        }
    }
}
