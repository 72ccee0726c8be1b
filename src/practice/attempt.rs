use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::api::{EvaluationRequest, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Text,
    Voice,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Text => "text",
            InputMode::Voice => "voice",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What AnswerCapture emits on submit
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSubmission {
    pub question: String,
    pub answer_text: String,
    pub input_mode: InputMode,
    pub recording_duration_secs: u32,
}

/// One submitted answer. Lives until the question changes, the answer is
/// resubmitted or practice mode ends.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeAttempt {
    pub id: Uuid,
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub input_mode: InputMode,
    pub recording_duration_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl PracticeAttempt {
    pub fn new(question: &Question, submission: AnswerSubmission) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id: question.id.clone(),
            question: question.question.clone(),
            answer: submission.answer_text.trim().to_string(),
            input_mode: submission.input_mode,
            recording_duration_secs: submission.recording_duration_secs,
            created_at: Utc::now(),
        }
    }

    /// Evaluation payload; the model answer is sent when the question has one
    pub fn evaluation_request(&self, model_answer: Option<&str>) -> EvaluationRequest {
        EvaluationRequest {
            question: self.question.clone(),
            user_answer: self.answer.clone(),
            expected_answer: model_answer
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            input_mode: self.input_mode,
            recording_duration: match self.input_mode {
                InputMode::Voice => self.recording_duration_secs,
                InputMode::Text => 0,
            },
        }
    }
}
