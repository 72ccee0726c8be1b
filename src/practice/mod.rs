// src/practice/mod.rs
// Practice workflow: question selection, answer capture, evaluation review

mod attempt;
pub mod capture;
pub mod controller;
pub mod feedback;

pub use attempt::{AnswerSubmission, InputMode, PracticeAttempt};
pub use capture::{format_elapsed, AnswerCapture, TranscriptionOutcome};
pub use controller::{
    PendingSubmission, PracticeController, PracticePhase, PracticeState, SubmissionOutcome,
    SubmissionTicket,
};
pub use feedback::{FeedbackRenderer, FeedbackView, ScoreBand};

use crate::audio::CaptureError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PracticeError {
    #[error("Practice mode is not active")]
    NotPracticing,

    #[error("Question {0} is not part of this session")]
    UnknownQuestion(String),

    #[error("Select a question to practice first")]
    NoQuestionSelected,

    #[error("Please provide an answer before submitting")]
    EmptyAnswer,

    #[error("No feedback to review yet")]
    NotReviewing,

    #[error(transparent)]
    Capture(#[from] CaptureError),
}
