// src/api/types.rs
// Session, question and feedback models plus the client error taxonomy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::practice::InputMode;

/// A saved interview-prep run scoped to one role/experience profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics_to_focus: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
}

impl Session {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.question(question_id).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub question: String,
    /// Model answer
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_pinned: bool,
}

/// Question/answer pair as returned by the generator, before it is stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
}

impl GeneratedQuestion {
    pub fn is_usable(&self) -> bool {
        !self.question.trim().is_empty()
    }
}

/// Parameters for one "load more" generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub session_id: String,
    pub role: String,
    pub experience: String,
    pub topics_to_focus: String,
    pub count: u32,
}

impl GenerationRequest {
    pub fn for_session(session: &Session, count: u32) -> Self {
        Self {
            session_id: session.id.clone(),
            role: session.role.clone(),
            experience: session.experience.clone(),
            topics_to_focus: session.topics_to_focus.clone(),
            count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub question: String,
    pub user_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    pub input_mode: InputMode,
    pub recording_duration: u32,
}

/// Structured evaluation of one answer. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackResult {
    pub overall_score: Option<f64>,
    pub scores: Option<SubScores>,
    #[serde(deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub improvements: Vec<String>,
    pub detailed_feedback: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    pub metrics: Option<AnswerMetrics>,
    pub sample_answer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubScores {
    pub relevance: Option<f64>,
    pub clarity: Option<f64>,
    pub completeness: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerMetrics {
    pub word_count: Option<u64>,
    #[serde(alias = "durationSeconds")]
    pub duration: Option<f64>,
    pub words_per_minute: Option<f64>,
    pub complexity: Option<String>,
}

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend client errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Generation failed: {0}")]
    GenerationError(String),

    #[error("Evaluation failed: {0}")]
    EvaluationError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}
