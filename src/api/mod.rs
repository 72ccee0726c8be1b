// src/api/mod.rs
// Backend boundary: session store, question generator, explainer, evaluator

pub mod paths;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use types::{
    AnswerMetrics, ApiError, EvaluationRequest, Explanation, FeedbackResult, GeneratedQuestion,
    GenerationRequest, Question, Session, SubScores,
};

use crate::auth::AuthContext;
use crate::config::AppConfig;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Named stages of the "load more questions" pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendStage {
    Generate,
    Append,
}

impl fmt::Display for AppendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendStage::Generate => write!(f, "generate"),
            AppendStage::Append => write!(f, "append"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct AppendError {
    pub stage: AppendStage,
    #[source]
    pub source: ApiError,
}

/// Every operation is one request/response exchange. Nothing here retries;
/// retry policy belongs to the caller.
#[async_trait]
pub trait SessionDataClient: Send + Sync {
    async fn fetch_session(&self, session_id: &str) -> Result<Session, ApiError>;

    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, ApiError>;

    async fn add_questions(
        &self,
        session_id: &str,
        questions: &[GeneratedQuestion],
    ) -> Result<Vec<Question>, ApiError>;

    /// Returns the new pin flag. The caller refetches to see the merged list.
    async fn toggle_pin(&self, question_id: &str) -> Result<bool, ApiError>;

    async fn fetch_explanation(&self, question: &str) -> Result<Explanation, ApiError>;

    async fn evaluate_answer(&self, request: &EvaluationRequest)
        -> Result<FeedbackResult, ApiError>;

    /// Generate, then append to the session
    async fn append_generated_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, AppendError> {
        let generated = self
            .generate_questions(request)
            .await
            .map_err(|source| AppendError {
                stage: AppendStage::Generate,
                source,
            })?;

        let usable: Vec<GeneratedQuestion> =
            generated.into_iter().filter(|q| q.is_usable()).collect();
        if usable.is_empty() {
            return Err(AppendError {
                stage: AppendStage::Generate,
                source: ApiError::GenerationError(
                    "Generator returned no usable questions".to_string(),
                ),
            });
        }

        self.add_questions(&request.session_id, &usable)
            .await
            .map_err(|source| AppendError {
                stage: AppendStage::Append,
                source,
            })
    }
}

#[derive(Deserialize)]
struct SessionEnvelope {
    session: Option<Session>,
}

#[derive(Deserialize)]
struct QuestionEnvelope {
    question: Option<Question>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratedList {
    Bare(Vec<GeneratedQuestion>),
    Wrapped { questions: Vec<GeneratedQuestion> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionList {
    Bare(Vec<Question>),
    Wrapped { questions: Vec<Question> },
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateQuestionsBody<'a> {
    role: &'a str,
    experience: &'a str,
    topics_to_focus: &'a str,
    number_of_questions: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddQuestionsBody<'a> {
    session_id: &'a str,
    questions: &'a [GeneratedQuestion],
}

#[derive(Serialize)]
struct ExplainBody<'a> {
    question: &'a str,
}

/// REST implementation against the interview-prep backend
pub struct HttpSessionClient {
    client: Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpSessionClient {
    pub fn new(base_url: &str, auth: AuthContext, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn from_config(config: &AppConfig, auth: AuthContext) -> Self {
        tracing::info!("Session client targeting {}", config.api_base_url);
        Self::new(
            &config.api_base_url,
            auth,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.auth.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        builder: RequestBuilder,
        on_failure: fn(String) -> ApiError,
    ) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        tracing::warn!("Backend returned {}: {}", status, message);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => on_failure(message),
        })
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body.trim())
            }
        })
}

#[async_trait]
impl SessionDataClient for HttpSessionClient {
    async fn fetch_session(&self, session_id: &str) -> Result<Session, ApiError> {
        let response = Self::send(
            self.request(Method::GET, &paths::session(session_id)),
            ApiError::NetworkError,
        )
        .await?;

        let envelope: SessionEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        envelope
            .session
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))
    }

    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, ApiError> {
        let body = GenerateQuestionsBody {
            role: &request.role,
            experience: &request.experience,
            topics_to_focus: &request.topics_to_focus,
            number_of_questions: request.count,
        };

        let response = Self::send(
            self.request(Method::POST, paths::GENERATE_QUESTIONS).json(&body),
            ApiError::GenerationError,
        )
        .await?;

        let list: GeneratedList = response
            .json()
            .await
            .map_err(|e| ApiError::GenerationError(format!("unreadable questions: {}", e)))?;

        Ok(match list {
            GeneratedList::Bare(questions) => questions,
            GeneratedList::Wrapped { questions } => questions,
        })
    }

    async fn add_questions(
        &self,
        session_id: &str,
        questions: &[GeneratedQuestion],
    ) -> Result<Vec<Question>, ApiError> {
        let body = AddQuestionsBody {
            session_id,
            questions,
        };

        let response = Self::send(
            self.request(Method::POST, paths::ADD_QUESTIONS).json(&body),
            ApiError::NetworkError,
        )
        .await?;

        let list: QuestionList = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        Ok(match list {
            QuestionList::Bare(questions) => questions,
            QuestionList::Wrapped { questions } => questions,
        })
    }

    async fn toggle_pin(&self, question_id: &str) -> Result<bool, ApiError> {
        let response = Self::send(
            self.request(Method::POST, &paths::pin_question(question_id)),
            ApiError::NetworkError,
        )
        .await?;

        let envelope: QuestionEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        envelope
            .question
            .map(|q| q.is_pinned)
            .ok_or_else(|| ApiError::InvalidResponse("missing question".to_string()))
    }

    async fn fetch_explanation(&self, question: &str) -> Result<Explanation, ApiError> {
        let response = Self::send(
            self.request(Method::POST, paths::GENERATE_EXPLANATION)
                .json(&ExplainBody { question }),
            ApiError::GenerationError,
        )
        .await?;

        let explanation: Explanation = response
            .json()
            .await
            .map_err(|e| ApiError::GenerationError(format!("unreadable explanation: {}", e)))?;

        if explanation.explanation.trim().is_empty() {
            return Err(ApiError::GenerationError("Empty explanation".to_string()));
        }
        Ok(explanation)
    }

    async fn evaluate_answer(
        &self,
        request: &EvaluationRequest,
    ) -> Result<FeedbackResult, ApiError> {
        tracing::info!(
            "Evaluating {} answer ({} chars, {}s)",
            request.input_mode.as_str(),
            request.user_answer.len(),
            request.recording_duration
        );

        let response = Self::send(
            self.request(Method::POST, paths::EVALUATE_ANSWER).json(request),
            ApiError::EvaluationError,
        )
        .await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::EvaluationError(format!("unreadable feedback: {}", e)))
    }
}
