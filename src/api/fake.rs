use super::{
    ApiError, EvaluationRequest, Explanation, FeedbackResult, GeneratedQuestion,
    GenerationRequest, Question, Session, SessionDataClient,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory backend used by unit tests
#[derive(Default)]
pub struct FakeBackend {
    sessions: Mutex<HashMap<String, Session>>,
    pub feedback: Mutex<Option<Result<FeedbackResult, ApiError>>>,
    pub explanation: Mutex<Option<Result<Explanation, ApiError>>>,
    pub generated: Mutex<Option<Result<Vec<GeneratedQuestion>, ApiError>>>,
    pub evaluate_calls: Mutex<Vec<EvaluationRequest>>,
    pub fetch_failure: Mutex<Option<ApiError>>,
    next_id: Mutex<u32>,
}

impl FakeBackend {
    pub fn with_session(session: Session) -> Self {
        let backend = Self::default();
        backend
            .sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
        backend
    }

    pub fn evaluate_call_count(&self) -> usize {
        self.evaluate_calls.lock().unwrap().len()
    }

    pub fn set_feedback(&self, result: Result<FeedbackResult, ApiError>) {
        *self.feedback.lock().unwrap() = Some(result);
    }
}

pub fn closures_session() -> Session {
    Session {
        id: "s1".to_string(),
        role: "Frontend Developer".to_string(),
        experience: "2".to_string(),
        topics_to_focus: "JavaScript".to_string(),
        description: String::new(),
        updated_at: None,
        questions: vec![Question {
            id: "q1".to_string(),
            question: "Explain closures".to_string(),
            answer: "...".to_string(),
            is_pinned: false,
        }],
    }
}

#[async_trait]
impl SessionDataClient for FakeBackend {
    async fn fetch_session(&self, session_id: &str) -> Result<Session, ApiError> {
        if let Some(err) = self.fetch_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))
    }

    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, ApiError> {
        if let Some(result) = self.generated.lock().unwrap().clone() {
            return result;
        }
        Ok((0..request.count)
            .map(|i| GeneratedQuestion {
                question: format!("{} question {}", request.role, i + 1),
                answer: "model answer".to_string(),
            })
            .collect())
    }

    async fn add_questions(
        &self,
        session_id: &str,
        questions: &[GeneratedQuestion],
    ) -> Result<Vec<Question>, ApiError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))?;
        let mut next_id = self.next_id.lock().unwrap();
        let mut added = Vec::new();
        for generated in questions {
            *next_id += 1;
            let question = Question {
                id: format!("gen-{}", next_id),
                question: generated.question.clone(),
                answer: generated.answer.clone(),
                is_pinned: false,
            };
            session.questions.push(question.clone());
            added.push(question);
        }
        Ok(added)
    }

    async fn toggle_pin(&self, question_id: &str) -> Result<bool, ApiError> {
        let mut sessions = self.sessions.lock().unwrap();
        for session in sessions.values_mut() {
            if let Some(q) = session.questions.iter_mut().find(|q| q.id == question_id) {
                q.is_pinned = !q.is_pinned;
                return Ok(q.is_pinned);
            }
        }
        Err(ApiError::NotFound(format!("question {}", question_id)))
    }

    async fn fetch_explanation(&self, question: &str) -> Result<Explanation, ApiError> {
        if let Some(result) = self.explanation.lock().unwrap().clone() {
            return result;
        }
        Ok(Explanation {
            title: format!("About: {}", question),
            explanation: "An explanation.".to_string(),
        })
    }

    async fn evaluate_answer(
        &self,
        request: &EvaluationRequest,
    ) -> Result<FeedbackResult, ApiError> {
        self.evaluate_calls.lock().unwrap().push(request.clone());
        self.feedback
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(FeedbackResult::default()))
    }
}
