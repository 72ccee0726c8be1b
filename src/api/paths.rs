pub const GENERATE_QUESTIONS: &str = "/api/ai/generate-questions";
pub const GENERATE_EXPLANATION: &str = "/api/ai/generate-explanation";
pub const EVALUATE_ANSWER: &str = "/api/ai/evaluate-answer";
pub const SPEECH_TO_TEXT: &str = "/api/ai/speech-to-text";
pub const ADD_QUESTIONS: &str = "/api/questions/add";

pub fn session(session_id: &str) -> String {
    format!("/api/sessions/{}", session_id)
}

pub fn pin_question(question_id: &str) -> String {
    format!("/api/questions/{}/pin", question_id)
}
