// src/explanation.rs
// On-demand concept explanation for a single question

use crate::api::{ApiError, Explanation};

pub const EXPLANATION_FAILED: &str = "Failed to generate explanation, try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplanationTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawerState {
    Closed,
    Loading { question: String },
    Loaded { question: String, explanation: Explanation },
    Failed { question: String, message: String },
}

/// Only the most recently opened request may fill the drawer; closing or
/// reopening invalidates anything still in flight.
#[derive(Debug)]
pub struct ExplanationDrawer {
    state: DrawerState,
    pending: Option<ExplanationTicket>,
    next_ticket: u64,
}

impl Default for ExplanationDrawer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplanationDrawer {
    pub fn new() -> Self {
        Self {
            state: DrawerState::Closed,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &DrawerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != DrawerState::Closed
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, DrawerState::Loading { .. })
    }

    pub fn open(&mut self, question: &str) -> ExplanationTicket {
        if self.is_loading() {
            tracing::debug!("Superseding explanation request still in flight");
        }
        self.next_ticket += 1;
        let ticket = ExplanationTicket(self.next_ticket);
        self.pending = Some(ticket);
        self.state = DrawerState::Loading {
            question: question.to_string(),
        };
        ticket
    }

    /// Returns whether the result was applied
    pub fn finish(&mut self, ticket: ExplanationTicket, result: Result<Explanation, ApiError>) -> bool {
        if self.pending != Some(ticket) {
            tracing::debug!("Dropping stale explanation {:?}", ticket);
            return false;
        }
        self.pending = None;

        let question = match &self.state {
            DrawerState::Loading { question } => question.clone(),
            _ => return false,
        };

        self.state = match result {
            Ok(explanation) => DrawerState::Loaded {
                question,
                explanation,
            },
            Err(e) => {
                tracing::error!("Explanation failed: {}", e);
                DrawerState::Failed {
                    question,
                    message: EXPLANATION_FAILED.to_string(),
                }
            }
        };
        true
    }

    pub fn close(&mut self) {
        self.pending = None;
        self.state = DrawerState::Closed;
    }
}
