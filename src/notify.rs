// src/notify.rs
// Transient user-facing notifications (toasts)

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;

const MAX_PENDING: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warn",
            Level::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

/// Bounded queue; the oldest entry is dropped when full
#[derive(Debug, Default)]
pub struct Notifications {
    queue: VecDeque<Notification>,
}

impl Notifications {
    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        let message = message.into();
        match level {
            Level::Error => tracing::error!("notify: {}", message),
            Level::Warning => tracing::warn!("notify: {}", message),
            Level::Success | Level::Info => tracing::info!("notify: {}", message),
        }

        if self.queue.len() == MAX_PENDING {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            level,
            message,
            created_at: Utc::now(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_entries() {
        let mut notifications = Notifications::default();
        for i in 0..25 {
            notifications.info(format!("n{}", i));
        }
        assert_eq!(notifications.len(), MAX_PENDING);
        let drained = notifications.drain();
        assert_eq!(drained[0].message, "n5");
        assert_eq!(drained.last().unwrap().to_string(), "[info] n24");
        assert!(notifications.is_empty());
    }
}
