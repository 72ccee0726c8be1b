use std::sync::{Arc, RwLock};

use crate::config::{self, AppConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user_name: Option<String>,
}

/// Process-wide authenticated-session context.
///
/// Built once on startup from the loaded config and handed to whatever needs
/// credentials (the HTTP client, the server transcriber). Clones share state,
/// so a logout is seen by every holder.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    inner: Arc<RwLock<Option<AuthSession>>>,
}

impl AuthContext {
    pub fn initialize(config: &AppConfig) -> Self {
        let context = Self::default();
        match config::decode_auth_token(config) {
            Some(token) => {
                let user_name = Some(config.user_name.clone()).filter(|n| !n.is_empty());
                tracing::info!("Auth context initialized ({})", config::mask_token(&token));
                context.login(token, user_name);
            }
            None => tracing::warn!("No auth token configured, requests will be anonymous"),
        }
        context
    }

    pub fn login(&self, token: String, user_name: Option<String>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(AuthSession { token, user_name });
        }
    }

    pub fn logout(&self) {
        if let Ok(mut guard) = self.inner.write() {
            if guard.take().is_some() {
                tracing::info!("Auth context torn down");
            }
        }
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.token.clone()))
    }

    pub fn user_name(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(|s| s.user_name.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}
