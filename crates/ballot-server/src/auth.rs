use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use ballot_types::Principal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read an `Authorization: Bearer <token>` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| Self::Bearer(token.trim().to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Resolves request credentials to a logged-in user.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Principal>;
}

struct Session {
    principal: Principal,
    expires_at: Instant,
}

/// In-memory login sessions keyed by opaque UUID v7 bearer tokens.
///
/// Sessions are lost on restart.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `principal` and return its token.
    pub async fn issue(&self, principal: Principal) -> String {
        let token = Uuid::now_v7().to_string();
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                principal,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// End a session. Returns `false` if the token was unknown.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Number of sessions, expired ones included until the next purge.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AuthProvider for SessionStore {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Principal> {
        let token = match credentials {
            Credentials::Bearer(token) => token,
            Credentials::Anonymous => {
                return Err(ServerError::Unauthenticated("missing bearer token".into()))
            }
        };

        let sessions = self.sessions.read().await;
        match sessions.get(token) {
            Some(session) if session.expires_at > Instant::now() => Ok(session.principal.clone()),
            Some(_) => Err(ServerError::Unauthenticated("session expired".into())),
            None => Err(ServerError::Unauthenticated("unknown session token".into())),
        }
    }
}
