use async_trait::async_trait;
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Role;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "inventory_session";

/// SessionId
///
/// Opaque random identifier handed to the browser. Carries no data by itself; everything
/// the handlers need lives in the server-side `SessionData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// SessionData
///
/// The authenticated identity captured at login: `{username, role, branch}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub username: String,
    pub role: Role,
    pub branch: Option<String>,
}

// 1. SessionStore Contract
/// SessionStore
///
/// Server-side session storage. Sessions never expire on their own; they live until
/// `destroy` (logout, or a fresh login from the same browser) or process restart.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `data` under a freshly generated id.
    async fn create(&self, data: SessionData) -> SessionId;

    /// Resolves an id presented by the browser. Unknown ids yield `None`.
    async fn load(&self, id: &SessionId) -> Option<SessionData>;

    /// Forgets the session. Unknown ids are ignored.
    async fn destroy(&self, id: &SessionId);
}

// 2. In-process implementation
/// MemorySessionStore
///
/// Keeps sessions in a `HashMap` behind a `tokio` read/write lock. Sessions are lost on
/// restart, which simply sends every user back to `/login`.
///
/// Sessions never expire: an entry is removed only by logout or by a new login from the
/// same browser, so abandoned sessions stay in memory until the process restarts.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, data: SessionData) -> SessionId {
        let id = SessionId::generate();
        self.sessions.write().await.insert(id, data);
        id
    }

    async fn load(&self, id: &SessionId) -> Option<SessionData> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn destroy(&self, id: &SessionId) {
        self.sessions.write().await.remove(id);
    }
}

/// SessionState
///
/// The concrete type used to share the session store across the application state.
pub type SessionState = Arc<dyn SessionStore>;

// 3. Cookie encoding

/// Extracts the session id from the request's `Cookie` headers.
///
/// Browsers may send several `Cookie` headers, each holding `name=value` pairs separated
/// by `;`. The first well-formed `inventory_session` value wins; a malformed value is
/// treated as absent.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .find_map(|(_, value)| SessionId::parse(value.trim_matches('"')))
}

/// `Set-Cookie` value that binds the browser to `id`.
pub fn session_cookie(id: &SessionId, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "inventory_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
    )
}
