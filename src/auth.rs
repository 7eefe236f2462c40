use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use std::convert::Infallible;

use crate::{
    models::Role,
    session::{SessionId, SessionState, session_id_from_headers},
};

/// Where every rejected request is sent.
pub const LOGIN_PATH: &str = "/login";

fn login_redirect() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// SessionUser Extractor Result
///
/// The identity resolved from the session cookie. Handlers use it to read the caller's role
/// and branch; the `session_id` is kept so logout and re-login can destroy it.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub session_id: SessionId,
    pub username: String,
    pub role: Role,
    pub branch: Option<String>,
}

/// SessionUser Extractor Implementation
///
/// 1. Dependency Resolution: pulls the `SessionState` out of the application state.
/// 2. Cookie Lookup: reads the `inventory_session` cookie.
/// 3. Store Lookup: resolves the id against the server-side store.
///
/// Rejection: a redirect to `/login` on any failure.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        <SessionUser as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .unwrap_or(None)
            .ok_or_else(login_redirect)
    }
}

/// Lets handlers take `Option<SessionUser>` when a session is welcome but not required.
impl<S> OptionalFromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(session_id) = session_id_from_headers(&parts.headers) else {
            return Ok(None);
        };

        let sessions = SessionState::from_ref(state);
        Ok(sessions.load(&session_id).await.map(|data| SessionUser {
            session_id,
            username: data.username,
            role: data.role,
            branch: data.branch,
        }))
    }
}

/// AdminUser
///
/// A session whose role is `admin`. Any other caller is redirected to `/login`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub SessionUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <SessionUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            tracing::debug!(username = %user.username, "non-admin session on admin route");
            return Err(login_redirect());
        }
        Ok(AdminUser(user))
    }
}

/// BranchUser
///
/// A session that carries a branch. This is the scope every manager mutation is checked
/// against. Sessions without a branch (typically admins) are redirected to `/login`, since
/// a product cannot be created or matched without one.
#[derive(Debug, Clone)]
pub struct BranchUser {
    pub username: String,
    pub role: Role,
    pub branch: String,
}

impl<S> FromRequestParts<S> for BranchUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <SessionUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        match user.branch {
            Some(branch) if !branch.is_empty() => Ok(BranchUser {
                username: user.username,
                role: user.role,
                branch,
            }),
            _ => {
                tracing::debug!(username = %user.username, "session without branch on manager route");
                Err(login_redirect())
            }
        }
    }
}
