use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. Nothing here reads or mutates products.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Redirects to the caller's dashboard, or to /login without a session.
        .route("/", get(handlers::index))
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET/POST /login
        // Login form and credential check. Success sets the session cookie.
        .route("/login", get(handlers::login_page).post(handlers::login))
        // GET /logout
        // Destroys the session and expires the cookie.
        .route("/logout", get(handlers::logout))
}
