//! Router Module Index
//!
//! Routing is split by access level. The admin and manager routers are wrapped in a
//! session gate by `create_router`, and their handlers re-check the identity they act on.

/// Routes reachable without a session: login, logout, health.
pub mod public;

/// Routes restricted to sessions with the `admin` role, nested under `/admin`.
pub mod admin;

/// Branch-scoped routes for managers, nested under `/manager`.
pub mod manager;
