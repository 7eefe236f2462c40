use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Manager Router Module
///
/// Branch-scoped product management. `create_router` wraps this router in a gate that
/// requires a session carrying a branch. Mutations additionally re-fetch the product and
/// only proceed when its branch equals the session branch; mismatches redirect to the
/// dashboard without effect.
pub fn manager_routes() -> Router<AppState> {
    Router::new()
        // GET /manager/dashboard
        // Own-branch products (editable) and other-branch products (read-only).
        .route("/dashboard", get(handlers::manager_dashboard))
        // POST /manager/add-product
        // Creates a product in the session branch.
        .route("/add-product", post(handlers::manager_add_product))
        // GET /manager/edit-product/{id}
        .route("/edit-product/{id}", get(handlers::manager_edit_product_form))
        // POST /manager/update-product/{id}
        .route("/update-product/{id}", post(handlers::manager_update_product))
        // GET /manager/delete-product/{id}
        .route("/delete-product/{id}", get(handlers::manager_delete_product))
}
