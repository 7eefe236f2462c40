use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Product management across every branch. `create_router` wraps this router in the
/// admin gate; non-admin callers are redirected to `/login`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/dashboard
        // Lists all products.
        .route("/dashboard", get(handlers::admin_dashboard))
        // POST /admin/add-product
        // Creates a product in any branch.
        .route("/add-product", post(handlers::admin_add_product))
        // GET /admin/delete-product/{id}
        .route("/delete-product/{id}", get(handlers::admin_delete_product))
        // GET/POST /admin/edit-product/{id}
        // Edit form and the update it submits.
        .route(
            "/edit-product/{id}",
            get(handlers::admin_edit_product_form).post(handlers::admin_update_product),
        )
        // POST /admin/update-product/{id}
        // Same update under the path the edit form posts to.
        .route("/update-product/{id}", post(handlers::admin_update_product))
}
