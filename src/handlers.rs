use crate::{
    AppState,
    auth::{AdminUser, BranchUser, LOGIN_PATH, SessionUser},
    errors::AppError,
    models::{AdminProductForm, LoginForm, ManagerProductForm, Product, Role},
    repository::RepositoryState,
    session::{SessionData, SessionState, expired_session_cookie, session_cookie},
    views::{
        AdminDashboardPage, EditProductPage, LoginPage, ManagerDashboardPage,
        ManagerEditProductPage, render,
    },
};
use axum::{
    Form,
    extract::{Path, State},
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect, Response},
};

pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
pub const MANAGER_DASHBOARD: &str = "/manager/dashboard";

// --- Public Handlers ---

/// index
///
/// [Public Route] Sends a signed-in caller to their dashboard, everyone else to `/login`.
pub async fn index(user: Option<SessionUser>) -> Redirect {
    match user {
        Some(user) => Redirect::to(user.role.dashboard_path()),
        None => Redirect::to(LOGIN_PATH),
    }
}

/// login_page
///
/// [Public Route] Renders the empty login form.
pub async fn login_page() -> Result<Html<String>, AppError> {
    render(&LoginPage { error: "" })
}

/// login
///
/// [Public Route] Checks the submitted credentials against the `users` table.
///
/// *Success*: any session presented with the request is destroyed, a fresh one holding
/// `{username, role, branch}` is created, and the caller is redirected to the dashboard
/// of their role.
/// *Failure*: the login page is rendered again with an inline error and no cookie is set.
/// A stored role other than `admin`/`manager` counts as a failure.
pub async fn login(
    State(state): State<AppState>,
    previous: Option<SessionUser>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) = state
        .repo
        .find_user_by_credentials(&form.username, &form.password)
        .await?
    else {
        tracing::warn!(username = %form.username, "login rejected: invalid credentials");
        return Ok(render(&LoginPage {
            error: "Invalid credentials",
        })?
        .into_response());
    };

    let Some(role) = Role::parse(&user.role) else {
        tracing::warn!(username = %user.username, role = %user.role, "login rejected: unknown role");
        return Ok(render(&LoginPage {
            error: "Unknown role",
        })?
        .into_response());
    };

    if let Some(previous) = previous {
        state.sessions.destroy(&previous.session_id).await;
    }

    let session_id = state
        .sessions
        .create(SessionData {
            username: user.username.clone(),
            role,
            branch: user.branch.clone(),
        })
        .await;
    let cookie = session_cookie(&session_id, state.config.secure_cookies())?;

    tracing::info!(username = %user.username, role = role.as_str(), "login succeeded");

    Ok((
        [(SET_COOKIE, cookie)],
        Redirect::to(role.dashboard_path()),
    )
        .into_response())
}

/// logout
///
/// [Public Route] Destroys the server-side session (if any) and expires the cookie.
/// Always redirects to `/login`.
pub async fn logout(
    State(sessions): State<SessionState>,
    user: Option<SessionUser>,
) -> Response {
    if let Some(user) = user {
        sessions.destroy(&user.session_id).await;
    }
    (
        [(SET_COOKIE, expired_session_cookie())],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

// --- Admin Handlers ---
//
// Every handler takes `AdminUser`, so a non-admin caller is redirected to `/login` even
// if the router-level gate is bypassed.

/// admin_dashboard
///
/// [Admin Route] Lists every product across all branches.
pub async fn admin_dashboard(
    AdminUser(admin): AdminUser,
    State(repo): State<RepositoryState>,
) -> Result<Html<String>, AppError> {
    let products = repo.get_all_products().await?;
    render(&AdminDashboardPage {
        username: &admin.username,
        products: &products,
    })
}

/// admin_add_product
///
/// [Admin Route] Creates a product in the branch named by the form.
pub async fn admin_add_product(
    AdminUser(admin): AdminUser,
    State(repo): State<RepositoryState>,
    Form(form): Form<AdminProductForm>,
) -> Result<Redirect, AppError> {
    match form.validate() {
        Ok(input) => {
            let product = repo.create_product(input).await?;
            tracing::info!(
                username = %admin.username,
                product_id = product.id,
                branch = %product.branch,
                "product created"
            );
        }
        Err(reason) => {
            tracing::debug!(username = %admin.username, ?reason, "product form rejected");
        }
    }
    Ok(Redirect::to(ADMIN_DASHBOARD))
}

/// admin_delete_product
///
/// [Admin Route] Deletes any product. Unknown ids are a silent no-op.
pub async fn admin_delete_product(
    AdminUser(admin): AdminUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    if repo.delete_product(id).await? {
        tracing::info!(username = %admin.username, product_id = id, "product deleted");
    }
    Ok(Redirect::to(ADMIN_DASHBOARD))
}

/// admin_edit_product_form
///
/// [Admin Route] Renders the edit form, or redirects to the dashboard when the product
/// does not exist.
pub async fn admin_edit_product_form(
    AdminUser(admin): AdminUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    match repo.get_product(id).await? {
        Some(product) => Ok(render(&EditProductPage {
            username: &admin.username,
            product: &product,
        })?
        .into_response()),
        None => Ok(Redirect::to(ADMIN_DASHBOARD).into_response()),
    }
}

/// admin_update_product
///
/// [Admin Route] Replaces every field of a product, including its branch.
/// Mounted on both `POST /admin/edit-product/{id}` and `POST /admin/update-product/{id}`.
pub async fn admin_update_product(
    AdminUser(admin): AdminUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i32>,
    Form(form): Form<AdminProductForm>,
) -> Result<Redirect, AppError> {
    match form.validate() {
        Ok(input) => match repo.update_product(id, input).await? {
            Some(product) => tracing::info!(
                username = %admin.username,
                product_id = product.id,
                branch = %product.branch,
                "product updated"
            ),
            None => tracing::debug!(product_id = id, "update of unknown product ignored"),
        },
        Err(reason) => {
            tracing::debug!(username = %admin.username, ?reason, "product form rejected");
        }
    }
    Ok(Redirect::to(ADMIN_DASHBOARD))
}

// --- Manager Handlers ---

/// branch_product
///
/// The ownership check every manager mutation goes through: re-fetch the product and keep
/// it only if it belongs to the caller's branch. Missing and foreign products are both
/// reported as `None`, so callers cannot tell them apart.
///
/// This is check-then-act; nothing prevents the row from changing between this read and
/// the following write.
async fn branch_product(
    repo: &RepositoryState,
    id: i32,
    user: &BranchUser,
) -> Result<Option<Product>, AppError> {
    let product = repo.get_product(id).await?;
    Ok(product.filter(|product| {
        let owned = product.belongs_to(&user.branch);
        if !owned {
            tracing::warn!(
                username = %user.username,
                branch = %user.branch,
                product_id = product.id,
                product_branch = %product.branch,
                "branch mismatch"
            );
        }
        owned
    }))
}

/// manager_dashboard
///
/// [Manager Route] Lists the caller's branch (editable) and every other branch
/// (read-only). Requires the `manager` role.
pub async fn manager_dashboard(
    user: BranchUser,
    State(repo): State<RepositoryState>,
) -> Result<Response, AppError> {
    if user.role != Role::Manager {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    }

    let products = repo.get_products_by_branch(&user.branch).await?;
    let other_products = repo.get_products_outside_branch(&user.branch).await?;

    Ok(render(&ManagerDashboardPage {
        username: &user.username,
        branch: &user.branch,
        products: &products,
        other_products: &other_products,
    })?
    .into_response())
}

/// manager_add_product
///
/// [Manager Route] Creates a product in the caller's own branch.
pub async fn manager_add_product(
    user: BranchUser,
    State(repo): State<RepositoryState>,
    Form(form): Form<ManagerProductForm>,
) -> Result<Redirect, AppError> {
    match form.validate(&user.branch) {
        Ok(input) => {
            let product = repo.create_product(input).await?;
            tracing::info!(
                username = %user.username,
                product_id = product.id,
                branch = %product.branch,
                "product created"
            );
        }
        Err(reason) => {
            tracing::debug!(username = %user.username, ?reason, "product form rejected");
        }
    }
    Ok(Redirect::to(MANAGER_DASHBOARD))
}

/// manager_edit_product_form
///
/// [Manager Route] Renders the edit form for an own-branch product; anything else
/// redirects to the dashboard.
pub async fn manager_edit_product_form(
    user: BranchUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    match branch_product(&repo, id, &user).await? {
        Some(product) => Ok(render(&ManagerEditProductPage {
            username: &user.username,
            branch: &user.branch,
            product: &product,
        })?
        .into_response()),
        None => Ok(Redirect::to(MANAGER_DASHBOARD).into_response()),
    }
}

/// manager_update_product
///
/// [Manager Route] Updates an own-branch product. The branch is pinned to the session
/// branch, so a manager can never move a product out of their branch.
pub async fn manager_update_product(
    user: BranchUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i32>,
    Form(form): Form<ManagerProductForm>,
) -> Result<Redirect, AppError> {
    if branch_product(&repo, id, &user).await?.is_none() {
        return Ok(Redirect::to(MANAGER_DASHBOARD));
    }

    match form.validate(&user.branch) {
        Ok(input) => {
            if repo.update_product(id, input).await?.is_some() {
                tracing::info!(username = %user.username, product_id = id, "product updated");
            }
        }
        Err(reason) => {
            tracing::debug!(username = %user.username, ?reason, "product form rejected");
        }
    }
    Ok(Redirect::to(MANAGER_DASHBOARD))
}

/// manager_delete_product
///
/// [Manager Route] Deletes an own-branch product; anything else is a silent no-op.
pub async fn manager_delete_product(
    user: BranchUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    if branch_product(&repo, id, &user).await?.is_some() && repo.delete_product(id).await? {
        tracing::info!(username = %user.username, product_id = id, "product deleted");
    }
    Ok(Redirect::to(MANAGER_DASHBOARD))
}
