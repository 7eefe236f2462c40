use askama::Template;
use axum::response::Html;

use crate::{errors::AppError, models::Product};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage<'a> {
    // Empty when there is nothing to report.
    pub error: &'a str,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardPage<'a> {
    pub username: &'a str,
    pub products: &'a [Product],
}

#[derive(Template)]
#[template(path = "edit_product.html")]
pub struct EditProductPage<'a> {
    pub username: &'a str,
    pub product: &'a Product,
}

/// Own-branch products are editable; everything else is listed read-only.
#[derive(Template)]
#[template(path = "manager_dashboard.html")]
pub struct ManagerDashboardPage<'a> {
    pub username: &'a str,
    pub branch: &'a str,
    pub products: &'a [Product],
    pub other_products: &'a [Product],
}

#[derive(Template)]
#[template(path = "manager_edit_product.html")]
pub struct ManagerEditProductPage<'a> {
    pub username: &'a str,
    pub branch: &'a str,
    pub product: &'a Product,
}

/// Renders a page into an HTML response body.
pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}
