use serde::Deserialize;
use sqlx::FromRow;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// An account row from the `users` table. Accounts are provisioned out-of-band; the
/// application only reads them at login (and upserts the bootstrap admin at start-up).
///
/// `role` is kept as the raw column value so that rows carrying an unknown role can
/// still be loaded and rejected explicitly at login.
#[derive(Debug, Clone, FromRow, Default, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    // Stored and compared as plaintext.
    pub password: String,
    pub role: String,
    // Expected for managers, absent for admins. Not enforced by the schema.
    pub branch: Option<String>,
}

/// NewUser
///
/// Input for `Repository::upsert_user`. Keyed on `username`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub branch: Option<String>,
}

/// Product
///
/// A row from the `products` table. Every product belongs to exactly one branch.
#[derive(Debug, Clone, FromRow, Default, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub branch: String,
}

impl Product {
    /// Ownership test used before any manager mutation.
    pub fn belongs_to(&self, branch: &str) -> bool {
        self.branch == branch
    }

    /// Description for display; empty when none was given.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Price formatted with two decimals for display.
    pub fn price_display(&self) -> String {
        format!("{:.2}", self.price)
    }
}

/// Role
///
/// The two authorization levels: `Admin` acts on every branch, `Manager` only on
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
}

impl Role {
    /// Parses the `users.role` column. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
        }
    }

    /// Landing page after login.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Manager => "/manager/dashboard",
        }
    }
}

// --- Request Payloads (Form Bodies) ---

/// LoginForm
///
/// Body of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// AdminProductForm
///
/// Body of the admin add/edit product forms. Admins choose the branch explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub quantity: i32,
    pub branch: String,
}

/// ManagerProductForm
///
/// Body of the manager add/update product forms. There is no branch field: the
/// session branch is always used.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagerProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub quantity: i32,
}

/// ProductInput
///
/// Validated product values handed to the repository for inserts and full updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub branch: String,
}

/// Reasons a submitted product form is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidProduct {
    BlankName,
    BlankBranch,
    Price(f64),
    Quantity(i32),
}

impl ProductInput {
    /// Trims and checks raw form values. A blank description becomes `None`.
    pub fn new(
        name: &str,
        description: &str,
        price: f64,
        quantity: i32,
        branch: &str,
    ) -> Result<Self, InvalidProduct> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InvalidProduct::BlankName);
        }
        let branch = branch.trim();
        if branch.is_empty() {
            return Err(InvalidProduct::BlankBranch);
        }
        if !price.is_finite() || price < 0.0 {
            return Err(InvalidProduct::Price(price));
        }
        if quantity < 0 {
            return Err(InvalidProduct::Quantity(quantity));
        }
        let description = description.trim();

        Ok(Self {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            price,
            quantity,
            branch: branch.to_string(),
        })
    }
}

impl AdminProductForm {
    pub fn validate(&self) -> Result<ProductInput, InvalidProduct> {
        ProductInput::new(
            &self.name,
            &self.description,
            self.price,
            self.quantity,
            &self.branch,
        )
    }
}

impl ManagerProductForm {
    /// Validates against the caller's own branch. The branch is stored exactly as the
    /// session carries it, so the product keeps matching the ownership check.
    pub fn validate(&self, branch: &str) -> Result<ProductInput, InvalidProduct> {
        let mut input =
            ProductInput::new(&self.name, &self.description, self.price, self.quantity, branch)?;
        input.branch = branch.to_string();
        Ok(input)
    }
}
