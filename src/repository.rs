use crate::models::{NewUser, Product, ProductInput, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see this trait, so the
/// Postgres implementation can be swapped for `MemoryRepository` (or a test double).
///
/// **Send + Sync + async_trait** are required to share the trait object
/// (`Arc<dyn Repository>`) across Axum's asynchronous task boundaries.
///
/// Branch scoping is *not* enforced here: the manager handlers re-fetch a product and
/// compare its branch before calling any mutation.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Exact equality on both username and password.
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, sqlx::Error>;
    // Out-of-band provisioning: inserts, or overwrites the row with the same username.
    async fn upsert_user(&self, user: NewUser) -> Result<User, sqlx::Error>;

    // --- Product listings (ordered by id) ---
    async fn get_all_products(&self) -> Result<Vec<Product>, sqlx::Error>;
    async fn get_products_by_branch(&self, branch: &str) -> Result<Vec<Product>, sqlx::Error>;
    // Complement of `get_products_by_branch`.
    async fn get_products_outside_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<Product>, sqlx::Error>;

    // --- Single product ---
    async fn get_product(&self, id: i32) -> Result<Option<Product>, sqlx::Error>;
    async fn create_product(&self, input: ProductInput) -> Result<Product, sqlx::Error>;
    // Full replacement of every column. `None` when the id does not exist.
    async fn update_product(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<Option<Product>, sqlx::Error>;
    // `true` when a row was removed.
    async fn delete_product(&self, id: i32) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of the `Repository` trait, backed by a `PgPool`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, branch FROM users WHERE username = $1 AND password = $2",
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await
    }

    /// upsert_user
    ///
    /// `ON CONFLICT (username)` refreshes password, role and branch so that re-running the
    /// bootstrap with new credentials takes effect.
    async fn upsert_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role, branch)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO UPDATE
                SET password = EXCLUDED.password,
                    role = EXCLUDED.role,
                    branch = EXCLUDED.branch
            RETURNING id, username, password, role, branch
            "#,
        )
        .bind(user.username)
        .bind(user.password)
        .bind(user.role.as_str())
        .bind(user.branch)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_all_products(&self) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, quantity, branch FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_products_by_branch(&self, branch: &str) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, quantity, branch FROM products WHERE branch = $1 ORDER BY id",
        )
        .bind(branch)
        .fetch_all(&self.pool)
        .await
    }

    /// get_products_outside_branch
    ///
    /// `branch` is NOT NULL, so `<>` partitions the table exactly with the query above.
    async fn get_products_outside_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, quantity, branch FROM products WHERE branch <> $1 ORDER BY id",
        )
        .bind(branch)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_product(&self, id: i32) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, quantity, branch FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_product(&self, input: ProductInput) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, quantity, branch)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, quantity, branch
            "#,
        )
        .bind(input.name)
        .bind(input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.branch)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_product(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                price = $4,
                quantity = $5,
                branch = $6
            WHERE id = $1
            RETURNING id, name, description, price, quantity, branch
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.branch)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_product(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-memory implementation ---

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    products: BTreeMap<i32, Product>,
    next_user_id: i32,
    next_product_id: i32,
}

/// MemoryRepository
///
/// A `Repository` over in-process tables. Ids are assigned sequentially from 1 like a
/// `SERIAL` column, and listings come back in id order, so behaviour matches
/// `PostgresRepository` for everything the handlers rely on. Used by the test suite.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a product as-is, bypassing validation. Returns the stored row.
    pub async fn seed_product(&self, input: ProductInput) -> Product {
        let mut tables = self.tables.write().await;
        insert_product(&mut tables, input)
    }

    /// Inserts a user with a raw role string, so tests can provision unknown roles.
    pub async fn seed_user(
        &self,
        username: &str,
        password: &str,
        role: &str,
        branch: Option<&str>,
    ) -> User {
        let mut tables = self.tables.write().await;
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
            branch: branch.map(str::to_string),
        };
        tables.users.retain(|u| u.username != user.username);
        tables.users.push(user.clone());
        user
    }

    /// Number of stored products.
    pub async fn product_count(&self) -> usize {
        self.tables.read().await.products.len()
    }
}

fn insert_product(tables: &mut Tables, input: ProductInput) -> Product {
    tables.next_product_id += 1;
    let product = Product {
        id: tables.next_product_id,
        name: input.name,
        description: input.description,
        price: input.price,
        quantity: input.quantity,
        branch: input.branch,
    };
    tables.products.insert(product.id, product.clone());
    product
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .cloned())
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.users.iter_mut().find(|u| u.username == user.username) {
            existing.password = user.password;
            existing.role = user.role.as_str().to_string();
            existing.branch = user.branch;
            return Ok(existing.clone());
        }
        tables.next_user_id += 1;
        let created = User {
            id: tables.next_user_id,
            username: user.username,
            password: user.password,
            role: user.role.as_str().to_string(),
            branch: user.branch,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_all_products(&self) -> Result<Vec<Product>, sqlx::Error> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn get_products_by_branch(&self, branch: &str) -> Result<Vec<Product>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| p.belongs_to(branch))
            .cloned()
            .collect())
    }

    async fn get_products_outside_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| !p.belongs_to(branch))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: i32) -> Result<Option<Product>, sqlx::Error> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, input: ProductInput) -> Result<Product, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(insert_product(&mut tables, input))
    }

    async fn update_product(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<Option<Product>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            product.name = input.name;
            product.description = input.description;
            product.price = input.price;
            product.quantity = input.quantity;
            product.branch = input.branch;
            product.clone()
        }))
    }

    async fn delete_product(&self, id: i32) -> Result<bool, sqlx::Error> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }
}
