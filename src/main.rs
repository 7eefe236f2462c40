use branch_inventory::{
    AppState, MemorySessionStore, PostgresRepository, RepositoryState, SessionState,
    config::{AppConfig, Env},
    create_router,
    models::{NewUser, Role},
};
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database and the session store, then serves
/// HTTP until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 1. Configuration (.env first, so it can feed AppConfig::load).
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging. RUST_LOG wins; otherwise verbose defaults for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "branch_inventory=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database: pool, then schema migrations.
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.db_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Out-of-band provisioning of the first admin account.
    if let Some(admin) = &config.bootstrap_admin {
        let user = repo
            .upsert_user(NewUser {
                username: admin.username.clone(),
                password: admin.password.clone(),
                role: Role::Admin,
                branch: None,
            })
            .await?;
        tracing::info!(username = %user.username, "bootstrap admin account ready");
    }

    // 5. Sessions live in process memory.
    let sessions = Arc::new(MemorySessionStore::new()) as SessionState;

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        repo,
        sessions,
        config,
    });

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
