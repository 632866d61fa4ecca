use std::sync::Arc;

use api_rest::{router, AppState};
use medrec_core::{
    auth_algorithm_from_env_value, Connection, CoreConfig, LookupKey, MemoryStore, Role, User,
    DEFAULT_BCRYPT_COST, DEFAULT_TOKEN_TTL_MINUTES,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("api_rest=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;

    let store = Arc::new(
        MemoryStore::new()
            .with_unique_index("users", "email")
            .with_unique_index("users", "professional_id"),
    );
    Connection::initialise(store.clone())?;

    let state = AppState::new(&config, store);
    bootstrap_admin(&state)?;

    let addr = std::env::var("MEDREC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!("-- Starting medrec REST API on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn load_config() -> anyhow::Result<CoreConfig> {
    let auth_secret = std::env::var("AUTH_SECRET_KEY")
        .map_err(|_| anyhow::anyhow!("AUTH_SECRET_KEY must be set"))?;
    let auth_algorithm = auth_algorithm_from_env_value(std::env::var("AUTH_ALGORITHM").ok())?;
    let token_ttl_minutes = match std::env::var("AUTH_EXPIRE") {
        Ok(raw) => raw.parse()?,
        Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
    };
    let bcrypt_cost = match std::env::var("BCRYPT_COST") {
        Ok(raw) => raw.parse()?,
        Err(_) => DEFAULT_BCRYPT_COST,
    };

    Ok(CoreConfig::new(
        auth_secret,
        auth_algorithm,
        token_ttl_minutes,
        bcrypt_cost,
    )?)
}

/// Seed the first admin account from the environment, if configured and not
/// already present. Without it a fresh store has no account able to create
/// others.
fn bootstrap_admin(state: &AppState) -> anyhow::Result<()> {
    let (email, password) = match (
        std::env::var("MEDREC_ADMIN_EMAIL"),
        std::env::var("MEDREC_ADMIN_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => (email, password),
        _ => return Ok(()),
    };

    if state.users.get(LookupKey::Email(&email), true)?.is_some() {
        return Ok(());
    }

    let password_hash = state.credentials.hash(&password)?;
    let admin = User::new(
        email.clone(),
        password_hash,
        Role::Admin,
        "Admin".to_string(),
        "Admin".to_string(),
    );
    state.users.create(&admin)?;
    tracing::info!("bootstrapped admin account {email}");
    Ok(())
}
