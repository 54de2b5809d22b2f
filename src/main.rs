use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xplay::auth::InMemoryPhoneVerifier;
use xplay::{build_router, AppConfig, AppState, Stores};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xplay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting XPlay challenge server");

    let config = AppConfig::from_env();

    let stores = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using PostgreSQL stores");
            Stores::postgres(pool)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory stores");
            Stores::in_memory()
        }
    };

    let verifier = Arc::new(InMemoryPhoneVerifier::new(
        config.verification_code_ttl_secs,
    ));

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, stores, verifier);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
