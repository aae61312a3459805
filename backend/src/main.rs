use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_backend::api::router;
use school_backend::config::AppConfig;
use school_backend::db::MIGRATOR;
use school_backend::llm::HttpLanguageModel;
use school_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "school_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let options = config
        .database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    if config.llm.primary.is_none() && config.llm.fallback.is_none() {
        warn!("no language model source configured; extraction requests will fail");
    }
    let model = HttpLanguageModel::new(config.llm.clone())?;

    let bind_addr = config.bind_addr;
    let state = AppState {
        db: pool.clone(),
        model: Arc::new(model),
        config: Arc::new(config),
    };

    let app = router(state);

    info!("listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
