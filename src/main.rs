// src/main.rs

use std::sync::Arc;

use assessment_engine::config::Config;
use assessment_engine::routes;
use assessment_engine::state::AppState;
use assessment_engine::store::PgStore;
use assessment_engine::utils::clock::SystemClock;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env is read first, if present)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store = PgStore::connect(&config).await?;

    store.migrate().await?;

    let addr = config.bind_addr();
    let state = AppState::new(store, Arc::new(SystemClock), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
