mod app;
mod auth;
mod comments;
mod config;
mod db;
mod error;
mod extract;
mod media;
mod pagination;
mod response;
mod state;
mod storage;
mod users;
mod videos;

#[cfg(test)]
mod testing;

use anyhow::Context;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "vidshare=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env().context("load configuration")?;
    let db = db::connect(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    let (host, port) = (config.host.clone(), config.port);
    let state = AppState::init(config, db).await?;
    app::serve(app::build_app(state), &host, port).await
}
