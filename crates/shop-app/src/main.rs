use std::sync::Arc;

use shop_hex::config::Config;
use shop_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use shop_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / JWT_SECRET / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend_name(), "repository ready");

    let state = AppState::from_config(Arc::new(repo), &config);
    if let Some(seed) = &config.admin {
        state
            .users
            .ensure_admin("Admin", &seed.email, seed.password.clone())
            .await?;
    }

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };
    HttpServer::new(state, server_cfg).run().await
}
