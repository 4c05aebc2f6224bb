use std::env;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use medibook_backend::core::config::AppPaths;
use medibook_backend::core::logging::{self, Component};
use medibook_backend::server;
use medibook_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, Component::Server);

    tracing::info!("Starting medical chatbot");
    let state = AppState::initialize(paths).await?;

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.settings.server.port);
    let bind_addr = format!("{}:{}", state.settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);
    println!("Open: http://localhost:{}", addr.port());

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
