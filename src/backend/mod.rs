mod handlers;
mod routes;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use sqlx::{Pool, Sqlite};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
}

pub async fn run_server(pool: Pool<Sqlite>) -> anyhow::Result<()> {
    let state = AppState { db: pool };

    let app = Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
