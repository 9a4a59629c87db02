use axum::Router;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::{config::Config, errors::Result, state::AppState};

pub mod analysis;
pub mod config;
pub mod consts;
pub mod errors;
pub mod hierarchy;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    tracing::subscriber::set_global_default(FmtSubscriber::default())
        .map_err(|e| errors::Error::Config(e.to_string()))?;

    let config = Config::from_env()?;
    let state = AppState::init(&config).await?;

    info!("Starting server");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Serving MotiveMapper at http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/auth", routes::auth::router(state.clone()))
        .nest("/admin", routes::admin::router(state.clone()))
        .nest("/analysis", routes::analysis::router(state.clone()))
        .with_state(state)
}
