//! MAFFA website backend.
//!
//! Run with:
//!   DATABASE_URL=sqlite://maffa.db DATABASE_NAME=maffa RUST_LOG=info cargo run
//!
//! Try:
//!   curl http://localhost:8000/api/gigs?limit=5
//!   curl -X POST http://localhost:8000/api/contact \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Ada","email":"ada@example.com","message":"Book us!"}'
//!   curl http://localhost:8000/test

use anyhow::Context;
use maffa_api::api::{AppState, create_router};
use maffa_api::{Config, Server, store};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("reading configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let store = store::connect(&config);
    info!(addr = %config.addr(), database = store.is_some(), "starting MAFFA API");

    let app = create_router(AppState { store, config: config.clone() });
    Server::bind(config.addr()).serve(app).await.context("serving HTTP")?;
    Ok(())
}
