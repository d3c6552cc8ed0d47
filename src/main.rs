//! Seat admission server
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for HTTP API with rate limiting
//! - Tokio for async runtime

mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod store;
mod sv;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "admission=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  info!("Starting Admission Server v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(Config::from_env()).await?);

  plugins::Supervisor::new().register(plugins::server::Plugin).run(app).await;

  Ok(())
}
