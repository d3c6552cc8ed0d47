use std::env;

use migration::Migrator;

use crate::{prelude::*, store::Db, sv};

pub const SERVICE_NAME: &str = "aquamark-screen-api";

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  /// Replenish interval of the per-IP rate limiter, in seconds
  pub rate_limit_per_second: u64,
  pub rate_limit_burst: u32,
  pub restart_delay: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:licenses.db?mode=rwc"),
      port: 3000,

      rate_limit_per_second: 2,
      rate_limit_burst: 100,
      restart_delay: Duration::from_secs(5),
    }
  }
}

fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
  let value = env::var(name).ok()?;
  match value.trim().parse() {
    Ok(value) => Some(value),
    Err(_) => {
      warn!("Ignoring malformed {name}={value:?}");
      None
    }
  }
}

impl Config {
  pub fn from_env() -> Self {
    let default = Self::default();

    Self {
      database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),
      port: var("PORT").unwrap_or(default.port),
      rate_limit_per_second: var("RATE_LIMIT_PER_SECOND")
        .unwrap_or(default.rate_limit_per_second),
      rate_limit_burst: var("RATE_LIMIT_BURST")
        .unwrap_or(default.rate_limit_burst),
      restart_delay: default.restart_delay,
    }
  }
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub admission: sv::Admission,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let admission = sv::Admission::new(Arc::new(Db::new(db.clone())));

    Ok(Self { db, config, admission })
  }
}
