pub mod server;

use tokio::task::JoinSet;

use crate::{prelude::*, state::AppState};

#[async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Runs every registered plugin, restarting the ones that stop or crash.
#[derive(Default)]
pub struct Supervisor {
  plugins: Vec<Arc<dyn Plugin>>,
}

impl Supervisor {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Blocks until ctrl-c, then aborts all plugins.
  pub async fn run(self, app: Arc<AppState>) {
    let mut tasks = JoinSet::new();

    for plugin in self.plugins {
      tasks.spawn(supervise(plugin, app.clone()));
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
      error!("Failed to listen for shutdown signal: {err}");
    }

    info!("SYSTEM: Shutting down {} plugin(s)", tasks.len());
    tasks.shutdown().await;
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) {
  let name = plugin.name();
  let delay = app.config.restart_delay;
  info!("SYSTEM: Plugin `{name}` initialized");

  loop {
    let handle = tokio::spawn({
      let plugin = plugin.clone();
      let app = app.clone();
      async move { plugin.start(app).await }
    });

    match handle.await {
      Ok(Ok(())) => warn!("Plugin `{name}` stopped unexpectedly (Ok)."),
      Ok(Err(err)) => error!("Plugin `{name}` crashed with error: {err:#}."),
      Err(err) if err.is_cancelled() => {
        info!("Plugin `{name}` shutdown.");
        break;
      }
      Err(_) => error!("Plugin `{name}` PANICKED!"),
    }

    time::sleep(delay).await;
    info!("SYSTEM: Restarting plugin `{name}`...");
  }
}
