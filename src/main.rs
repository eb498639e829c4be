use anyhow::{Context, Result};
use std::sync::Arc;
use std::thread;
use tracing::info;

use photoinbox::config::Config;
use photoinbox::db::PhotoStore;
use photoinbox::worker::{IngestionWorker, WorkerState};
use photoinbox::{logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let config = Config::from_env();
    info!(
        "ingesting from {} into {}",
        config.inbox_dir.display(),
        config.photos_root.display()
    );

    let store = PhotoStore::connect(&config).context("connecting to postgres")?;
    store.initialize().context("applying database schema")?;

    let state = Arc::new(WorkerState::new());
    let worker = IngestionWorker::new(&config, store, state.clone());
    let worker_thread = thread::spawn(move || worker.run());

    server::start(&config.bind_addr, state.clone()).await?;

    // The control surface is down; make sure the loop winds down too.
    state.stop();
    if worker_thread.join().is_err() {
        anyhow::bail!("worker thread panicked");
    }

    Ok(())
}
