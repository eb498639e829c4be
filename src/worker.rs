//! The ingestion worker: poll loop and per-file pipeline.
//!
//! Per discovered file: parse identity → extract metadata → resolve date →
//! plan destination → persist and move in one transaction. One bad file never
//! halts the scan; the loop only exits when the shared running flag clears.

use anyhow::{Context, Result};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::db::{IngestPayload, PhotoStore};
use crate::{dates, filename, metadata, planner};

/// State shared between the worker loop and the control surface. The worker
/// is the only writer of the counter, the control surface the only writer of
/// the flag; plain atomics are enough.
#[derive(Debug)]
pub struct WorkerState {
    running: AtomicBool,
    processed: AtomicU64,
}

impl WorkerState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            processed: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask the loop to exit after its current cycle. Cooperative: takes
    /// effect at the top of the next scan, not mid-file.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct IngestionWorker {
    inbox: PathBuf,
    photos_root: PathBuf,
    poll_interval: Duration,
    store: PhotoStore,
    state: Arc<WorkerState>,
}

impl IngestionWorker {
    pub fn new(config: &Config, store: PhotoStore, state: Arc<WorkerState>) -> Self {
        Self {
            inbox: config.inbox_dir.clone(),
            photos_root: config.photos_root.clone(),
            poll_interval: config.poll_interval(),
            store,
            state,
        }
    }

    /// Run until the running flag clears. Per-file failures are logged and
    /// skipped; only a missing photos root stops the loop before it starts.
    pub fn run(&self) {
        if let Err(e) = std::fs::create_dir_all(&self.photos_root) {
            error!(
                "cannot create photos root {}: {e}",
                self.photos_root.display()
            );
            return;
        }

        info!("worker loop started, watching {}", self.inbox.display());

        while self.state.is_running() {
            if self.inbox.is_dir() {
                self.scan_once();
            }
            thread::sleep(self.poll_interval);
        }

        info!(
            "worker loop stopped after {} processed file(s)",
            self.state.processed()
        );
    }

    /// One pass over the inbox tree. Unreadable entries and dot-files are
    /// skipped; traversal order carries no guarantee.
    fn scan_once(&self) {
        for entry in WalkDir::new(&self.inbox)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let raw_name = entry.file_name().to_string_lossy().into_owned();
            if raw_name.starts_with('.') {
                continue;
            }

            match self.ingest(entry.path(), &raw_name) {
                Ok(relative_dir) => {
                    self.state.record_processed();
                    info!("processed {raw_name} into {}", relative_dir.display());
                }
                Err(e) => error!("failed to ingest {raw_name}: {e:#}"),
            }
        }
    }

    /// Full pipeline for one file. On success the file has been moved into
    /// the photos tree and its rows committed; on failure it stays in the
    /// inbox for the next scan to retry.
    fn ingest(&self, source: &Path, raw_name: &str) -> Result<PathBuf> {
        let identity = filename::parse(raw_name);
        let meta = metadata::extract(source);

        let fs_meta = std::fs::metadata(source).context("reading file metadata")?;
        let modified = fs_meta.modified().context("reading modification time")?;
        let file_datetime = dates::resolve(meta.captured_at, &identity.clean_name, modified);

        let relative = source
            .strip_prefix(&self.inbox)
            .context("source is outside the inbox")?;
        let plan = planner::plan(&self.photos_root, relative, &identity.clean_name)
            .context("planning destination")?;

        let payload = IngestPayload {
            file_name: identity.clean_name,
            relative_dir: plan.relative_dir.clone(),
            full_path: plan.destination.clone(),
            owner: identity.owner,
            file_size: fs_meta.len(),
            file_datetime,
            metadata: meta,
        };

        // The move runs inside the transaction as its final success
        // criterion: rows first, rename before commit. If the commit still
        // fails after the rename, the file goes back to the inbox so no
        // orphan can exist in the photos tree without its rows.
        let moved = Cell::new(false);
        let stored = self.store.store(&payload, || {
            planner::move_into_place(source, &plan.destination)?;
            moved.set(true);
            Ok(())
        });

        match stored {
            Ok(_picture_id) => Ok(plan.relative_dir),
            Err(e) => {
                if moved.get() {
                    // Same transfer mechanics as the forward move, so the
                    // undo also survives a cross-filesystem photos root.
                    if let Err(undo) = planner::transfer(&plan.destination, source) {
                        warn!(
                            "could not return {} to the inbox: {undo}",
                            plan.destination.display()
                        );
                    }
                }
                Err(e.context("persisting"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_starts_running_with_zero_processed() {
        let state = WorkerState::new();
        assert!(state.is_running());
        assert_eq!(state.processed(), 0);
    }

    #[test]
    fn test_stop_clears_the_flag() {
        let state = WorkerState::new();
        state.stop();
        assert!(!state.is_running());
    }

    #[test]
    fn test_processed_counter_increments() {
        let state = WorkerState::new();
        state.record_processed();
        state.record_processed();
        assert_eq!(state.processed(), 2);
    }
}
