//! Configuration file watcher for hot reload of the response definition.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_config;
use crate::handler::StaticResponseGenerator;

/// Reloads `[response]` into a live generator whenever the file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    generator: Arc<StaticResponseGenerator>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, generator: Arc<StaticResponseGenerator>) -> Self {
        Self {
            path: path.to_path_buf(),
            generator,
        }
    }

    /// Apply the file's current contents. Invalid files leave the live
    /// response untouched.
    pub fn reload(&self) -> bool {
        match load_config(&self.path) {
            Ok(config) => match config.response {
                Some(response) => {
                    self.generator.update(response);
                    true
                }
                None => false,
            },
            Err(e) => {
                tracing::error!(
                    path = ?self.path,
                    error = %e,
                    "Failed to reload config, keeping current response"
                );
                false
            }
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn spawn(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!("Config file change detected, reloading...");
                    self.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
