//! Channel manager
//!
//! Holds the live registry as an immutable snapshot. Readers clone the
//! `Arc` and keep a consistent view for as long as they like; an update
//! builds the successor off to the side and swaps it in with one write.
//! Updates are serialized by their own lock so readers never wait on
//! staging.

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::channel::{ChannelCfg, SessionIdentity};
use crate::config::RegistryConfig;
use crate::document::render_document;
use crate::error::{PersistError, UpdateError, ValidationError};
use crate::handle::ChannelHandle;
use crate::registry::ChannelRegistry;
use crate::update::{UpdateCoordinator, UpdateReport};

/// Owner of the live channel configuration
#[derive(Debug)]
pub struct ChannelManager {
    config: RegistryConfig,
    live: RwLock<Arc<ChannelRegistry>>,
    /// Held for the whole of an update; keeps the last report
    update: Mutex<Option<UpdateReport>>,
}

impl ChannelManager {
    /// Manager with an empty live registry
    pub fn new(config: RegistryConfig) -> Self {
        let registry = ChannelRegistry::new(&config);
        Self {
            config,
            live: RwLock::new(Arc::new(registry)),
            update: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Current live registry
    pub fn snapshot(&self) -> Arc<ChannelRegistry> {
        self.live.read().clone()
    }

    /// Run a document through the update protocol and swap the result in
    pub fn apply_document(&self, document: &str) -> Result<UpdateReport, UpdateError> {
        let mut last = self.update.lock();
        let live = self.snapshot();

        match UpdateCoordinator::run(&live, document) {
            Ok((next, report)) => {
                *self.live.write() = Arc::new(next);
                *last = Some(report.clone());
                Ok(report)
            }
            Err(err) => {
                if let Some(report) = err.report() {
                    *last = Some(report.clone());
                }
                Err(err)
            }
        }
    }

    /// Load a persisted channel file as an update
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<UpdateReport, PersistError> {
        let path = path.as_ref();
        let document = fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let report = self.apply_document(&document)?;
        info!(path = %path.display(), "loaded {}", report);
        Ok(report)
    }

    /// The live configuration in persisted form
    pub fn render(&self) -> String {
        render_document(&self.snapshot(), Utc::now())
    }

    /// Write the live configuration to a file
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Report of the last update, committed or rejected
    pub fn last_report(&self) -> Option<UpdateReport> {
        self.update.lock().clone()
    }

    /// Active channel behind a handle
    pub fn channel(&self, handle: ChannelHandle) -> Option<ChannelCfg> {
        self.snapshot().get(handle).cloned()
    }

    /// Channel named by an `o=` identity token
    pub fn find_by_identity(&self, token: &str) -> Result<Option<(ChannelHandle, ChannelCfg)>, ValidationError> {
        let identity: SessionIdentity = token.parse()?;
        let snapshot = self.snapshot();
        Ok(snapshot
            .find_by_identity(&identity)
            .and_then(|handle| snapshot.get(handle).map(|channel| (handle, channel.clone()))))
    }

    /// Channel whose primary or FEC stream uses (address, port)
    pub fn lookup_primary(&self, addr: Ipv4Addr, port: u16) -> Option<(ChannelHandle, ChannelCfg)> {
        let snapshot = self.snapshot();
        snapshot
            .lookup_primary(addr, port)
            .and_then(|handle| snapshot.get(handle).map(|channel| (handle, channel.clone())))
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
