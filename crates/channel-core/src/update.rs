//! # Update coordinator
//!
//! Replaces a live configuration with a new document, all or nothing:
//!
//! ```text
//! Idle --stage--> Staging --validate--> Validating --commit--> Committed
//!                    |                      |
//!                    +------> Rejected <----+
//! ```
//!
//! Staging builds a shadow registry from the document. Validating checks
//! that every session made it into the shadow and that no channel would
//! move backwards against the live configuration. Commit produces the
//! successor registry; the live one is only ever read, so a rejected
//! update leaves nothing behind.

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::split_sessions;
use crate::error::{ExtractError, RegistryError, UpdateError};
use crate::registry::ChannelRegistry;

/// Update protocol states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateState {
    #[default]
    Idle,
    Staging,
    Validating,
    Committed,
    Rejected,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateState::Idle => "idle",
            UpdateState::Staging => "staging",
            UpdateState::Validating => "validating",
            UpdateState::Committed => "committed",
            UpdateState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// One session of the document that did not become a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFailure {
    /// Position of the session in the document, from 0
    pub index: usize,
    /// Session key, when the origin line got far enough to name one
    pub key: Option<String>,
    pub reason: String,
}

/// Outcome of an update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub sessions: u64,
    pub parsed: u64,
    pub syntax_errors: u64,
    pub validated: u64,
    pub validation_errors: u64,
    /// Channels older than the live channel on the same primary address
    pub stale: u64,
    /// Same version as the live channel but different content
    pub conflicting: u64,
    pub added: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub removed: u64,
    pub failures: Vec<SessionFailure>,
}

impl UpdateReport {
    /// Sessions that did not become channels
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.stale == 0 && self.conflicting == 0
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sessions ({} parsed, {} syntax errors, {} validated, {} validation errors), \
             {} failed, {} stale, {} conflicting; \
             {} added, {} updated, {} unchanged, {} removed",
            self.sessions,
            self.parsed,
            self.syntax_errors,
            self.validated,
            self.validation_errors,
            self.failed(),
            self.stale,
            self.conflicting,
            self.added,
            self.updated,
            self.unchanged,
            self.removed
        )
    }
}

/// Drives one update through the protocol states
#[derive(Debug, Default)]
pub struct UpdateCoordinator {
    state: UpdateState,
    shadow: Option<ChannelRegistry>,
    report: UpdateReport,
}

impl UpdateCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    pub fn report(&self) -> &UpdateReport {
        &self.report
    }

    /// Shadow registry built by the last stage, until commit or reject
    pub fn shadow(&self) -> Option<&ChannelRegistry> {
        self.shadow.as_ref()
    }

    /// Back to idle, dropping any shadow registry
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stage, validate and commit in one go
    pub fn run(live: &ChannelRegistry, document: &str) -> Result<(ChannelRegistry, UpdateReport), UpdateError> {
        let mut coordinator = Self::new();
        coordinator.stage(live, document)?;
        coordinator.validate(live)?;
        coordinator.commit(live)
    }

    /// Build the shadow registry from a document
    pub fn stage(&mut self, live: &ChannelRegistry, document: &str) -> Result<&UpdateReport, UpdateError> {
        self.expect_state("stage", UpdateState::Idle)?;
        self.state = UpdateState::Staging;

        let mut shadow = live.empty_like();
        let mut failures = Vec::new();
        for (index, text) in split_sessions(document).iter().enumerate() {
            match shadow.add_text(text) {
                Ok(handle) => debug!(session = index, %handle, "session staged"),
                Err(err) => failures.push(SessionFailure {
                    index,
                    key: failure_key(&err),
                    reason: err.to_string(),
                }),
            }
        }

        let counters = shadow.counters();
        self.report = UpdateReport {
            sessions: counters.sessions_seen,
            parsed: counters.sessions_parsed,
            syntax_errors: counters.syntax_errors,
            validated: counters.sessions_validated,
            validation_errors: counters.validation_errors,
            failures,
            ..Default::default()
        };
        self.shadow = Some(shadow);
        Ok(&self.report)
    }

    /// Check the shadow registry against the live one and mark the
    /// channels that replace a live channel
    pub fn validate(&mut self, live: &ChannelRegistry) -> Result<&UpdateReport, UpdateError> {
        self.expect_state("validate", UpdateState::Staging)?;
        self.state = UpdateState::Validating;

        if !self.report.failures.is_empty() {
            return Err(self.reject());
        }
        let Some(mut shadow) = self.shadow.take() else {
            return Err(self.reject());
        };

        let mut matched = HashSet::new();
        let handles: Vec<_> = shadow.handles().collect();
        for handle in handles {
            let Some(candidate) = shadow.get_mut(handle) else {
                continue;
            };
            let (addr, port) = candidate.primary_dest();
            // The primary map also indexes FEC streams
            let Some((live_handle, current)) = live
                .lookup_primary(addr, port)
                .and_then(|h| live.get_any(h).map(|channel| (h, channel)))
                .filter(|(_, channel)| channel.primary_dest() == (addr, port))
            else {
                self.report.added += 1;
                continue;
            };
            matched.insert(live_handle);
            candidate.used = true;

            if current.version > candidate.version {
                warn!(
                    session = %candidate.key,
                    live = current.version,
                    offered = candidate.version,
                    "stale channel version"
                );
                self.report.stale += 1;
            } else if current.version == candidate.version {
                if current.checksum != candidate.checksum {
                    warn!(
                        session = %candidate.key,
                        version = candidate.version,
                        "same version with different content"
                    );
                    self.report.conflicting += 1;
                } else {
                    self.report.unchanged += 1;
                }
            } else {
                self.report.updated += 1;
            }
        }
        self.report.removed = live.handles().filter(|h| !matched.contains(h)).count() as u64;

        let counters = shadow.counters_mut();
        counters.old_version_rejects = self.report.stale;
        counters.conflicting_version_rejects = self.report.conflicting;

        if self.report.stale > 0 || self.report.conflicting > 0 {
            return Err(self.reject());
        }
        self.shadow = Some(shadow);
        Ok(&self.report)
    }

    /// Build the successor of the live registry from the shadow. Handles
    /// issued by `live` never resolve in the result.
    pub fn commit(&mut self, live: &ChannelRegistry) -> Result<(ChannelRegistry, UpdateReport), UpdateError> {
        self.expect_state("commit", UpdateState::Validating)?;

        let Some(shadow) = self.shadow.take() else {
            return Err(self.reject());
        };

        let mut next = live.clone();
        next.destroy_all();
        for (_, channel) in shadow.channels() {
            if !channel.active {
                debug!(session = %channel.key, "inactive channel not committed");
                continue;
            }
            if let Err(err) = next.insert(channel.clone()) {
                self.state = UpdateState::Rejected;
                warn!("update rejected at commit: {}", err);
                return Err(UpdateError::Commit(err));
            }
        }
        next.set_counters(*shadow.counters());
        next.set_last_refresh(Utc::now());

        self.state = UpdateState::Committed;
        info!("update committed: {}", self.report);
        Ok((next, self.report.clone()))
    }

    fn expect_state(&self, operation: &'static str, expected: UpdateState) -> Result<(), UpdateError> {
        if self.state != expected {
            return Err(UpdateError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn reject(&mut self) -> UpdateError {
        self.state = UpdateState::Rejected;
        self.shadow = None;
        info!("update rejected: {}", self.report);
        UpdateError::Rejected(Box::new(self.report.clone()))
    }
}

fn failure_key(err: &RegistryError) -> Option<String> {
    match err {
        RegistryError::Extract(ExtractError::Validation { key, .. }) => key.clone(),
        RegistryError::AlreadyExists(key) | RegistryError::MapConflict { key, .. } => Some(key.clone()),
        _ => None,
    }
}
