//! # Channel registry
//!
//! Owns every channel of one configuration snapshot together with its
//! indices:
//!
//! - an ordered slot list of handles; deleting a channel leaves its slot
//!   vacant for the next insert instead of compacting
//! - a session-key index
//! - the primary map over primary and FEC (address, port) pairs
//! - the feedback map over feedback target and retransmission pairs
//!
//! A registry is a plain value. Concurrent readers are served by
//! [`crate::manager::ChannelManager`], which swaps whole registries.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use chancfg_sdp_core::{SdpSession, SessionAccessor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::channel::{ChannelCfg, ChannelType, SessionIdentity, SessionKey};
use crate::config::RegistryConfig;
use crate::error::{ExtractError, RegistryError, Result};
use crate::extract::extract_channel;
use crate::handle::{ChannelHandle, HandleArena};
use crate::map::{feedback_keys, primary_keys, ChannelMap};

/// Running counters of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistryCounters {
    /// Session texts offered
    pub sessions_seen: u64,
    /// Sessions that parsed as SDP
    pub sessions_parsed: u64,
    pub syntax_errors: u64,
    /// Sessions that passed semantic validation
    pub sessions_validated: u64,
    pub validation_errors: u64,
    /// Validated sessions refused by the registry (duplicate key,
    /// address/port conflict, capacity)
    pub registry_conflicts: u64,
    pub old_version_rejects: u64,
    pub conflicting_version_rejects: u64,
}

/// All channels of one configuration snapshot
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channel_type: ChannelType,
    max_channels: usize,
    arena: HandleArena<ChannelCfg>,
    slots: Vec<Option<ChannelHandle>>,
    by_key: HashMap<SessionKey, ChannelHandle>,
    primary_map: ChannelMap,
    feedback_map: ChannelMap,
    counters: RegistryCounters,
    last_refresh: Option<DateTime<Utc>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}

impl ChannelRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            channel_type: config.channel_type,
            max_channels: config.max_channels,
            arena: HandleArena::new(),
            slots: Vec::new(),
            by_key: HashMap::new(),
            primary_map: ChannelMap::new(config.map_buckets),
            feedback_map: ChannelMap::new(config.map_buckets),
            counters: RegistryCounters::default(),
            last_refresh: None,
        }
    }

    /// An empty registry with the same settings
    pub fn empty_like(&self) -> Self {
        Self::new(&self.config())
    }

    pub fn config(&self) -> RegistryConfig {
        RegistryConfig {
            channel_type: self.channel_type,
            max_channels: self.max_channels,
            map_buckets: self.primary_map.bucket_count(),
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Parse one session text and add it. Syntax and validation failures
    /// are counted separately.
    pub fn add_text(&mut self, text: &str) -> Result<ChannelHandle> {
        self.counters.sessions_seen += 1;
        let session = match SdpSession::parse(text) {
            Ok(session) => session,
            Err(err) => {
                self.counters.syntax_errors += 1;
                warn!("session rejected: {}", err);
                return Err(ExtractError::Syntax(err).into());
            }
        };
        self.counters.sessions_parsed += 1;
        self.add_parsed(&session)
    }

    /// Validate an already parsed session and add it
    pub fn add<A: SessionAccessor + ?Sized>(&mut self, session: &A) -> Result<ChannelHandle> {
        self.counters.sessions_seen += 1;
        self.counters.sessions_parsed += 1;
        self.add_parsed(session)
    }

    fn add_parsed<A: SessionAccessor + ?Sized>(&mut self, session: &A) -> Result<ChannelHandle> {
        let extraction = match extract_channel(session, self.channel_type) {
            Ok(extraction) => extraction,
            Err(err) => {
                self.counters.validation_errors += 1;
                warn!("session rejected: {}", err);
                return Err(err.into());
            }
        };
        self.counters.sessions_validated += 1;

        self.insert(extraction.channel).map_err(|err| {
            self.counters.registry_conflicts += 1;
            warn!("channel not added: {}", err);
            err
        })
    }

    /// Add a validated channel, taking the first vacant slot if there is
    /// one. Index insertions are all-or-nothing.
    pub fn insert(&mut self, mut channel: ChannelCfg) -> Result<ChannelHandle> {
        if self.by_key.contains_key(&channel.key) {
            return Err(RegistryError::AlreadyExists(channel.key.to_string()));
        }
        if self.len() >= self.max_channels {
            return Err(RegistryError::CapacityExceeded(self.max_channels));
        }

        let primary = primary_keys(&channel);
        let feedback = feedback_keys(&channel);
        let key = channel.key.clone();
        channel.used = false;
        let handle = self.arena.allocate(channel);

        if let Err(err) = self.primary_map.insert_all(&primary, handle) {
            self.arena.release(handle);
            return Err(RegistryError::map_conflict(key.to_string(), err));
        }
        if let Err(err) = self.feedback_map.insert_all(&feedback, handle) {
            self.primary_map.remove_all(&primary);
            self.arena.release(handle);
            return Err(RegistryError::map_conflict(key.to_string(), err));
        }

        debug!(session = %key, %handle, "channel added");
        self.by_key.insert(key, handle);
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(handle),
            None => self.slots.push(Some(handle)),
        }
        Ok(handle)
    }

    /// Remove a channel. With `unindex` false the indices are left alone,
    /// for callers that clear them wholesale.
    pub fn delete(&mut self, handle: ChannelHandle, unindex: bool) -> Result<ChannelCfg> {
        let channel = self
            .arena
            .release(handle)
            .ok_or(RegistryError::UnknownHandle(handle))?;

        if unindex {
            self.primary_map.remove_all(&primary_keys(&channel));
            self.feedback_map.remove_all(&feedback_keys(&channel));
            self.by_key.remove(&channel.key);
        }
        if let Some(slot) = self.slots.iter_mut().find(|slot| **slot == Some(handle)) {
            *slot = None;
        }
        debug!(session = %channel.key, %handle, "channel deleted");
        Ok(channel)
    }

    /// Delete every channel and clear the indices. Slots stay allocated
    /// (all vacant) and handles issued so far never resolve again.
    pub fn destroy_all(&mut self) {
        for handle in self.slots.iter().flatten().copied().collect::<Vec<_>>() {
            // Handles in occupied slots are always live
            let _ = self.delete(handle, false);
        }
        self.primary_map.clear();
        self.feedback_map.clear();
        self.by_key.clear();
    }

    /// Active channel behind a handle. Inactive channels stay resident
    /// but are not returned.
    pub fn get(&self, handle: ChannelHandle) -> Option<&ChannelCfg> {
        self.arena.resolve(handle).filter(|c| c.active)
    }

    /// Channel behind a handle, active or not
    pub fn get_any(&self, handle: ChannelHandle) -> Option<&ChannelCfg> {
        self.arena.resolve(handle)
    }

    pub(crate) fn get_mut(&mut self, handle: ChannelHandle) -> Option<&mut ChannelCfg> {
        self.arena.resolve_mut(handle)
    }

    pub fn find_by_key(&self, key: &SessionKey) -> Option<ChannelHandle> {
        self.by_key.get(key).copied()
    }

    /// Look a channel up by an `o=` identity token; the version is ignored
    pub fn find_by_identity(&self, identity: &SessionIdentity) -> Option<ChannelHandle> {
        self.find_by_key(&identity.key)
    }

    /// Channel owning a primary or FEC (address, port)
    pub fn lookup_primary(&self, addr: Ipv4Addr, port: u16) -> Option<ChannelHandle> {
        self.primary_map.lookup(addr, port)
    }

    /// Channel owning a feedback target or retransmission (address, port)
    pub fn lookup_feedback(&self, addr: Ipv4Addr, port: u16) -> Option<ChannelHandle> {
        self.feedback_map.lookup(addr, port)
    }

    /// Occupied slots in order
    pub fn handles(&self) -> impl Iterator<Item = ChannelHandle> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Every resident channel in slot order, active or not
    pub fn channels(&self) -> impl Iterator<Item = (ChannelHandle, &ChannelCfg)> + '_ {
        self.handles()
            .filter_map(|handle| self.arena.resolve(handle).map(|channel| (handle, channel)))
    }

    /// Number of slots, occupied or vacant
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counters(&self) -> &RegistryCounters {
        &self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut RegistryCounters {
        &mut self.counters
    }

    pub(crate) fn set_counters(&mut self, counters: RegistryCounters) {
        self.counters = counters;
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn set_last_refresh(&mut self, at: DateTime<Utc>) {
        self.last_refresh = Some(at);
    }
}
