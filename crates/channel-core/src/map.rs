//! Channel map: uniqueness index over (address, port)
//!
//! A fixed set of hash chains. The bucket is picked from the IPv4 address
//! alone, so every port of one multicast group lands in the same chain;
//! lookups compare both fields.
//!
//! A registry keeps two maps: one over primary and FEC destinations, one
//! over the feedback target and retransmission endpoints. The key sets a
//! channel claims in each map are listed by [`primary_keys`] and
//! [`feedback_keys`].

use std::net::Ipv4Addr;

use crate::channel::ChannelCfg;
use crate::error::MapError;
use crate::handle::ChannelHandle;

/// Bucket count used when none is configured
pub const DEFAULT_BUCKETS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MapEntry {
    addr: Ipv4Addr,
    port: u16,
    handle: ChannelHandle,
}

/// Hash-chained (address, port) index
#[derive(Debug, Clone)]
pub struct ChannelMap {
    buckets: Vec<Vec<MapEntry>>,
    len: usize,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

impl ChannelMap {
    /// Create a map with `buckets` chains (at least one)
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); buckets.max(1)],
            len: 0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Chain an address hashes to
    pub fn bucket_of(&self, addr: Ipv4Addr) -> usize {
        (u32::from(addr) as usize) % self.buckets.len()
    }

    /// Add a key. Fails on port 0 or when the key is already present.
    pub fn insert(&mut self, addr: Ipv4Addr, port: u16, handle: ChannelHandle) -> Result<(), MapError> {
        if port == 0 {
            return Err(MapError::ZeroPort(addr));
        }
        let bucket = self.bucket_of(addr);
        let chain = &mut self.buckets[bucket];
        if chain.iter().any(|e| e.addr == addr && e.port == port) {
            return Err(MapError::Duplicate { addr, port });
        }
        chain.push(MapEntry { addr, port, handle });
        self.len += 1;
        Ok(())
    }

    /// Insert a channel's whole key sequence. On failure every key this
    /// call added is removed again before the error is returned.
    pub fn insert_all(&mut self, keys: &[(Ipv4Addr, u16)], handle: ChannelHandle) -> Result<(), MapError> {
        for (done, &(addr, port)) in keys.iter().enumerate() {
            if let Err(err) = self.insert(addr, port, handle) {
                for &(addr, port) in &keys[..done] {
                    self.remove(addr, port);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Remove a key; absent keys are ignored
    pub fn remove(&mut self, addr: Ipv4Addr, port: u16) {
        let bucket = self.bucket_of(addr);
        let chain = &mut self.buckets[bucket];
        if let Some(pos) = chain.iter().position(|e| e.addr == addr && e.port == port) {
            chain.swap_remove(pos);
            self.len -= 1;
        }
    }

    /// Remove every key in the sequence
    pub fn remove_all(&mut self, keys: &[(Ipv4Addr, u16)]) {
        for &(addr, port) in keys {
            self.remove(addr, port);
        }
    }

    pub fn lookup(&self, addr: Ipv4Addr, port: u16) -> Option<ChannelHandle> {
        self.buckets[self.bucket_of(addr)]
            .iter()
            .find(|e| e.addr == addr && e.port == port)
            .map(|e| e.handle)
    }

    pub fn contains(&self, addr: Ipv4Addr, port: u16) -> bool {
        self.lookup(addr, port).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        for chain in &mut self.buckets {
            chain.clear();
        }
        self.len = 0;
    }
}

/// Keys a channel claims in the primary map: the primary RTP and RTCP
/// ports, then each FEC stream's RTP and RTCP ports.
pub fn primary_keys(channel: &ChannelCfg) -> Vec<(Ipv4Addr, u16)> {
    let mut keys = Vec::with_capacity(6);
    let primary = &channel.primary.endpoint;
    keys.extend(primary.ports().map(|port| (primary.addr, port)));
    for fec in [&channel.fec1, &channel.fec2].into_iter().flatten() {
        keys.extend(fec.ports().map(|port| (fec.addr, port)));
    }
    keys
}

/// Keys a channel claims in the feedback map: the feedback target with
/// the primary RTCP port, then the retransmission RTP and RTCP ports.
pub fn feedback_keys(channel: &ChannelCfg) -> Vec<(Ipv4Addr, u16)> {
    let mut keys = Vec::with_capacity(3);
    if let (Some(fbt), Some(rtcp)) = (channel.fbt_addr, channel.primary.endpoint.rtcp_port) {
        keys.push((fbt, rtcp));
    }
    if let Some(rtx) = &channel.rtx {
        keys.extend(rtx.endpoint.ports().map(|port| (rtx.endpoint.addr, port)));
    }
    keys
}
