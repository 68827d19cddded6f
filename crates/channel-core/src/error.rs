//! Error types for channel validation, indexing and updates
//!
//! Errors are layered the same way the engine is: a session that fails
//! semantic checks yields a [`ValidationError`]; the accessor's syntax
//! failures and validation failures meet in [`ExtractError`]; the registry
//! adds its own conflicts in [`RegistryError`]; the update protocol wraps
//! everything in [`UpdateError`].

use std::net::Ipv4Addr;
use std::path::PathBuf;

use chancfg_sdp_core::SdpError;
use thiserror::Error;

use crate::channel::StreamKind;
use crate::handle::ChannelHandle;
use crate::update::{UpdateReport, UpdateState};

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// A well-formed session that violates the channel model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid session version {0:?}")]
    InvalidVersion(String),

    #[error("Unsupported network/address family: {net_type} {addr_type}")]
    UnsupportedAddressFamily { net_type: String, addr_type: String },

    #[error("Invalid IPv4 address {0:?}")]
    InvalidAddress(String),

    #[error("Invalid session identity {0:?}")]
    InvalidIdentity(String),

    #[error("Session start time must be 0, got {0}")]
    NonZeroStartTime(u64),

    #[error("Session has {count} media lines; {min} to {max} allowed")]
    MediaCount { count: usize, min: usize, max: usize },

    #[error("Media line {media}: expected exactly one payload type, got {count}")]
    PayloadTypeCount { media: usize, count: usize },

    #[error("Media line {media}: payload type {value:?} outside 96-127 and not 33")]
    InvalidPayloadType { media: usize, value: String },

    #[error("Media line {media}: {attribute} names payload type {found:?}, expected {expected}")]
    PayloadTypeMismatch {
        media: usize,
        attribute: &'static str,
        expected: u8,
        found: String,
    },

    #[error("Media line {media}: unsupported transport {protocol:?}")]
    UnsupportedTransport { media: usize, protocol: String },

    #[error("Media line {media}: no connection address")]
    MissingConnection { media: usize },

    #[error("Media line {media}: no rtpmap for payload type {payload_type}")]
    MissingEncoding { media: usize, payload_type: u8 },

    #[error("Media line {media}: unsupported encoding {encoding:?}")]
    UnsupportedEncoding { media: usize, encoding: String },

    #[error("Media line {media}: {reason}")]
    InvalidStream { media: usize, reason: &'static str },

    #[error("More than one {0} stream")]
    DuplicateStream(StreamKind),

    #[error("No primary (MP2T) stream")]
    MissingPrimary,

    #[error("{stream} stream address {addr} is not multicast")]
    NotMulticast { stream: StreamKind, addr: Ipv4Addr },

    #[error("{stream} stream: {reason}")]
    InvalidPort { stream: StreamKind, reason: &'static str },

    #[error("{stream} stream: invalid {attribute} value {value:?}")]
    InvalidAttribute {
        stream: StreamKind,
        attribute: &'static str,
        value: String,
    },

    #[error("{stream} stream: b={bw_type} not allowed")]
    BandwidthNotAllowed { stream: StreamKind, bw_type: String },

    #[error("{stream} stream: b={bw_type}:{value} out of range")]
    InvalidBandwidth {
        stream: StreamKind,
        bw_type: String,
        value: u64,
    },

    #[error("{stream} stream: exclusive source filters are not supported")]
    SourceFilterExcluded { stream: StreamKind },

    #[error("{stream} stream: source filter names {found}, connection address is {expected}")]
    SourceFilterMismatch {
        stream: StreamKind,
        expected: Ipv4Addr,
        found: Ipv4Addr,
    },

    #[error("Unsupported rtcp-unicast mode {0:?}")]
    InvalidFeedbackMode(String),

    #[error("Retransmission fmtp has no apt parameter")]
    MissingApt,

    #[error("Retransmission apt={found} does not match repaired payload type {expected}")]
    AptMismatch { expected: u8, found: u8 },

    #[error("Unsupported direction combination: primary {primary}, re-sourced {resourced}, retransmission {retransmission}")]
    UnsupportedDirections {
        primary: String,
        resourced: String,
        retransmission: String,
    },

    #[error("Missing a=group:{0} line")]
    MissingGroup(&'static str),

    #[error("More than one a=group:{0} line")]
    DuplicateGroup(String),

    #[error("a=group:FID given without a retransmission stream")]
    GroupWithoutRetransmission,

    #[error("a=group:FEC given without FEC streams")]
    GroupWithoutFec,

    #[error("a=group:{semantics} lists {found:?}, expected {expected:?}")]
    GroupMismatch {
        semantics: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{0} stream has no a=mid")]
    MissingMid(StreamKind),

    #[error("a=mid:{0} used by more than one stream")]
    DuplicateMid(String),

    #[error("{first} and {second} streams collide on port {port}")]
    PortConflict {
        first: StreamKind,
        second: StreamKind,
        port: u16,
    },

    #[error("{0} stream uses one port for RTP and RTCP")]
    RtpRtcpPortEqual(StreamKind),

    #[error("{stream} stream: a=rtcp address {rtcp} differs from connection address {connection}")]
    RtcpAddressMismatch {
        stream: StreamKind,
        rtcp: Ipv4Addr,
        connection: Ipv4Addr,
    },

    #[error("Feedback target {fbt} differs from retransmission address {rtx}")]
    FeedbackTargetMismatch { fbt: Ipv4Addr, rtx: Ipv4Addr },

    #[error("Active video access node channel needs b=AS, b=RS or b=RR on the primary")]
    MissingBandwidth,
}

/// Why a session text did not become a channel record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The text is not valid SDP
    #[error("Syntax error: {0}")]
    Syntax(#[from] SdpError),

    /// Valid SDP that fails semantic validation
    #[error("Session {}: {source}", .key.as_deref().unwrap_or("<unknown>"))]
    Validation {
        key: Option<String>,
        source: ValidationError,
    },
}

impl ExtractError {
    pub fn validation(key: Option<String>, source: ValidationError) -> Self {
        Self::Validation { key, source }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ExtractError::Syntax(_))
    }
}

/// Uniqueness index rejections
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    #[error("Port 0 cannot be indexed ({0})")]
    ZeroPort(Ipv4Addr),

    #[error("{addr}:{port} already in use")]
    Duplicate { addr: Ipv4Addr, port: u16 },
}

/// Registry-level conflicts and failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Channel {0} already exists")]
    AlreadyExists(String),

    #[error("Channel capacity of {0} reached")]
    CapacityExceeded(usize),

    #[error("Channel {key}: {source}")]
    MapConflict { key: String, source: MapError },

    #[error("Unknown channel handle {0}")]
    UnknownHandle(ChannelHandle),
}

impl RegistryError {
    pub fn map_conflict(key: impl Into<String>, source: MapError) -> Self {
        Self::MapConflict {
            key: key.into(),
            source,
        }
    }
}

/// Update protocol failures. None of them changes the live registry.
#[derive(Error, Debug, Clone)]
pub enum UpdateError {
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: UpdateState,
    },

    #[error("Update rejected: {0}")]
    Rejected(Box<UpdateReport>),

    #[error("Commit failed: {0}")]
    Commit(#[from] RegistryError),
}

impl UpdateError {
    /// The report of a rejected update
    pub fn report(&self) -> Option<&UpdateReport> {
        match self {
            UpdateError::Rejected(report) => Some(report),
            _ => None,
        }
    }
}

/// Loading or saving a persisted channel file
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Invalid engine configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid channel type {0:?}; expected linear or vod")]
    InvalidChannelType(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid registry setting: {0}")]
    InvalidSetting(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
