//! Channel record model
//!
//! One [`ChannelCfg`] describes a provisioned distribution channel: its
//! identity, its resolved role and mode, and every sub-stream the session
//! description declared.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::key::SessionKey;
use crate::error::ConfigError;

/// Payload type fixed to MPEG-2 transport streams by RFC 3551
pub const MP2T_STATIC_PAYLOAD_TYPE: u8 = 33;

/// Dynamic payload type range
pub const DYNAMIC_PAYLOAD_TYPES: std::ops::RangeInclusive<u8> = 96..=127;

/// Which flavour of channel a registry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Broadcast channel; every distribution stream is multicast
    #[default]
    Linear,
    /// On-demand content; a unicast primary is allowed
    Vod,
}

impl ChannelType {
    /// Fewest media lines a session of this type may carry
    pub fn min_media_lines(self) -> usize {
        match self {
            ChannelType::Linear => 1,
            ChannelType::Vod => 2,
        }
    }

    /// Most media lines any session may carry
    pub const MAX_MEDIA_LINES: usize = 5;
}

impl FromStr for ChannelType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(ChannelType::Linear),
            "vod" => Ok(ChannelType::Vod),
            _ => Err(ConfigError::InvalidChannelType(s.to_string())),
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Linear => write!(f, "linear"),
            ChannelType::Vod => write!(f, "vod"),
        }
    }
}

/// Which box in the distribution tree this configuration is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelRole {
    DistributionSource,
    VideoAccessNode,
    SetTop,
    #[default]
    Unspecified,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelRole::DistributionSource => "distribution-source",
            ChannelRole::VideoAccessNode => "video-access-node",
            ChannelRole::SetTop => "set-top",
            ChannelRole::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

/// How repair traffic is arranged for the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelMode {
    /// Original stream is sent out, nothing repaired here
    Distribution,
    /// Repair is served from a re-sourced copy of the stream
    Source,
    /// Repair is served from the original stream
    Lookaside,
    /// Plain reception, no repair
    RecvOnly,
    #[default]
    Unspecified,
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelMode::Distribution => "distribution",
            ChannelMode::Source => "source",
            ChannelMode::Lookaside => "lookaside",
            ChannelMode::RecvOnly => "receive-only",
            ChannelMode::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

/// Transport named on an m= line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Raw datagrams, no RTCP
    Udp,
    /// RTP/AVP
    Rtp,
    /// RTP/AVPF, feedback capable
    RtpFeedback,
}

impl TransportKind {
    /// Map an SDP protocol token onto a transport
    pub fn from_protocol(protocol: &str) -> Option<Self> {
        match protocol {
            "udp" | "UDP" => Some(TransportKind::Udp),
            "RTP/AVP" => Some(TransportKind::Rtp),
            "RTP/AVPF" => Some(TransportKind::RtpFeedback),
            _ => None,
        }
    }

    /// Protocol token written back on an m= line
    pub fn protocol(self) -> &'static str {
        match self {
            TransportKind::Udp => "udp",
            TransportKind::Rtp => "RTP/AVP",
            TransportKind::RtpFeedback => "RTP/AVPF",
        }
    }

    pub fn is_rtp(self) -> bool {
        !matches!(self, TransportKind::Udp)
    }
}

/// Position of a stream within the channel topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamKind {
    Primary,
    Resourced,
    Retransmission,
    Fec1,
    Fec2,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::Primary => "primary",
            StreamKind::Resourced => "re-sourced",
            StreamKind::Retransmission => "retransmission",
            StreamKind::Fec1 => "fec1",
            StreamKind::Fec2 => "fec2",
        };
        f.write_str(name)
    }
}

/// Direction attribute found on a media section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    SendOnly,
    RecvOnly,
    SendRecv,
    Inactive,
    /// No direction attribute at all
    #[default]
    Unset,
}

impl StreamDirection {
    /// Only one-way streams count as active
    pub fn is_active(self) -> bool {
        matches!(self, StreamDirection::SendOnly | StreamDirection::RecvOnly)
    }

    /// Attribute name written back, if any
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            StreamDirection::SendOnly => Some("sendonly"),
            StreamDirection::RecvOnly => Some("recvonly"),
            StreamDirection::SendRecv => Some("sendrecv"),
            StreamDirection::Inactive => Some("inactive"),
            StreamDirection::Unset => None,
        }
    }
}

/// Unicast RTCP feedback mode from `a=rtcp-unicast`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackMode {
    #[default]
    Unspecified,
    /// Receiver summary information
    Rsi,
}

/// FEC protection layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FecMode {
    /// One FEC stream (column only)
    #[serde(rename = "1d")]
    OneDimensional,
    /// Two FEC streams (column and row)
    #[serde(rename = "2d")]
    TwoDimensional,
}

/// RTCP bandwidth modifiers (RFC 3556), bits per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RtcpBandwidth {
    /// b=RS
    pub sender: Option<u32>,
    /// b=RR
    pub receiver: Option<u32>,
    /// a=rtcp-per-rcvr-bw
    pub per_receiver: Option<u32>,
}

impl RtcpBandwidth {
    pub fn is_signalled(&self) -> bool {
        self.sender.is_some() || self.receiver.is_some()
    }
}

/// Size limit on an RTCP XR run-length report block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunLengthLimit {
    /// Token given without a size
    Unlimited,
    /// Payload bytes left after the report header
    MaxBytes(u16),
}

/// Statistics summary report flags (RFC 3611 section 4.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatSummary {
    pub loss: bool,
    pub duplicates: bool,
    pub jitter: bool,
}

impl StatSummary {
    pub fn any(&self) -> bool {
        self.loss || self.duplicates || self.jitter
    }
}

/// RTCP extended report settings for one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XrConfig {
    pub loss_rle: Option<RunLengthLimit>,
    pub post_repair_loss_rle: Option<RunLengthLimit>,
    pub stat_summary: StatSummary,
    pub multicast_acq: bool,
    pub diagnostic_counters: bool,
    /// Reduced-size RTCP (RFC 5506)
    pub rtcp_rsize: bool,
}

/// Address and port information shared by every stream kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEndpoint {
    pub addr: Ipv4Addr,
    /// Multicast TTL from the c= line
    pub ttl: Option<u8>,
    /// Source address from `a=source-filter`
    pub src_filter: Option<Ipv4Addr>,
    pub transport: TransportKind,
    pub rtp_port: u16,
    /// None for datagram transport
    pub rtcp_port: Option<u16>,
    pub payload_type: u8,
    pub rtcp_bw: RtcpBandwidth,
    pub direction: StreamDirection,
    pub mid: Option<String>,
}

impl MediaEndpoint {
    /// RTP and RTCP ports in use
    pub fn ports(&self) -> impl Iterator<Item = u16> {
        std::iter::once(self.rtp_port).chain(self.rtcp_port)
    }
}

/// The original multicast stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryStream {
    #[serde(flatten)]
    pub endpoint: MediaEndpoint,
    /// From b=AS, bits per second
    pub bit_rate: Option<u32>,
    pub xr: XrConfig,
}

/// The unicast retransmission stream (RFC 4588)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtxStream {
    #[serde(flatten)]
    pub endpoint: MediaEndpoint,
    /// Payload type of the stream being repaired
    pub apt: u8,
    /// How long repair data is cached, milliseconds
    pub rtx_time_ms: u32,
    pub xr: XrConfig,
}

/// One provisioned channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelCfg {
    pub key: SessionKey,
    pub name: String,
    pub version: u64,
    /// MD5 of the canonical rendering, lowercase hex
    pub checksum: String,
    pub channel_type: ChannelType,
    pub role: ChannelRole,
    pub mode: ChannelMode,
    pub feedback_mode: FeedbackMode,
    /// `a=rtcp-fb:<pt> nack` on the primary
    pub er_enable: bool,
    /// `a=rtcp-fb:<pt> nack pli` on the primary
    pub fcc_enable: bool,
    pub primary: PrimaryStream,
    pub resourced: Option<MediaEndpoint>,
    /// Feedback target from the primary's `a=rtcp` line
    pub fbt_addr: Option<Ipv4Addr>,
    pub rtx: Option<RtxStream>,
    pub fec_mode: Option<FecMode>,
    pub fec1: Option<MediaEndpoint>,
    pub fec2: Option<MediaEndpoint>,
    /// Stop time from t=; non-zero schedules removal
    pub stop_time: u64,
    pub active: bool,
    pub complete: bool,
    #[serde(skip)]
    pub used: bool,
}

impl ChannelCfg {
    /// Streams in template order, paired with their kind
    pub fn endpoints(&self) -> impl Iterator<Item = (StreamKind, &MediaEndpoint)> {
        [
            Some((StreamKind::Primary, &self.primary.endpoint)),
            self.resourced.as_ref().map(|e| (StreamKind::Resourced, e)),
            self.rtx.as_ref().map(|r| (StreamKind::Retransmission, &r.endpoint)),
            self.fec1.as_ref().map(|e| (StreamKind::Fec1, e)),
            self.fec2.as_ref().map(|e| (StreamKind::Fec2, e)),
        ]
        .into_iter()
        .flatten()
    }

    pub fn endpoint(&self, kind: StreamKind) -> Option<&MediaEndpoint> {
        match kind {
            StreamKind::Primary => Some(&self.primary.endpoint),
            StreamKind::Resourced => self.resourced.as_ref(),
            StreamKind::Retransmission => self.rtx.as_ref().map(|r| &r.endpoint),
            StreamKind::Fec1 => self.fec1.as_ref(),
            StreamKind::Fec2 => self.fec2.as_ref(),
        }
    }

    /// Primary multicast address and RTP port
    pub fn primary_dest(&self) -> (Ipv4Addr, u16) {
        (self.primary.endpoint.addr, self.primary.endpoint.rtp_port)
    }

    /// Same identity, version and validated content; reconciliation
    /// markers are ignored.
    pub fn same_content(&self, other: &ChannelCfg) -> bool {
        self.key == other.key && self.version == other.version && self.checksum == other.checksum
    }
}
