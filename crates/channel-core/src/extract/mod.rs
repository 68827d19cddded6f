//! # Validation & extraction engine
//!
//! Turns one session description into a [`ChannelCfg`], or explains why it
//! cannot be one. The work happens in stages:
//!
//! 1. identity and version from the o= line, timing from t=
//! 2. classification of every m= line (primary, re-sourced, retransmission, FEC)
//! 3. per-stream extraction (ports, bandwidths, source filters, XR, fmtp)
//! 4. role and mode from the stream directions
//! 5. FID / FEC grouping
//! 6. a closing consistency pass
//!
//! Findings that can safely be defaulted or masked are reported as
//! [`ExtractWarning`]s and the channel is kept.

mod consistency;
mod grouping;
mod roles;
mod stream;
mod xr;

use std::fmt;

use chancfg_sdp_core::{SdpSession, SessionAccessor};
use serde::Serialize;
use tracing::{debug, warn};

pub use roles::resolve_role;
pub use stream::{DEFAULT_RTX_TIME_MS, MAX_AS_KBPS};
pub use xr::XR_HEADER_BYTES;

pub(crate) use grouping::{fec_members, fid_members};
pub(crate) use xr::render_xr;

use crate::channel::{
    ChannelCfg, ChannelMode, ChannelType, FeedbackMode, SessionIdentity, StreamKind,
};
use crate::error::{ExtractError, ValidationError};
use crate::render;

/// A recoverable finding; the channel is still accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExtractWarning {
    MissingSourceFilter(StreamKind),
    ReflectionDowngraded,
    RtxTimeDefaulted(u32),
    RunLengthClamped { stream: StreamKind, token: String },
    StatFlagMasked { stream: StreamKind, flag: String },
    XrTokenMasked { stream: StreamKind, token: String },
    XrTokenIgnored { stream: StreamKind, token: String },
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractWarning::MissingSourceFilter(stream) => {
                write!(f, "{} stream has no source filter", stream)
            }
            ExtractWarning::ReflectionDowngraded => {
                write!(f, "rtcp-unicast reflection is not supported, using rsi")
            }
            ExtractWarning::RtxTimeDefaulted(ms) => {
                write!(f, "retransmission fmtp has no rtx-time, using {} ms", ms)
            }
            ExtractWarning::RunLengthClamped { stream, token } => {
                write!(f, "{} stream: {} smaller than the report header, using 0", stream, token)
            }
            ExtractWarning::StatFlagMasked { stream, flag } => {
                write!(f, "{} stream: unsupported stat-summary flag {} masked", stream, flag)
            }
            ExtractWarning::XrTokenMasked { stream, token } => {
                write!(f, "{} stream: rtcp-xr {} not applicable, masked", stream, token)
            }
            ExtractWarning::XrTokenIgnored { stream, token } => {
                write!(f, "{} stream: unknown rtcp-xr token {} ignored", stream, token)
            }
        }
    }
}

/// A validated channel and the warnings raised on the way
#[derive(Debug, Clone)]
pub struct Extraction {
    pub channel: ChannelCfg,
    pub warnings: Vec<ExtractWarning>,
}

/// Parse SDP text and extract a channel from it
pub fn extract_text(text: &str, channel_type: ChannelType) -> Result<Extraction, ExtractError> {
    let session = SdpSession::parse(text)?;
    extract_channel(&session, channel_type)
}

/// Extract and validate a channel from a parsed session description
pub fn extract_channel<A: SessionAccessor + ?Sized>(
    session: &A,
    channel_type: ChannelType,
) -> Result<Extraction, ExtractError> {
    let identity = SessionIdentity::from_origin(session.origin())
        .map_err(|err| ExtractError::validation(None, err))?;
    let key = identity.key.to_string();

    let mut warnings = Vec::new();
    let channel = build(session, channel_type, identity, &mut warnings)
        .map_err(|err| ExtractError::validation(Some(key.clone()), err))?;

    for warning in &warnings {
        warn!(session = %key, "{}", warning);
    }
    debug!(
        session = %key,
        version = channel.version,
        role = %channel.role,
        mode = %channel.mode,
        "channel validated"
    );
    Ok(Extraction { channel, warnings })
}

fn build<A: SessionAccessor + ?Sized>(
    session: &A,
    channel_type: ChannelType,
    identity: SessionIdentity,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<ChannelCfg, ValidationError> {
    let timing = session.timing();
    if timing.start != 0 {
        return Err(ValidationError::NonZeroStartTime(timing.start));
    }

    let feedback_mode = feedback_mode(session, warnings)?;

    let count = session.media_count();
    let min = channel_type.min_media_lines();
    if count < min || count > ChannelType::MAX_MEDIA_LINES {
        return Err(ValidationError::MediaCount {
            count,
            min,
            max: ChannelType::MAX_MEDIA_LINES,
        });
    }

    let streams = stream::extract_streams(session, channel_type, warnings)?;
    let (role, mode) = resolve_role(
        streams.primary.endpoint.direction,
        streams.resourced.as_ref().map(|e| e.direction),
        streams.rtx.as_ref().map(|r| r.endpoint.direction),
    )?;

    if let Some(rtx) = &streams.rtx {
        let repaired = match (mode, &streams.resourced) {
            (ChannelMode::Source, Some(resourced)) => resourced.payload_type,
            _ => streams.primary.endpoint.payload_type,
        };
        if rtx.apt != repaired {
            return Err(ValidationError::AptMismatch {
                expected: repaired,
                found: rtx.apt,
            });
        }
    }

    let complete = !identity.key.username.is_empty() && !identity.key.session_id.is_empty();
    let mut channel = ChannelCfg {
        key: identity.key,
        name: session.session_name().to_string(),
        version: identity.version,
        checksum: String::new(),
        channel_type,
        role,
        mode,
        feedback_mode,
        er_enable: streams.er_enable,
        fcc_enable: streams.fcc_enable,
        primary: streams.primary,
        resourced: streams.resourced,
        fbt_addr: streams.fbt_addr,
        rtx: streams.rtx,
        fec_mode: None,
        fec1: streams.fec1,
        fec2: streams.fec2,
        stop_time: timing.stop,
        active: timing.stop == 0,
        complete,
        used: false,
    };

    channel.fec_mode = grouping::check_groups(&session.groups(), &channel)?;
    consistency::check_consistency(&channel)?;
    channel.checksum = render::checksum(&channel);
    Ok(channel)
}

fn feedback_mode<A: SessionAccessor + ?Sized>(
    session: &A,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<FeedbackMode, ValidationError> {
    let Some(attribute) = session.session_attribute("rtcp-unicast") else {
        return Ok(FeedbackMode::Unspecified);
    };
    match attribute.value.as_deref() {
        Some("rsi") => Ok(FeedbackMode::Rsi),
        Some("reflection") => {
            warnings.push(ExtractWarning::ReflectionDowngraded);
            Ok(FeedbackMode::Rsi)
        }
        other => Err(ValidationError::InvalidFeedbackMode(
            other.unwrap_or_default().to_string(),
        )),
    }
}
