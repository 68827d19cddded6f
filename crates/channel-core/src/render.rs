//! Channel renderer
//!
//! Writes a [`ChannelCfg`] back out as a session description the
//! extraction engine accepts. Media sections follow a fixed order:
//! primary, re-sourced, retransmission, FEC1, FEC2. Extracting the
//! rendered text gives back an equal record, which is what makes the
//! checksum over the rendering a stable content fingerprint.

use chancfg_sdp_core::{Attribute, ConnectionData, Group, MediaDescription, Origin, SdpSession, Timing};

use crate::channel::{ChannelCfg, FeedbackMode, MediaEndpoint, StreamKind};
use crate::extract::{fec_members, fid_members, render_xr};

/// RTP clock rate written on every rtpmap line
const CLOCK_RATE: u32 = 90_000;

/// Build the session description for a channel
pub fn render_session(channel: &ChannelCfg) -> SdpSession {
    let origin = Origin {
        username: channel.key.username.clone(),
        session_id: channel.key.session_id.clone(),
        session_version: channel.version.to_string(),
        net_type: "IN".to_string(),
        addr_type: "IP4".to_string(),
        unicast_address: channel.key.creator.to_string(),
    };
    let mut session = SdpSession::new(origin, channel.name.clone());
    session.timing = Timing {
        start: 0,
        stop: channel.stop_time,
    };

    if channel.feedback_mode == FeedbackMode::Rsi {
        session.push_attribute(Attribute::value("rtcp-unicast", "rsi"));
    }
    if channel.rtx.is_some() {
        if let Some(group) = group("FID", &fid_members(channel.mode), channel) {
            session.push_attribute(group.to_attribute());
        }
    }
    if channel.fec1.is_some() {
        if let Some(group) = group("FEC", &fec_members(channel), channel) {
            session.push_attribute(group.to_attribute());
        }
    }

    for (kind, endpoint) in channel.endpoints() {
        session.push_media(render_media(channel, kind, endpoint));
    }
    session
}

/// Canonical SDP text for a channel
pub fn render_channel(channel: &ChannelCfg) -> String {
    render_session(channel).to_string()
}

/// MD5 of the canonical rendering as lowercase hex
pub(crate) fn checksum(channel: &ChannelCfg) -> String {
    format!("{:x}", md5::compute(render_channel(channel)))
}

fn group(semantics: &str, members: &[StreamKind], channel: &ChannelCfg) -> Option<Group> {
    let mids = members
        .iter()
        .map(|kind| channel.endpoint(*kind).and_then(|e| e.mid.clone()))
        .collect::<Option<Vec<_>>>()?;
    Some(Group {
        semantics: semantics.to_string(),
        mids,
    })
}

fn render_media(channel: &ChannelCfg, kind: StreamKind, endpoint: &MediaEndpoint) -> MediaDescription {
    let pt = endpoint.payload_type;
    let mut media = MediaDescription::new(
        "video",
        endpoint.rtp_port,
        endpoint.transport.protocol(),
        vec![pt.to_string()],
    );
    media.connection = Some(ConnectionData::ip4(endpoint.addr.to_string(), endpoint.ttl));

    if kind == StreamKind::Primary {
        if let Some(bit_rate) = channel.primary.bit_rate {
            media.push_bandwidth("AS", u64::from(bit_rate / 1000));
        }
    }
    if let Some(rs) = endpoint.rtcp_bw.sender {
        media.push_bandwidth("RS", u64::from(rs));
    }
    if let Some(rr) = endpoint.rtcp_bw.receiver {
        media.push_bandwidth("RR", u64::from(rr));
    }

    if let Some(direction) = endpoint.direction.attribute() {
        media.push_attribute(Attribute::flag(direction));
    }

    let encoding = match kind {
        StreamKind::Primary | StreamKind::Resourced => "MP2T",
        StreamKind::Retransmission => "rtx",
        StreamKind::Fec1 | StreamKind::Fec2 => "parityfec",
    };
    media.push_attribute(Attribute::value("rtpmap", format!("{} {}/{}", pt, encoding, CLOCK_RATE)));

    if let Some(rtcp) = endpoint.rtcp_port {
        let value = match (kind, channel.fbt_addr) {
            (StreamKind::Primary, Some(fbt)) => format!("{} IN IP4 {}", rtcp, fbt),
            _ => rtcp.to_string(),
        };
        media.push_attribute(Attribute::value("rtcp", value));
    }
    if let Some(src) = endpoint.src_filter {
        media.push_attribute(Attribute::value(
            "source-filter",
            format!("incl IN IP4 {} {}", endpoint.addr, src),
        ));
    }
    if let Some(per_receiver) = endpoint.rtcp_bw.per_receiver {
        media.push_attribute(Attribute::value("rtcp-per-rcvr-bw", per_receiver.to_string()));
    }
    if let Some(mid) = &endpoint.mid {
        media.push_attribute(Attribute::value("mid", mid.clone()));
    }

    let xr = match kind {
        StreamKind::Primary => {
            if channel.er_enable {
                media.push_attribute(Attribute::value("rtcp-fb", format!("{} nack", pt)));
            }
            if channel.fcc_enable {
                media.push_attribute(Attribute::value("rtcp-fb", format!("{} nack pli", pt)));
            }
            Some(&channel.primary.xr)
        }
        StreamKind::Retransmission => channel.rtx.as_ref().map(|rtx| {
            media.push_attribute(Attribute::value(
                "fmtp",
                format!("{} apt={};rtx-time={}", pt, rtx.apt, rtx.rtx_time_ms),
            ));
            &rtx.xr
        }),
        _ => None,
    };
    if let Some(xr) = xr {
        if let Some(value) = render_xr(xr) {
            media.push_attribute(Attribute::value("rtcp-xr", value));
        }
        if xr.rtcp_rsize {
            media.push_attribute(Attribute::flag("rtcp-rsize"));
        }
    }

    media
}
