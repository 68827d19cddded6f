//! Closing consistency pass over a fully resolved channel

use crate::channel::{ChannelCfg, ChannelRole, StreamKind};
use crate::error::ValidationError;

pub(crate) fn check_consistency(channel: &ChannelCfg) -> Result<(), ValidationError> {
    for (kind, endpoint) in channel.endpoints() {
        if endpoint.rtcp_port == Some(endpoint.rtp_port) {
            return Err(ValidationError::RtpRtcpPortEqual(kind));
        }
    }

    let primary = &channel.primary.endpoint;
    if let Some(rtx) = &channel.rtx {
        let rtx = &rtx.endpoint;
        if let (Some(rtx_rtcp), Some(primary_rtcp)) = (rtx.rtcp_port, primary.rtcp_port) {
            if rtx_rtcp == primary_rtcp {
                return Err(ValidationError::PortConflict {
                    first: StreamKind::Retransmission,
                    second: StreamKind::Primary,
                    port: rtx_rtcp,
                });
            }
        }
        if let Some(fbt) = channel.fbt_addr {
            if fbt != rtx.addr {
                return Err(ValidationError::FeedbackTargetMismatch { fbt, rtx: rtx.addr });
            }
            // Feedback to the primary RTCP port and retransmissions share the target
            if primary.rtcp_port == Some(rtx.rtp_port) {
                return Err(ValidationError::PortConflict {
                    first: StreamKind::Retransmission,
                    second: StreamKind::Primary,
                    port: rtx.rtp_port,
                });
            }
        }
    }

    // Multicast streams sharing an address must keep their ports apart
    let distribution: Vec<_> = channel
        .endpoints()
        .filter(|(kind, _)| *kind != StreamKind::Retransmission)
        .collect();
    for (i, (first, a)) in distribution.iter().enumerate() {
        for (second, b) in &distribution[i + 1..] {
            if a.addr != b.addr {
                continue;
            }
            if let Some(port) = a.ports().find(|p| b.ports().any(|q| q == *p)) {
                return Err(ValidationError::PortConflict {
                    first: *first,
                    second: *second,
                    port,
                });
            }
        }
    }

    if channel.role == ChannelRole::VideoAccessNode
        && channel.active
        && channel.primary.bit_rate.is_none()
        && !primary.rtcp_bw.is_signalled()
    {
        return Err(ValidationError::MissingBandwidth);
    }

    Ok(())
}
