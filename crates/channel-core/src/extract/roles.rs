//! Role and mode resolution from stream directions

use std::fmt;

use crate::channel::{ChannelMode, ChannelRole, StreamDirection};
use crate::error::ValidationError;

/// Direction of a stream as the lookup table sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    /// Absent, inactive or without a direction attribute
    Off,
    Sending,
    Receiving,
    Both,
}

impl Activity {
    fn of(direction: Option<StreamDirection>) -> Self {
        match direction {
            Some(StreamDirection::SendOnly) => Activity::Sending,
            Some(StreamDirection::RecvOnly) => Activity::Receiving,
            Some(StreamDirection::SendRecv) => Activity::Both,
            Some(StreamDirection::Inactive) | Some(StreamDirection::Unset) | None => Activity::Off,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activity::Off => "off",
            Activity::Sending => "sendonly",
            Activity::Receiving => "recvonly",
            Activity::Both => "sendrecv",
        };
        f.write_str(name)
    }
}

/// Resolve role and mode from the directions of the primary, re-sourced
/// and retransmission streams (`None` when a stream is absent).
///
/// ```
/// use chancfg_channel_core::channel::{ChannelMode, ChannelRole, StreamDirection};
/// use chancfg_channel_core::extract::resolve_role;
///
/// let (role, mode) = resolve_role(
///     StreamDirection::RecvOnly,
///     None,
///     Some(StreamDirection::SendOnly),
/// )
/// .unwrap();
/// assert_eq!((role, mode), (ChannelRole::VideoAccessNode, ChannelMode::Lookaside));
/// ```
pub fn resolve_role(
    primary: StreamDirection,
    resourced: Option<StreamDirection>,
    retransmission: Option<StreamDirection>,
) -> Result<(ChannelRole, ChannelMode), ValidationError> {
    use Activity::*;

    let p = Activity::of(Some(primary));
    let r = Activity::of(resourced);
    let x = Activity::of(retransmission);

    match (p, r, x) {
        (Sending, Off, Off) => Ok((ChannelRole::DistributionSource, ChannelMode::Distribution)),
        (Receiving, Sending, Sending) => Ok((ChannelRole::VideoAccessNode, ChannelMode::Source)),
        (Receiving, Off, Sending) => Ok((ChannelRole::VideoAccessNode, ChannelMode::Lookaside)),
        (Receiving, Receiving, Receiving) => Ok((ChannelRole::SetTop, ChannelMode::Source)),
        (Receiving, Off, Receiving) => Ok((ChannelRole::SetTop, ChannelMode::Lookaside)),
        (Receiving, Off, Off) => Ok((ChannelRole::SetTop, ChannelMode::RecvOnly)),
        _ => Err(ValidationError::UnsupportedDirections {
            primary: p.to_string(),
            resourced: r.to_string(),
            retransmission: x.to_string(),
        }),
    }
}
