//! FID and FEC grouping checks (RFC 5888)

use std::collections::HashSet;

use chancfg_sdp_core::Group;

use crate::channel::{ChannelCfg, ChannelMode, FecMode, StreamKind};
use crate::error::ValidationError;

const FID: &str = "FID";
const FEC: &str = "FEC";

/// Streams the FID group must name for a given mode
pub(crate) fn fid_members(mode: ChannelMode) -> [StreamKind; 2] {
    match mode {
        ChannelMode::Source => [StreamKind::Resourced, StreamKind::Retransmission],
        _ => [StreamKind::Primary, StreamKind::Retransmission],
    }
}

/// Streams the FEC group must name
pub(crate) fn fec_members(channel: &ChannelCfg) -> Vec<StreamKind> {
    let mut members = vec![StreamKind::Primary];
    if channel.fec1.is_some() {
        members.push(StreamKind::Fec1);
    }
    if channel.fec2.is_some() {
        members.push(StreamKind::Fec2);
    }
    members
}

/// Check grouping lines against the resolved streams and mode. Returns
/// the FEC mode implied by the FEC streams present.
pub(crate) fn check_groups(groups: &[Group], channel: &ChannelCfg) -> Result<Option<FecMode>, ValidationError> {
    let mut mids = HashSet::new();
    for mid in channel.endpoints().filter_map(|(_, e)| e.mid.as_deref()) {
        if !mids.insert(mid) {
            return Err(ValidationError::DuplicateMid(mid.to_string()));
        }
    }

    let fid = single_group(groups, FID)?;
    let fec = single_group(groups, FEC)?;

    match (fid, &channel.rtx) {
        (Some(_), None) => return Err(ValidationError::GroupWithoutRetransmission),
        (None, Some(_)) if matches!(channel.mode, ChannelMode::Source | ChannelMode::Lookaside) => {
            return Err(ValidationError::MissingGroup(FID))
        }
        (Some(group), Some(_)) => check_members(FID, group, &fid_members(channel.mode), channel)?,
        _ => {}
    }

    let fec_streams = usize::from(channel.fec1.is_some()) + usize::from(channel.fec2.is_some());
    match (fec, fec_streams) {
        (Some(_), 0) => return Err(ValidationError::GroupWithoutFec),
        (None, n) if n > 0 => return Err(ValidationError::MissingGroup(FEC)),
        (Some(group), _) => check_members(FEC, group, &fec_members(channel), channel)?,
        _ => {}
    }

    Ok(match fec_streams {
        0 => None,
        1 => Some(FecMode::OneDimensional),
        _ => Some(FecMode::TwoDimensional),
    })
}

fn single_group<'a>(groups: &'a [Group], semantics: &str) -> Result<Option<&'a Group>, ValidationError> {
    let mut matching = groups.iter().filter(|g| g.semantics == semantics);
    let first = matching.next();
    if matching.next().is_some() {
        return Err(ValidationError::DuplicateGroup(semantics.to_string()));
    }
    Ok(first)
}

fn check_members(
    semantics: &'static str,
    group: &Group,
    members: &[StreamKind],
    channel: &ChannelCfg,
) -> Result<(), ValidationError> {
    let mut expected = Vec::with_capacity(members.len());
    for &kind in members {
        let mid = channel
            .endpoint(kind)
            .and_then(|e| e.mid.clone())
            .ok_or(ValidationError::MissingMid(kind))?;
        expected.push(mid);
    }

    let mut found = group.mids.clone();
    found.sort();
    let mut wanted = expected.clone();
    wanted.sort();
    if found != wanted {
        return Err(ValidationError::GroupMismatch {
            semantics,
            expected,
            found: group.mids.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelType;
    use crate::error::ExtractError;
    use crate::extract::extract_text;

    const RECEIVER: &str = "m=video 50000 RTP/AVP 96\n\
c=IN IP4 224.1.1.1/255\n\
b=AS:5500\n\
a=recvonly\n\
a=rtpmap:96 MP2T/90000\n\
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2\n\
a=mid:1\n";

    const RTX: &str = "m=video 50002 RTP/AVPF 99\n\
c=IN IP4 10.1.1.1\n\
a=recvonly\n\
a=rtpmap:99 rtx/90000\n\
a=mid:2\n\
a=fmtp:99 apt=96;rtx-time=2500\n";

    const FEC1: &str = "m=video 50004 RTP/AVP 100\n\
c=IN IP4 224.1.1.1/255\n\
a=recvonly\n\
a=rtpmap:100 parityfec/90000\n\
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2\n\
a=mid:4\n";

    fn session(groups: &[&str], media: &[&str]) -> String {
        let mut text = String::from("v=0\no=- 5001 1 IN IP4 10.1.1.1\ns=Groups\nt=0 0\n");
        for group in groups {
            text.push_str(&format!("a=group:{}\n", group));
        }
        media.iter().for_each(|m| text.push_str(m));
        text
    }

    fn rejection(text: &str) -> ValidationError {
        match extract_text(text, ChannelType::Linear) {
            Err(ExtractError::Validation { source, .. }) => source,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_fid_members_follow_mode() {
        assert_eq!(
            fid_members(ChannelMode::Source),
            [StreamKind::Resourced, StreamKind::Retransmission]
        );
        assert_eq!(
            fid_members(ChannelMode::Lookaside),
            [StreamKind::Primary, StreamKind::Retransmission]
        );
    }

    #[test]
    fn test_groups_accepted() {
        let channel = extract_text(&session(&["FID 1 2"], &[RECEIVER, RTX]), ChannelType::Linear)
            .unwrap()
            .channel;
        assert_eq!(channel.mode, ChannelMode::Lookaside);
        assert_eq!(channel.fec_mode, None);

        let channel = extract_text(&session(&["FEC 4 1"], &[RECEIVER, FEC1]), ChannelType::Linear)
            .unwrap()
            .channel;
        assert_eq!(channel.fec_mode, Some(FecMode::OneDimensional));
    }

    #[test]
    fn test_duplicate_mid() {
        let rtx = RTX.replace("a=mid:2", "a=mid:1");
        let err = rejection(&session(&["FID 1 1"], &[RECEIVER, rtx.as_str()]));
        assert_eq!(err, ValidationError::DuplicateMid("1".to_string()));
    }

    #[test]
    fn test_duplicate_group() {
        let err = rejection(&session(&["FID 1 2", "FID 1 2"], &[RECEIVER, RTX]));
        assert_eq!(err, ValidationError::DuplicateGroup("FID".to_string()));
    }

    #[test]
    fn test_group_without_streams() {
        let err = rejection(&session(&["FID 1 2"], &[RECEIVER]));
        assert_eq!(err, ValidationError::GroupWithoutRetransmission);

        let err = rejection(&session(&["FEC 1 4"], &[RECEIVER]));
        assert_eq!(err, ValidationError::GroupWithoutFec);
    }

    #[test]
    fn test_streams_without_group() {
        let err = rejection(&session(&[], &[RECEIVER, RTX]));
        assert_eq!(err, ValidationError::MissingGroup(FID));

        let err = rejection(&session(&[], &[RECEIVER, FEC1]));
        assert_eq!(err, ValidationError::MissingGroup(FEC));
    }

    #[test]
    fn test_group_members_must_match() {
        let err = rejection(&session(&["FID 1 3"], &[RECEIVER, RTX]));
        assert!(matches!(err, ValidationError::GroupMismatch { semantics: "FID", .. }));

        let rtx = RTX.replace("a=mid:2\n", "");
        let err = rejection(&session(&["FID 1 2"], &[RECEIVER, rtx.as_str()]));
        assert_eq!(err, ValidationError::MissingMid(StreamKind::Retransmission));
    }
}
