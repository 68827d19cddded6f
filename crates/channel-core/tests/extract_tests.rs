//! Extraction engine tests over complete sessions

mod common;

use std::net::Ipv4Addr;

use chancfg_channel_core::channel::{FecMode, FeedbackMode, RunLengthLimit, StreamDirection};
use chancfg_channel_core::{
    extract_text, ChannelMode, ChannelRole, ChannelType, ExtractError, ExtractWarning, StreamKind,
    ValidationError,
};
use common::{DISTRIBUTION, FEC, LOOKASIDE, SOURCE};

fn validation_error(text: &str) -> ValidationError {
    match extract_text(text, ChannelType::Linear) {
        Err(ExtractError::Validation { source, .. }) => source,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_source_channel() {
    let extraction = extract_text(SOURCE, ChannelType::Linear).unwrap();
    assert!(extraction.warnings.is_empty(), "{:?}", extraction.warnings);
    let channel = extraction.channel;

    assert_eq!(channel.role, ChannelRole::VideoAccessNode);
    assert_eq!(channel.mode, ChannelMode::Source);
    assert!(channel.active);
    assert!(channel.complete);
    assert_eq!(channel.version, 3);
    assert_eq!(channel.feedback_mode, FeedbackMode::Rsi);
    assert_eq!(channel.primary_dest(), (Ipv4Addr::new(224, 1, 1, 1), 50000));
    assert_eq!(channel.primary.bit_rate, Some(5_500_000));
    assert_eq!(channel.fbt_addr, Some(Ipv4Addr::new(10, 3, 3, 3)));
    assert!(channel.er_enable);
    assert!(!channel.fcc_enable);

    let resourced = channel.resourced.as_ref().unwrap();
    assert_eq!(resourced.rtp_port, 51000);
    assert_eq!(resourced.rtcp_port, Some(51001));
    assert_eq!(resourced.direction, StreamDirection::SendOnly);

    let rtx = channel.rtx.as_ref().unwrap();
    assert_eq!(rtx.apt, 97);
    assert_eq!(rtx.endpoint.rtcp_port, Some(52001));
}

#[test]
fn test_lookaside_channel() {
    let channel = extract_text(LOOKASIDE, ChannelType::Linear).unwrap().channel;
    assert_eq!(channel.role, ChannelRole::VideoAccessNode);
    assert_eq!(channel.mode, ChannelMode::Lookaside);
    assert_eq!(channel.feedback_mode, FeedbackMode::Unspecified);
    assert!(channel.fcc_enable);

    let xr = channel.primary.xr;
    assert_eq!(xr.loss_rle, Some(RunLengthLimit::MaxBytes(1012)));
    assert_eq!(xr.post_repair_loss_rle, Some(RunLengthLimit::Unlimited));
    assert!(xr.multicast_acq);
    assert!(xr.stat_summary.duplicates);
    assert!(xr.rtcp_rsize);

    let rtx = channel.rtx.unwrap();
    assert_eq!(rtx.rtx_time_ms, 2500);
    assert_eq!(rtx.xr.loss_rle, Some(RunLengthLimit::Unlimited));
    assert!(rtx.xr.stat_summary.loss);
}

#[test]
fn test_fec_channel() {
    let channel = extract_text(FEC, ChannelType::Linear).unwrap().channel;
    assert_eq!(channel.role, ChannelRole::SetTop);
    assert_eq!(channel.mode, ChannelMode::RecvOnly);
    assert_eq!(channel.fec_mode, Some(FecMode::TwoDimensional));
    assert_eq!(channel.fec1.as_ref().unwrap().rtp_port, 50002);
    assert_eq!(channel.fec2.as_ref().unwrap().rtcp_port, Some(50005));

    let one_fec = FEC
        .replace("a=group:FEC 1 4 5", "a=group:FEC 1 4")
        .split("m=video 50004")
        .next()
        .unwrap()
        .to_string();
    let channel = extract_text(&one_fec, ChannelType::Linear).unwrap().channel;
    assert_eq!(channel.fec_mode, Some(FecMode::OneDimensional));
    assert!(channel.fec2.is_none());
}

#[test]
fn test_distribution_channel() {
    let channel = extract_text(DISTRIBUTION, ChannelType::Linear).unwrap().channel;
    assert_eq!(channel.role, ChannelRole::DistributionSource);
    assert_eq!(channel.mode, ChannelMode::Distribution);
    assert_eq!(channel.primary.endpoint.rtcp_port, None);
    assert_eq!(channel.primary.endpoint.payload_type, 33);
    assert_eq!(channel.primary.endpoint.ttl, Some(64));
}

#[test]
fn test_missing_fid_group() {
    let text = SOURCE.replace("a=group:FID 2 3\n", "");
    assert_eq!(validation_error(&text), ValidationError::MissingGroup("FID"));
}

#[test]
fn test_fid_group_with_wrong_mids() {
    // Source mode groups the re-sourced stream, not the primary
    let text = SOURCE.replace("a=group:FID 2 3", "a=group:FID 1 3");
    assert!(matches!(
        validation_error(&text),
        ValidationError::GroupMismatch { semantics: "FID", .. }
    ));

    let text = LOOKASIDE.replace("a=group:FID 1 2", "a=group:FID 1 7");
    assert!(matches!(validation_error(&text), ValidationError::GroupMismatch { .. }));
}

#[test]
fn test_missing_fec_group() {
    let text = FEC.replace("a=group:FEC 1 4 5\n", "");
    assert_eq!(validation_error(&text), ValidationError::MissingGroup("FEC"));
}

#[test]
fn test_reflection_is_downgraded() {
    let text = SOURCE.replace("rtcp-unicast:rsi", "rtcp-unicast:reflection");
    let extraction = extract_text(&text, ChannelType::Linear).unwrap();
    assert_eq!(extraction.channel.feedback_mode, FeedbackMode::Rsi);
    assert_eq!(extraction.warnings, vec![ExtractWarning::ReflectionDowngraded]);

    let text = SOURCE.replace("rtcp-unicast:rsi", "rtcp-unicast:mirror");
    assert_eq!(
        validation_error(&text),
        ValidationError::InvalidFeedbackMode("mirror".to_string())
    );
}

#[test]
fn test_source_filter_asymmetry() {
    let text = LOOKASIDE.replace("a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2\n", "");
    let extraction = extract_text(&text, ChannelType::Linear).unwrap();
    assert_eq!(extraction.channel.primary.endpoint.src_filter, None);
    assert_eq!(
        extraction.warnings,
        vec![ExtractWarning::MissingSourceFilter(StreamKind::Primary)]
    );

    let text = LOOKASIDE.replace("incl IN IP4 224.1.1.1 10.2.2.2", "incl IN IP4 224.1.1.9 10.2.2.2");
    assert!(matches!(
        validation_error(&text),
        ValidationError::SourceFilterMismatch { stream: StreamKind::Primary, .. }
    ));
}

#[test]
fn test_unsupported_stat_flags_are_masked() {
    let text = LOOKASIDE.replace("stat-summary=loss,dup,jitt", "stat-summary=loss,TTL,HL");
    let extraction = extract_text(&text, ChannelType::Linear).unwrap();
    let stats = extraction.channel.primary.xr.stat_summary;
    assert!(stats.loss);
    assert!(!stats.duplicates);
    assert_eq!(
        extraction
            .warnings
            .iter()
            .filter(|w| matches!(w, ExtractWarning::StatFlagMasked { .. }))
            .count(),
        2
    );
}

#[test]
fn test_version_boundary() {
    let max = LOOKASIDE.replace("o=- 1001 7 ", "o=- 1001 18446744073709551615 ");
    let channel = extract_text(&max, ChannelType::Linear).unwrap().channel;
    assert_eq!(channel.version, u64::MAX);

    let over = LOOKASIDE.replace("o=- 1001 7 ", "o=- 1001 18446744073709551616 ");
    assert!(matches!(validation_error(&over), ValidationError::InvalidVersion(_)));
}

#[test]
fn test_apt_must_name_repaired_stream() {
    let text = SOURCE.replace("apt=97", "apt=96");
    assert_eq!(
        validation_error(&text),
        ValidationError::AptMismatch { expected: 97, found: 96 }
    );
}

#[test]
fn test_feedback_target_must_be_retransmission_address() {
    let text = SOURCE.replace("a=rtcp:50001 IN IP4 10.3.3.3", "a=rtcp:50001 IN IP4 10.4.4.4");
    assert!(matches!(
        validation_error(&text),
        ValidationError::FeedbackTargetMismatch { .. }
    ));
}

#[test]
fn test_access_node_needs_bandwidth() {
    let text = LOOKASIDE.replace("b=AS:5500\n", "");
    assert_eq!(validation_error(&text), ValidationError::MissingBandwidth);

    let text = LOOKASIDE.replace("b=AS:5500\n", "b=RR:4000\n");
    assert!(extract_text(&text, ChannelType::Linear).is_ok());
}

#[test]
fn test_unsupported_direction_combination() {
    let text = LOOKASIDE.replace("a=sendonly", "a=recvonly").replace("a=recvonly\na=rtpmap:96", "a=sendonly\na=rtpmap:96");
    assert!(matches!(
        validation_error(&text),
        ValidationError::UnsupportedDirections { .. }
    ));
}

#[test]
fn test_nonzero_start_time() {
    let text = LOOKASIDE.replace("t=0 0", "t=3034423619 0");
    assert_eq!(validation_error(&text), ValidationError::NonZeroStartTime(3034423619));
}

#[test]
fn test_vod_needs_two_media_lines() {
    let err = extract_text(DISTRIBUTION, ChannelType::Vod).unwrap_err();
    assert!(matches!(
        err,
        ExtractError::Validation {
            source: ValidationError::MediaCount { count: 1, min: 2, .. },
            ..
        }
    ));
}

#[test]
fn test_syntax_errors_are_distinguished() {
    let err = extract_text("v=0\nthis is not sdp\n", ChannelType::Linear).unwrap_err();
    assert!(err.is_syntax());
}
