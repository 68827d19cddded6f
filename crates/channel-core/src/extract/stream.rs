//! Media line classification and per-stream extraction
//!
//! Every m= line is first classified by its encoding (MP2T, rtx or FEC)
//! and transport, then the MP2T lines are split into the primary and the
//! re-sourced stream. Each classified line is then turned into a
//! [`MediaEndpoint`] with its ports, bandwidths, source filter and mid.

use std::net::Ipv4Addr;

use chancfg_sdp_core::{MediaDescription, SessionAccessor};

use super::{xr, ExtractWarning};
use crate::channel::{
    ChannelType, MediaEndpoint, PrimaryStream, RtcpBandwidth, RtxStream, StreamDirection,
    StreamKind, TransportKind, DYNAMIC_PAYLOAD_TYPES, MP2T_STATIC_PAYLOAD_TYPE,
};
use crate::error::ValidationError;

/// Cache time used when the retransmission fmtp omits `rtx-time`
pub const DEFAULT_RTX_TIME_MS: u32 = 3000;

/// Highest b=AS accepted on the primary, kbps
pub const MAX_AS_KBPS: u64 = 40_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Mp2t,
    Rtx,
    Fec,
}

/// One m= line that passed the shape checks
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    index: usize,
    media: &'a MediaDescription,
    payload_type: u8,
    transport: TransportKind,
    addr: Ipv4Addr,
    ttl: Option<u8>,
}

/// Every stream of a session, extracted but not yet cross-checked
#[derive(Debug, Clone)]
pub(crate) struct Streams {
    pub primary: PrimaryStream,
    pub fbt_addr: Option<Ipv4Addr>,
    pub er_enable: bool,
    pub fcc_enable: bool,
    pub resourced: Option<MediaEndpoint>,
    pub rtx: Option<RtxStream>,
    pub fec1: Option<MediaEndpoint>,
    pub fec2: Option<MediaEndpoint>,
}

/// Classify and extract every media line of a session
pub(crate) fn extract_streams<A: SessionAccessor + ?Sized>(
    session: &A,
    channel_type: ChannelType,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Streams, ValidationError> {
    let mut mp2t: Vec<Line<'_>> = Vec::new();
    let mut rtx: Option<Line<'_>> = None;
    let mut fec: Vec<Line<'_>> = Vec::new();

    for index in 0..session.media_count() {
        let (line, encoding) = classify(session, index)?;
        match encoding {
            Encoding::Mp2t => mp2t.push(line),
            Encoding::Rtx => {
                if rtx.replace(line).is_some() {
                    return Err(ValidationError::DuplicateStream(StreamKind::Retransmission));
                }
            }
            Encoding::Fec => {
                // First free slot wins; a third FEC line has none
                if fec.len() == 2 {
                    return Err(ValidationError::DuplicateStream(StreamKind::Fec2));
                }
                fec.push(line);
            }
        }
    }

    let (primary_line, resourced_line) = split_mp2t(&mp2t)?;
    if let Some(line) = resourced_line {
        if !line.transport.is_rtp() {
            return Err(ValidationError::InvalidStream {
                media: line.index,
                reason: "only the primary stream may use udp",
            });
        }
    }

    if channel_type == ChannelType::Linear {
        let distribution = std::iter::once((StreamKind::Primary, primary_line))
            .chain(resourced_line.map(|l| (StreamKind::Resourced, l)))
            .chain(fec.iter().zip([StreamKind::Fec1, StreamKind::Fec2]).map(|(l, k)| (k, *l)));
        for (stream, line) in distribution {
            if !line.addr.is_multicast() {
                return Err(ValidationError::NotMulticast {
                    stream,
                    addr: line.addr,
                });
            }
        }
        if primary_line.media.port == 0 {
            return Err(ValidationError::InvalidPort {
                stream: StreamKind::Primary,
                reason: "RTP port 0",
            });
        }
    }

    let (primary, fbt_addr, er_enable, fcc_enable) = primary_stream(primary_line, warnings)?;
    let resourced = resourced_line
        .map(|line| stream_endpoint(line, StreamKind::Resourced, warnings))
        .transpose()?;
    let rtx = rtx.map(|line| rtx_stream(line, warnings)).transpose()?;
    let mut fec = fec.into_iter().zip([StreamKind::Fec1, StreamKind::Fec2]);
    let fec1 = fec
        .next()
        .map(|(line, kind)| stream_endpoint(line, kind, warnings))
        .transpose()?;
    let fec2 = fec
        .next()
        .map(|(line, kind)| stream_endpoint(line, kind, warnings))
        .transpose()?;

    Ok(Streams {
        primary,
        fbt_addr,
        er_enable,
        fcc_enable,
        resourced,
        rtx,
        fec1,
        fec2,
    })
}

/// Shape checks shared by every m= line, then classification by encoding
fn classify<A: SessionAccessor + ?Sized>(
    session: &A,
    index: usize,
) -> Result<(Line<'_>, Encoding), ValidationError> {
    let media = session
        .media(index)
        .ok_or(ValidationError::MissingConnection { media: index })?;

    let payload_type = payload_type(media, index)?;
    let transport =
        TransportKind::from_protocol(&media.protocol).ok_or_else(|| ValidationError::UnsupportedTransport {
            media: index,
            protocol: media.protocol.clone(),
        })?;

    let connection = session
        .media_connection(index)
        .ok_or(ValidationError::MissingConnection { media: index })?;
    if connection.net_type != "IN" || connection.addr_type != "IP4" {
        return Err(ValidationError::UnsupportedAddressFamily {
            net_type: connection.net_type.clone(),
            addr_type: connection.addr_type.clone(),
        });
    }
    let addr = connection
        .address
        .parse::<Ipv4Addr>()
        .map_err(|_| ValidationError::InvalidAddress(connection.address.clone()))?;

    let line = Line {
        index,
        media,
        payload_type,
        transport,
        addr,
        ttl: connection.ttl,
    };

    let encoding = match encoding_name(media, index, payload_type)?.to_ascii_lowercase().as_str() {
        "mp2t" => Encoding::Mp2t,
        "rtx" => {
            if transport != TransportKind::RtpFeedback {
                return Err(ValidationError::InvalidStream {
                    media: index,
                    reason: "retransmission requires RTP/AVPF",
                });
            }
            if addr.is_multicast() {
                return Err(ValidationError::InvalidStream {
                    media: index,
                    reason: "retransmission address must be unicast",
                });
            }
            Encoding::Rtx
        }
        "parityfec" | "2dparityfec" => {
            if !transport.is_rtp() {
                return Err(ValidationError::InvalidStream {
                    media: index,
                    reason: "FEC requires an RTP transport",
                });
            }
            Encoding::Fec
        }
        other => {
            return Err(ValidationError::UnsupportedEncoding {
                media: index,
                encoding: other.to_string(),
            })
        }
    };

    Ok((line, encoding))
}

/// The single payload type of an m= line
fn payload_type(media: &MediaDescription, index: usize) -> Result<u8, ValidationError> {
    let [format] = media.formats.as_slice() else {
        return Err(ValidationError::PayloadTypeCount {
            media: index,
            count: media.formats.len(),
        });
    };
    match format.parse::<u8>() {
        Ok(pt) if pt == MP2T_STATIC_PAYLOAD_TYPE || DYNAMIC_PAYLOAD_TYPES.contains(&pt) => Ok(pt),
        _ => Err(ValidationError::InvalidPayloadType {
            media: index,
            value: format.clone(),
        }),
    }
}

/// Encoding name from `a=rtpmap:<pt> <name>/<clock>`
fn encoding_name(media: &MediaDescription, index: usize, payload_type: u8) -> Result<String, ValidationError> {
    let Some(rtpmap) = media.attribute_value("rtpmap") else {
        if payload_type == MP2T_STATIC_PAYLOAD_TYPE {
            return Ok("MP2T".to_string());
        }
        return Err(ValidationError::MissingEncoding {
            media: index,
            payload_type,
        });
    };

    let (pt, encoding) = rtpmap.split_once(' ').ok_or(ValidationError::InvalidStream {
        media: index,
        reason: "malformed rtpmap",
    })?;
    check_payload_type(pt, payload_type, index, "rtpmap")?;

    let name = encoding.trim().split('/').next().unwrap_or_default();
    if name.is_empty() {
        return Err(ValidationError::InvalidStream {
            media: index,
            reason: "malformed rtpmap",
        });
    }
    Ok(name.to_string())
}

fn check_payload_type(
    found: &str,
    expected: u8,
    media: usize,
    attribute: &'static str,
) -> Result<(), ValidationError> {
    if found.trim().parse::<u8>() == Ok(expected) {
        Ok(())
    } else {
        Err(ValidationError::PayloadTypeMismatch {
            media,
            attribute,
            expected,
            found: found.trim().to_string(),
        })
    }
}

/// Pick the primary among the MP2T lines: the one carrying b=AS, else the
/// first. What is left over is the re-sourced stream.
fn split_mp2t<'a>(mp2t: &[Line<'a>]) -> Result<(Line<'a>, Option<Line<'a>>), ValidationError> {
    let with_as: Vec<usize> = mp2t
        .iter()
        .enumerate()
        .filter(|(_, line)| line.media.bandwidth("AS").is_some())
        .map(|(i, _)| i)
        .collect();

    let primary = match with_as.as_slice() {
        [] => 0,
        [only] => *only,
        _ => return Err(ValidationError::DuplicateStream(StreamKind::Primary)),
    };
    let Some(primary_line) = mp2t.get(primary).copied() else {
        return Err(ValidationError::MissingPrimary);
    };

    let mut rest = mp2t
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != primary)
        .map(|(_, line)| *line);
    let resourced = rest.next();
    if rest.next().is_some() {
        return Err(ValidationError::DuplicateStream(StreamKind::Resourced));
    }
    Ok((primary_line, resourced))
}

fn direction(media: &MediaDescription) -> StreamDirection {
    media
        .attributes
        .iter()
        .find_map(|a| match a.name.as_str() {
            "sendonly" => Some(StreamDirection::SendOnly),
            "recvonly" => Some(StreamDirection::RecvOnly),
            "sendrecv" => Some(StreamDirection::SendRecv),
            "inactive" => Some(StreamDirection::Inactive),
            _ => None,
        })
        .unwrap_or_default()
}

/// Endpoint of a stream other than the primary. Only the primary may name
/// a feedback target, so an `a=rtcp` address must repeat the `c=` address.
fn stream_endpoint(
    line: Line<'_>,
    stream: StreamKind,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<MediaEndpoint, ValidationError> {
    let (endpoint, rtcp_addr) = endpoint(line, stream, warnings)?;
    match rtcp_addr {
        Some(addr) if addr != endpoint.addr => Err(ValidationError::RtcpAddressMismatch {
            stream,
            rtcp: addr,
            connection: endpoint.addr,
        }),
        _ => Ok(endpoint),
    }
}

/// Fields shared by every stream kind. Also returns the address given on
/// the `a=rtcp` line, if any.
fn endpoint(
    line: Line<'_>,
    stream: StreamKind,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<(MediaEndpoint, Option<Ipv4Addr>), ValidationError> {
    let media = line.media;
    let rtp_port = media.port;

    let (rtcp_port, rtcp_addr) = if line.transport.is_rtp() {
        match media.attribute_value("rtcp") {
            Some(value) => {
                let (port, addr) = parse_rtcp(value, stream)?;
                (Some(port), addr)
            }
            None if rtp_port == 0 || rtp_port == u16::MAX => {
                return Err(ValidationError::InvalidPort {
                    stream,
                    reason: "no a=rtcp line and the RTP port has no successor",
                })
            }
            None => (Some(rtp_port + 1), None),
        }
    } else {
        (None, None)
    };

    let mut rtcp_bw = RtcpBandwidth::default();
    for bw in &media.bandwidths {
        match bw.bw_type.as_str() {
            "RS" => rtcp_bw.sender = Some(bandwidth_bps(stream, "RS", bw.value)?),
            "RR" => rtcp_bw.receiver = Some(bandwidth_bps(stream, "RR", bw.value)?),
            "AS" if stream != StreamKind::Primary => {
                return Err(ValidationError::BandwidthNotAllowed {
                    stream,
                    bw_type: bw.bw_type.clone(),
                })
            }
            _ => {}
        }
    }
    if let Some(value) = media.attribute_value("rtcp-per-rcvr-bw") {
        rtcp_bw.per_receiver = Some(value.parse::<u32>().map_err(|_| ValidationError::InvalidAttribute {
            stream,
            attribute: "rtcp-per-rcvr-bw",
            value: value.to_string(),
        })?);
    }

    let src_filter = if line.addr.is_multicast() {
        match media.attribute_value("source-filter") {
            Some(value) => Some(parse_source_filter(value, line.addr, stream)?),
            None => {
                warnings.push(ExtractWarning::MissingSourceFilter(stream));
                None
            }
        }
    } else {
        None
    };

    let endpoint = MediaEndpoint {
        addr: line.addr,
        ttl: line.ttl,
        src_filter,
        transport: line.transport,
        rtp_port,
        rtcp_port,
        payload_type: line.payload_type,
        rtcp_bw,
        direction: direction(media),
        mid: media.attribute_value("mid").map(str::to_string),
    };
    Ok((endpoint, rtcp_addr))
}

fn bandwidth_bps(stream: StreamKind, bw_type: &str, value: u64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::InvalidBandwidth {
        stream,
        bw_type: bw_type.to_string(),
        value,
    })
}

/// `a=rtcp:<port>[ IN IP4 <addr>]`
fn parse_rtcp(value: &str, stream: StreamKind) -> Result<(u16, Option<Ipv4Addr>), ValidationError> {
    let invalid = || ValidationError::InvalidAttribute {
        stream,
        attribute: "rtcp",
        value: value.to_string(),
    };
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let (port, addr) = match tokens.as_slice() {
        [port] => (port, None),
        [port, "IN", "IP4", addr] => (port, Some(addr.parse::<Ipv4Addr>().map_err(|_| invalid())?)),
        _ => return Err(invalid()),
    };
    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok((port, addr)),
        _ => Err(invalid()),
    }
}

/// `a=source-filter: incl IN IP4 <dest> <src>`; returns the source
fn parse_source_filter(value: &str, dest: Ipv4Addr, stream: StreamKind) -> Result<Ipv4Addr, ValidationError> {
    let invalid = || ValidationError::InvalidAttribute {
        stream,
        attribute: "source-filter",
        value: value.to_string(),
    };
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let [mode, net_type, addr_type, filter_dest, src, ..] = tokens.as_slice() else {
        return Err(invalid());
    };
    match *mode {
        "incl" => {}
        "excl" => return Err(ValidationError::SourceFilterExcluded { stream }),
        _ => return Err(invalid()),
    }
    if *net_type != "IN" || *addr_type != "IP4" {
        return Err(invalid());
    }
    let filter_dest = filter_dest.parse::<Ipv4Addr>().map_err(|_| invalid())?;
    if filter_dest != dest {
        return Err(ValidationError::SourceFilterMismatch {
            stream,
            expected: dest,
            found: filter_dest,
        });
    }
    src.parse::<Ipv4Addr>().map_err(|_| invalid())
}

/// Primary stream plus the channel-wide values that live on its section:
/// the feedback target, and the nack / nack pli negotiation flags.
fn primary_stream(
    line: Line<'_>,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<(PrimaryStream, Option<Ipv4Addr>, bool, bool), ValidationError> {
    let media = line.media;
    let stream = StreamKind::Primary;
    let (endpoint, fbt_addr) = endpoint(line, stream, warnings)?;

    let bit_rate = match media.bandwidth("AS") {
        Some(kbps) if (1..=MAX_AS_KBPS).contains(&kbps) => Some((kbps * 1000) as u32),
        Some(kbps) => {
            return Err(ValidationError::InvalidBandwidth {
                stream,
                bw_type: "AS".to_string(),
                value: kbps,
            })
        }
        None => None,
    };

    let mut er_enable = false;
    let mut fcc_enable = false;
    for value in media.attributes_named("rtcp-fb").filter_map(|a| a.value.as_deref()) {
        let (pt, feedback) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
        if pt != "*" {
            check_payload_type(pt, line.payload_type, line.index, "rtcp-fb")?;
        }
        let feedback: Vec<&str> = feedback.split_whitespace().collect();
        match feedback.as_slice() {
            ["nack"] => er_enable = true,
            ["nack", "pli"] => fcc_enable = true,
            _ => tracing::debug!("ignoring rtcp-fb:{}", value),
        }
    }

    let xr = xr::parse_xr(media, stream, warnings)?;
    Ok((
        PrimaryStream {
            endpoint,
            bit_rate,
            xr,
        },
        fbt_addr,
        er_enable,
        fcc_enable,
    ))
}

/// Retransmission stream with its `a=fmtp:<pt> apt=<pt>;rtx-time=<ms>`
fn rtx_stream(line: Line<'_>, warnings: &mut Vec<ExtractWarning>) -> Result<RtxStream, ValidationError> {
    let media = line.media;
    let stream = StreamKind::Retransmission;
    let endpoint = stream_endpoint(line, stream, warnings)?;

    let fmtp = media.attribute_value("fmtp").ok_or(ValidationError::MissingApt)?;
    let (pt, params) = fmtp.split_once(char::is_whitespace).unwrap_or((fmtp, ""));
    check_payload_type(pt, line.payload_type, line.index, "fmtp")?;

    let mut apt = None;
    let mut rtx_time = None;
    for param in params.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let invalid = || ValidationError::InvalidAttribute {
            stream,
            attribute: "fmtp",
            value: param.to_string(),
        };
        match param.split_once('=') {
            Some(("apt", value)) => apt = Some(value.trim().parse::<u8>().map_err(|_| invalid())?),
            Some(("rtx-time", value)) => {
                rtx_time = Some(value.trim().parse::<u32>().map_err(|_| invalid())?)
            }
            _ => tracing::debug!("ignoring fmtp parameter {}", param),
        }
    }

    let apt = apt.ok_or(ValidationError::MissingApt)?;
    let rtx_time_ms = rtx_time.unwrap_or_else(|| {
        warnings.push(ExtractWarning::RtxTimeDefaulted(DEFAULT_RTX_TIME_MS));
        DEFAULT_RTX_TIME_MS
    });
    let xr = xr::parse_xr(media, stream, warnings)?;

    Ok(RtxStream {
        endpoint,
        apt,
        rtx_time_ms,
        xr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chancfg_sdp_core::SdpSession;

    fn session(media: &str) -> SdpSession {
        let text = format!("v=0\no=- 1 1 IN IP4 10.1.1.1\ns=t\nt=0 0\n{}", media);
        SdpSession::parse(&text).unwrap()
    }

    fn extract(media: &str) -> Result<(Streams, Vec<ExtractWarning>), ValidationError> {
        let mut warnings = Vec::new();
        let streams = extract_streams(&session(media), ChannelType::Linear, &mut warnings)?;
        Ok((streams, warnings))
    }

    const PRIMARY: &str = "m=video 50000 RTP/AVPF 96\n\
c=IN IP4 224.1.1.1/255\n\
b=AS:5500\n\
a=recvonly\n\
a=rtpmap:96 MP2T/90000\n\
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2\n\
a=rtcp:50001 IN IP4 10.1.1.1\n";

    #[test]
    fn test_primary_fields() {
        let (streams, warnings) = extract(PRIMARY).unwrap();
        let primary = &streams.primary.endpoint;
        assert_eq!(primary.addr, Ipv4Addr::new(224, 1, 1, 1));
        assert_eq!(primary.ttl, Some(255));
        assert_eq!(primary.src_filter, Some(Ipv4Addr::new(10, 2, 2, 2)));
        assert_eq!(primary.rtcp_port, Some(50001));
        assert_eq!(primary.direction, StreamDirection::RecvOnly);
        assert_eq!(streams.primary.bit_rate, Some(5_500_000));
        assert_eq!(streams.fbt_addr, Some(Ipv4Addr::new(10, 1, 1, 1)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_legacy_payload_type_without_rtpmap() {
        let (streams, warnings) = extract("m=video 50000 udp 33\nc=IN IP4 224.1.1.1\na=sendonly\n").unwrap();
        assert_eq!(streams.primary.endpoint.transport, TransportKind::Udp);
        assert_eq!(streams.primary.endpoint.rtcp_port, None);
        assert_eq!(warnings, vec![ExtractWarning::MissingSourceFilter(StreamKind::Primary)]);
    }

    #[test]
    fn test_payload_type_rules() {
        let err = extract("m=video 50000 RTP/AVP 96 97\nc=IN IP4 224.1.1.1\n").unwrap_err();
        assert!(matches!(err, ValidationError::PayloadTypeCount { count: 2, .. }));

        let err = extract("m=video 50000 RTP/AVP 34\nc=IN IP4 224.1.1.1\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPayloadType { .. }));

        let err = extract("m=video 50000 RTP/AVP 96\nc=IN IP4 224.1.1.1\na=rtpmap:97 MP2T/90000\n")
            .unwrap_err();
        assert!(matches!(err, ValidationError::PayloadTypeMismatch { attribute: "rtpmap", .. }));

        let err = extract("m=video 50000 RTP/AVP 96\nc=IN IP4 224.1.1.1\n").unwrap_err();
        assert!(matches!(err, ValidationError::MissingEncoding { .. }));
    }

    #[test]
    fn test_rtcp_address_outside_primary() {
        let rtx = |rtcp: &str| {
            format!(
                "{}m=video 50002 RTP/AVPF 99\n\
c=IN IP4 10.1.1.1\n\
a=sendonly\n\
a=rtpmap:99 rtx/90000\n\
a=rtcp:{}\n\
a=fmtp:99 apt=96\n",
                PRIMARY, rtcp
            )
        };

        let (streams, _) = extract(&rtx("50003 IN IP4 10.1.1.1")).unwrap();
        assert_eq!(streams.rtx.unwrap().endpoint.rtcp_port, Some(50003));

        let err = extract(&rtx("50003 IN IP4 10.77.7.7")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RtcpAddressMismatch {
                stream: StreamKind::Retransmission,
                rtcp: Ipv4Addr::new(10, 77, 7, 7),
                connection: Ipv4Addr::new(10, 1, 1, 1),
            }
        );
    }

    #[test]
    fn test_rtcp_port_derivation() {
        let (streams, _) = extract("m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\n").unwrap();
        assert_eq!(streams.primary.endpoint.rtcp_port, Some(50001));

        let err = extract("m=video 65535 RTP/AVP 33\nc=IN IP4 224.1.1.1\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPort { .. }));

        let (streams, _) = extract("m=video 65535 RTP/AVP 33\nc=IN IP4 224.1.1.1\na=rtcp:4000\n").unwrap();
        assert_eq!(streams.primary.endpoint.rtcp_port, Some(4000));

        let err = extract("m=video 0 RTP/AVP 33\nc=IN IP4 224.1.1.1\na=rtcp:4000\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPort { stream: StreamKind::Primary, .. }));
    }

    #[test]
    fn test_as_range() {
        let err = extract("m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\nb=AS:40001\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBandwidth { .. }));
        let err = extract("m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\nb=AS:0\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBandwidth { .. }));
        let (streams, _) = extract("m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\nb=AS:40000\n").unwrap();
        assert_eq!(streams.primary.bit_rate, Some(40_000_000));
    }

    #[test]
    fn test_source_filter_checks() {
        let err = extract(
            "m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\na=source-filter: excl IN IP4 224.1.1.1 10.2.2.2\n",
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::SourceFilterExcluded { .. }));

        let err = extract(
            "m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\na=source-filter: incl IN IP4 224.9.9.9 10.2.2.2\n",
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::SourceFilterMismatch { .. }));
    }

    #[test]
    fn test_mp2t_disambiguation() {
        // The line with b=AS is the primary even when it comes second
        let (streams, _) = extract(
            "m=video 50010 RTP/AVP 96\nc=IN IP4 224.1.1.2\na=rtpmap:96 MP2T/90000\n\
             m=video 50000 RTP/AVP 96\nc=IN IP4 224.1.1.1\nb=AS:5500\na=rtpmap:96 MP2T/90000\n",
        )
        .unwrap();
        assert_eq!(streams.primary.endpoint.rtp_port, 50000);
        assert_eq!(streams.resourced.unwrap().rtp_port, 50010);

        let err = extract(
            "m=video 50010 RTP/AVP 33\nc=IN IP4 224.1.1.2\nb=AS:1\n\
             m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\nb=AS:1\n",
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateStream(StreamKind::Primary));

        let err = extract(
            "m=video 50000 RTP/AVP 33\nc=IN IP4 224.1.1.1\n\
             m=video 50010 RTP/AVP 33\nc=IN IP4 224.1.1.2\n\
             m=video 50020 RTP/AVP 33\nc=IN IP4 224.1.1.3\n",
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateStream(StreamKind::Resourced));
    }

    #[test]
    fn test_retransmission_stream() {
        let media = format!(
            "{}m=video 50002 RTP/AVPF 99\nc=IN IP4 10.1.1.1\na=sendonly\n\
             a=rtpmap:99 rtx/90000\na=fmtp:99 apt=96\n",
            PRIMARY
        );
        let (streams, warnings) = extract(&media).unwrap();
        let rtx = streams.rtx.unwrap();
        assert_eq!(rtx.apt, 96);
        assert_eq!(rtx.rtx_time_ms, DEFAULT_RTX_TIME_MS);
        assert_eq!(rtx.endpoint.rtcp_port, Some(50003));
        assert_eq!(warnings, vec![ExtractWarning::RtxTimeDefaulted(DEFAULT_RTX_TIME_MS)]);

        let multicast = media.replace("c=IN IP4 10.1.1.1", "c=IN IP4 224.1.1.9");
        assert!(matches!(extract(&multicast), Err(ValidationError::InvalidStream { .. })));

        let avp = media.replace("50002 RTP/AVPF", "50002 RTP/AVP");
        assert!(matches!(extract(&avp), Err(ValidationError::InvalidStream { .. })));

        let no_apt = media.replace("a=fmtp:99 apt=96", "a=fmtp:99 rtx-time=5000");
        assert_eq!(extract(&no_apt).unwrap_err(), ValidationError::MissingApt);
    }

    #[test]
    fn test_feedback_negotiation() {
        let media = format!("{}a=rtcp-fb:96 nack\na=rtcp-fb:* nack pli\n", PRIMARY);
        let (streams, _) = extract(&media).unwrap();
        assert!(streams.er_enable);
        assert!(streams.fcc_enable);

        let media = format!("{}a=rtcp-fb:97 nack\n", PRIMARY);
        assert!(matches!(
            extract(&media),
            Err(ValidationError::PayloadTypeMismatch { attribute: "rtcp-fb", .. })
        ));
    }

    #[test]
    fn test_fec_slots_fill_in_order() {
        let fec = |port: u16| {
            format!(
                "m=video {} RTP/AVP 100\nc=IN IP4 224.1.1.1\na=rtpmap:100 parityfec/90000\n",
                port
            )
        };
        let media = format!("{}{}{}", PRIMARY, fec(50004), fec(50006));
        let (streams, _) = extract(&media).unwrap();
        assert_eq!(streams.fec1.unwrap().rtp_port, 50004);
        assert_eq!(streams.fec2.unwrap().rtp_port, 50006);

        let media = format!("{}{}{}{}", PRIMARY, fec(50004), fec(50006), fec(50008));
        assert_eq!(extract(&media).unwrap_err(), ValidationError::DuplicateStream(StreamKind::Fec2));
    }

    #[test]
    fn test_linear_requires_multicast() {
        let err = extract("m=video 50000 RTP/AVP 33\nc=IN IP4 10.1.1.1\n").unwrap_err();
        assert!(matches!(err, ValidationError::NotMulticast { stream: StreamKind::Primary, .. }));

        let mut warnings = Vec::new();
        let vod = session("m=video 50000 RTP/AVP 33\nc=IN IP4 10.1.1.1\n");
        assert!(extract_streams(&vod, ChannelType::Vod, &mut warnings).is_ok());
    }
}
