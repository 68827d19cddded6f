//! RTCP extended report settings (`a=rtcp-xr`, RFC 3611)

use chancfg_sdp_core::MediaDescription;

use super::ExtractWarning;
use crate::channel::{RunLengthLimit, StatSummary, StreamKind, XrConfig};
use crate::error::ValidationError;

/// Bytes of report block header counted in a run-length size
pub const XR_HEADER_BYTES: u16 = 12;

/// Collect XR settings from a media section.
///
/// The primary stream takes every supported token. The retransmission
/// stream only takes the loss run-length and statistics summary blocks;
/// anything else on it is masked with a warning.
pub(crate) fn parse_xr(
    media: &MediaDescription,
    stream: StreamKind,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<XrConfig, ValidationError> {
    let full = stream == StreamKind::Primary;
    let mut xr = XrConfig::default();

    for value in media.attributes_named("rtcp-xr").filter_map(|a| a.value.as_deref()) {
        for token in value.split_whitespace() {
            let (name, arg) = match token.split_once('=') {
                Some((name, arg)) => (name, Some(arg)),
                None => (token, None),
            };
            match name {
                "pkt-loss-rle" => xr.loss_rle = Some(run_length(token, arg, stream, warnings)?),
                "stat-summary" => xr.stat_summary = stat_summary(arg, stream, warnings),
                "post-repair-loss-rle" if full => {
                    xr.post_repair_loss_rle = Some(run_length(token, arg, stream, warnings)?)
                }
                "multicast-acq" if full => xr.multicast_acq = true,
                "vqe-diagnostic-counters" if full => xr.diagnostic_counters = true,
                "post-repair-loss-rle" | "multicast-acq" | "vqe-diagnostic-counters" => {
                    warnings.push(ExtractWarning::XrTokenMasked {
                        stream,
                        token: token.to_string(),
                    })
                }
                _ => warnings.push(ExtractWarning::XrTokenIgnored {
                    stream,
                    token: token.to_string(),
                }),
            }
        }
    }

    if media.has_attribute("rtcp-rsize") {
        if full {
            xr.rtcp_rsize = true;
        } else {
            warnings.push(ExtractWarning::XrTokenMasked {
                stream,
                token: "rtcp-rsize".to_string(),
            });
        }
    }

    Ok(xr)
}

fn run_length(
    token: &str,
    arg: Option<&str>,
    stream: StreamKind,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<RunLengthLimit, ValidationError> {
    let Some(arg) = arg else {
        return Ok(RunLengthLimit::Unlimited);
    };
    let bytes = arg.parse::<u16>().map_err(|_| ValidationError::InvalidAttribute {
        stream,
        attribute: "rtcp-xr",
        value: token.to_string(),
    })?;
    if bytes < XR_HEADER_BYTES {
        warnings.push(ExtractWarning::RunLengthClamped {
            stream,
            token: token.to_string(),
        });
        return Ok(RunLengthLimit::MaxBytes(0));
    }
    Ok(RunLengthLimit::MaxBytes(bytes - XR_HEADER_BYTES))
}

fn stat_summary(
    arg: Option<&str>,
    stream: StreamKind,
    warnings: &mut Vec<ExtractWarning>,
) -> StatSummary {
    let mut stats = StatSummary::default();
    for flag in arg.unwrap_or_default().split(',').map(str::trim).filter(|f| !f.is_empty()) {
        match flag {
            "loss" => stats.loss = true,
            "dup" => stats.duplicates = true,
            "jitt" => stats.jitter = true,
            // TTL, HL and anything unknown
            _ => warnings.push(ExtractWarning::StatFlagMasked {
                stream,
                flag: flag.to_string(),
            }),
        }
    }
    stats
}

/// `a=rtcp-xr` value for a stream, if it reports anything
pub(crate) fn render_xr(xr: &XrConfig) -> Option<String> {
    fn limit(name: &str, limit: RunLengthLimit) -> String {
        match limit {
            RunLengthLimit::Unlimited => name.to_string(),
            RunLengthLimit::MaxBytes(bytes) => {
                format!("{}={}", name, u32::from(bytes) + u32::from(XR_HEADER_BYTES))
            }
        }
    }

    let mut tokens = Vec::new();
    if let Some(loss) = xr.loss_rle {
        tokens.push(limit("pkt-loss-rle", loss));
    }
    if let Some(post) = xr.post_repair_loss_rle {
        tokens.push(limit("post-repair-loss-rle", post));
    }
    if xr.stat_summary.any() {
        let flags: Vec<&str> = [
            (xr.stat_summary.loss, "loss"),
            (xr.stat_summary.duplicates, "dup"),
            (xr.stat_summary.jitter, "jitt"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        tokens.push(format!("stat-summary={}", flags.join(",")));
    }
    if xr.multicast_acq {
        tokens.push("multicast-acq".to_string());
    }
    if xr.diagnostic_counters {
        tokens.push("vqe-diagnostic-counters".to_string());
    }

    (!tokens.is_empty()).then(|| tokens.join(" "))
}
