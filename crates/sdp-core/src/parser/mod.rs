//! # SDP Parser
//!
//! Turns SDP text into an [`SdpSession`]. The parser enforces the RFC 4566
//! field order for the lines this stack relies on:
//!
//! 1. `v=` must be first and must be `0`
//! 2. `o=` must be second
//! 3. `s=` must be third
//! 4. `t=` must appear before the first `m=`
//!
//! Everything after an `m=` line up to the next `m=` line belongs to that
//! media description. Lines this stack has no use for (`u=`, `e=`, `p=`,
//! `k=`, `r=`, `z=`) are accepted and dropped.

mod fields;
mod line_parser;

pub use line_parser::parse_sdp_line;

use crate::error::{Result, SdpError};
use crate::types::{MediaDescription, Origin, SdpSession, Timing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FieldOrder {
    Version,
    Origin,
    SessionName,
    SessionLevel,
    Media,
}

/// Parse SDP text into an [`SdpSession`].
///
/// Both CRLF and LF line endings are accepted and blank lines are skipped.
///
/// ```
/// use chancfg_sdp_core::parser::parse_sdp;
///
/// let sdp = "v=0\r\no=- 1 1 IN IP4 10.1.1.1\r\ns=Ch 1\r\nt=0 0\r\nm=video 50000 udp 33\r\n";
/// let session = parse_sdp(sdp).unwrap();
/// assert_eq!(session.session_name, "Ch 1");
/// assert_eq!(session.media[0].port, 50000);
/// ```
pub fn parse_sdp(text: &str) -> Result<SdpSession> {
    let mut position = FieldOrder::Version;
    let mut origin: Option<Origin> = None;
    let mut session_name: Option<String> = None;
    let mut timing: Option<Timing> = None;
    let mut session = SdpSession::new(empty_origin(), "");
    let mut current: Option<MediaDescription> = None;
    let mut saw_line = false;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        saw_line = true;

        let (key, value) = match parse_sdp_line(line) {
            Ok((_, parsed)) => parsed,
            Err(_) => {
                return Err(SdpError::MalformedLine {
                    line: line_no,
                    content: line.to_string(),
                })
            }
        };

        match key {
            'v' => {
                if position != FieldOrder::Version {
                    return Err(out_of_order('v', line_no, "v= must be the first line"));
                }
                if value != "0" {
                    return Err(SdpError::UnsupportedVersion(value.to_string()));
                }
                position = FieldOrder::Origin;
            }
            'o' => {
                if position != FieldOrder::Origin {
                    return Err(out_of_order('o', line_no, "o= must directly follow v="));
                }
                let (_, parsed) =
                    fields::origin(value).map_err(|_| SdpError::invalid_field('o', line_no, value))?;
                origin = Some(parsed);
                position = FieldOrder::SessionName;
            }
            's' => {
                if position != FieldOrder::SessionName {
                    return Err(out_of_order('s', line_no, "s= must directly follow o="));
                }
                session_name = Some(value.to_string());
                position = FieldOrder::SessionLevel;
            }
            _ if position < FieldOrder::SessionLevel => {
                return Err(out_of_order(key, line_no, "v=, o= and s= must come first"));
            }
            'i' => match current.as_mut() {
                Some(media) => media.information = Some(value.to_string()),
                None => session.information = Some(value.to_string()),
            },
            'c' => {
                let (_, parsed) = fields::connection(value)
                    .map_err(|_| SdpError::invalid_field('c', line_no, value))?;
                match current.as_mut() {
                    Some(media) => media.connection = Some(parsed),
                    None => session.connection = Some(parsed),
                }
            }
            'b' => {
                let (_, parsed) = fields::bandwidth(value)
                    .map_err(|_| SdpError::invalid_field('b', line_no, value))?;
                match current.as_mut() {
                    Some(media) => media.bandwidths.push(parsed),
                    None => session.bandwidths.push(parsed),
                }
            }
            't' => {
                if position == FieldOrder::Media {
                    return Err(out_of_order('t', line_no, "t= must come before m="));
                }
                let (_, parsed) =
                    fields::timing(value).map_err(|_| SdpError::invalid_field('t', line_no, value))?;
                // Only the first time description is meaningful here
                if timing.is_none() {
                    timing = Some(parsed);
                }
            }
            'a' => {
                let (_, parsed) = fields::attribute(value)
                    .map_err(|_| SdpError::invalid_field('a', line_no, value))?;
                match current.as_mut() {
                    Some(media) => media.attributes.push(parsed),
                    None => session.attributes.push(parsed),
                }
            }
            'm' => {
                if timing.is_none() {
                    return Err(out_of_order('m', line_no, "t= must come before m="));
                }
                let (_, parsed) =
                    fields::media(value).map_err(|_| SdpError::invalid_field('m', line_no, value))?;
                if let Some(done) = current.replace(parsed) {
                    session.media.push(done);
                }
                position = FieldOrder::Media;
            }
            'u' | 'e' | 'p' | 'k' | 'r' | 'z' => {
                tracing::trace!(line = line_no, "ignoring {}= line", key);
            }
            other => {
                return Err(SdpError::MalformedLine {
                    line: line_no,
                    content: format!("unknown line type '{}'", other),
                })
            }
        }
    }

    if !saw_line {
        return Err(SdpError::Empty);
    }
    if let Some(done) = current.take() {
        session.media.push(done);
    }

    session.origin = origin.ok_or(SdpError::MissingField('o'))?;
    session.session_name = session_name.ok_or(SdpError::MissingField('s'))?;
    session.timing = timing.ok_or(SdpError::MissingField('t'))?;
    Ok(session)
}

fn out_of_order(kind: char, line: usize, reason: &'static str) -> SdpError {
    SdpError::OutOfOrder { kind, line, reason }
}

fn empty_origin() -> Origin {
    Origin {
        username: String::new(),
        session_id: String::new(),
        session_version: String::new(),
        net_type: String::new(),
        addr_type: String::new(),
        unicast_address: String::new(),
    }
}
