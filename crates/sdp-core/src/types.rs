//! SDP data model
//!
//! Structured representation of a parsed session description (RFC 4566).
//! Every type implements [`fmt::Display`] producing the canonical wire form,
//! so a session built in memory can be written back out as SDP text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdpError};
use crate::parser::parse_sdp;

/// Line terminator used when rendering
pub const CRLF: &str = "\r\n";

/// Represents the Origin (o=) field.
///
/// Format: `o=<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>`
///
/// Version, network type and address type are kept as text; deciding
/// whether they are acceptable is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Username of the originator (often "-")
    pub username: String,
    /// Session ID
    pub session_id: String,
    /// Session version
    pub session_version: String,
    /// Network type (typically "IN")
    pub net_type: String,
    /// Address type ("IP4" or "IP6")
    pub addr_type: String,
    /// Unicast address of the creator
    pub unicast_address: String,
}

/// Represents the Connection Data (c=) field.
///
/// Format: `c=<nettype> <addrtype> <connection-address>[/<ttl>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub net_type: String,
    pub addr_type: String,
    /// Address without the TTL suffix
    pub address: String,
    /// Multicast TTL, when given
    pub ttl: Option<u8>,
}

impl ConnectionData {
    /// IPv4 connection data
    pub fn ip4(address: impl Into<String>, ttl: Option<u8>) -> Self {
        Self {
            net_type: "IN".to_string(),
            addr_type: "IP4".to_string(),
            address: address.into(),
            ttl,
        }
    }
}

/// Represents the Timing (t=) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timing {
    /// Start time (0 means permanent)
    pub start: u64,
    /// Stop time (0 means open-ended)
    pub stop: u64,
}

/// Represents a Bandwidth (b=) line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    /// Bandwidth type token (AS, RS, RR, CT, ...)
    pub bw_type: String,
    pub value: u64,
}

impl Bandwidth {
    pub fn new(bw_type: impl Into<String>, value: u64) -> Self {
        Self {
            bw_type: bw_type.into(),
            value,
        }
    }
}

/// Represents an attribute (a=) line, either a flag or a name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// A property attribute (`a=<name>`)
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// A value attribute (`a=<name>:<value>`)
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// A parsed `a=group:<semantics> <mid> ...` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Grouping semantics, e.g. "FID" or "FEC"
    pub semantics: String,
    /// Media identification tags in the order they were listed
    pub mids: Vec<String>,
}

impl Group {
    /// Parse the value of a group attribute. Returns `None` when no
    /// semantics token is present.
    pub fn from_attribute_value(value: &str) -> Option<Self> {
        let mut tokens = value.split_whitespace();
        let semantics = tokens.next()?.to_string();
        Some(Self {
            semantics,
            mids: tokens.map(str::to_string).collect(),
        })
    }

    pub fn to_attribute(&self) -> Attribute {
        let mut value = self.semantics.clone();
        for mid in &self.mids {
            value.push(' ');
            value.push_str(mid);
        }
        Attribute::value("group", value)
    }
}

/// Represents a media description: the m= line and everything up to the
/// next m= line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescription {
    /// Media type ("video", "audio", ...)
    pub media: String,
    pub port: u16,
    pub port_count: Option<u16>,
    /// Transport protocol ("udp", "RTP/AVP", "RTP/AVPF", ...)
    pub protocol: String,
    /// Format list; payload type numbers for RTP transports
    pub formats: Vec<String>,
    /// Media title (i=)
    pub information: Option<String>,
    /// Media-level connection data (c=)
    pub connection: Option<ConnectionData>,
    pub bandwidths: Vec<Bandwidth>,
    pub attributes: Vec<Attribute>,
}

impl MediaDescription {
    pub fn new(
        media: impl Into<String>,
        port: u16,
        protocol: impl Into<String>,
        formats: Vec<String>,
    ) -> Self {
        Self {
            media: media.into(),
            port,
            port_count: None,
            protocol: protocol.into(),
            formats,
            information: None,
            connection: None,
            bandwidths: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// First attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Value of the first attribute with the given name
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|a| a.value.as_deref())
    }

    /// All attributes with the given name, in document order
    pub fn attributes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.attributes.iter().filter(move |a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Value of the first b= line of the given type
    pub fn bandwidth(&self, bw_type: &str) -> Option<u64> {
        self.bandwidths
            .iter()
            .find(|b| b.bw_type == bw_type)
            .map(|b| b.value)
    }

    pub fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn push_bandwidth(&mut self, bw_type: &str, value: u64) {
        self.bandwidths.push(Bandwidth::new(bw_type, value));
    }
}

/// A complete session description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdpSession {
    /// Protocol version (v=), always "0"
    pub version: String,
    pub origin: Origin,
    /// Session name (s=)
    pub session_name: String,
    /// Session information (i=)
    pub information: Option<String>,
    /// Session-level connection data (c=)
    pub connection: Option<ConnectionData>,
    pub bandwidths: Vec<Bandwidth>,
    pub timing: Timing,
    /// Session-level attributes
    pub attributes: Vec<Attribute>,
    pub media: Vec<MediaDescription>,
}

impl SdpSession {
    /// Create an empty session with a permanent (t=0 0) timing line
    pub fn new(origin: Origin, session_name: impl Into<String>) -> Self {
        Self {
            version: "0".to_string(),
            origin,
            session_name: session_name.into(),
            information: None,
            connection: None,
            bandwidths: Vec::new(),
            timing: Timing::default(),
            attributes: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Parse SDP text
    pub fn parse(text: &str) -> Result<Self> {
        parse_sdp(text)
    }

    /// Add a session-level attribute
    pub fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Add a media description
    pub fn push_media(&mut self, media: MediaDescription) {
        self.media.push(media);
    }
}

impl FromStr for SdpSession {
    type Err = SdpError;

    fn from_str(s: &str) -> Result<Self> {
        parse_sdp(s)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.session_id,
            self.session_version,
            self.net_type,
            self.addr_type,
            self.unicast_address
        )
    }
}

impl fmt::Display for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.net_type, self.addr_type, self.address)?;
        if let Some(ttl) = self.ttl {
            write!(f, "/{}", ttl)?;
        }
        Ok(())
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.stop)
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bw_type, self.value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for MediaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m={} {}", self.media, self.port)?;
        if let Some(count) = self.port_count {
            write!(f, "/{}", count)?;
        }
        write!(f, " {} {}{}", self.protocol, self.formats.join(" "), CRLF)?;
        if let Some(info) = &self.information {
            write!(f, "i={}{}", info, CRLF)?;
        }
        if let Some(conn) = &self.connection {
            write!(f, "c={}{}", conn, CRLF)?;
        }
        for bw in &self.bandwidths {
            write!(f, "b={}{}", bw, CRLF)?;
        }
        for attr in &self.attributes {
            write!(f, "a={}{}", attr, CRLF)?;
        }
        Ok(())
    }
}

impl fmt::Display for SdpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v={}{}", self.version, CRLF)?;
        write!(f, "o={}{}", self.origin, CRLF)?;
        write!(f, "s={}{}", self.session_name, CRLF)?;
        if let Some(info) = &self.information {
            write!(f, "i={}{}", info, CRLF)?;
        }
        if let Some(conn) = &self.connection {
            write!(f, "c={}{}", conn, CRLF)?;
        }
        for bw in &self.bandwidths {
            write!(f, "b={}{}", bw, CRLF)?;
        }
        write!(f, "t={}{}", self.timing, CRLF)?;
        for attr in &self.attributes {
            write!(f, "a={}{}", attr, CRLF)?;
        }
        for media in &self.media {
            write!(f, "{}", media)?;
        }
        Ok(())
    }
}
