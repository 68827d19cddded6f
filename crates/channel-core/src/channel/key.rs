//! Session identity
//!
//! A channel is identified by the creator fields of its o= line. The
//! version field travels with it but never takes part in equality.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use chancfg_sdp_core::Origin;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest decimal version accepted; `u64::MAX` has 20 digits
const MAX_VERSION_DIGITS: usize = 20;

/// Globally unique channel key: `<username> <session-id> IN IP4 <creator>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub username: String,
    pub session_id: String,
    pub creator: Ipv4Addr,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} IN IP4 {}", self.username, self.session_id, self.creator)
    }
}

/// Key plus version, as carried on an o= line.
///
/// Two identities are equivalent when their keys match, whatever their
/// versions.
#[derive(Debug, Clone, Serialize)]
pub struct SessionIdentity {
    pub key: SessionKey,
    pub version: u64,
}

impl SessionIdentity {
    /// Classify the text fields of a parsed origin line
    pub fn from_origin(origin: &Origin) -> Result<Self, ValidationError> {
        if origin.net_type != "IN" || origin.addr_type != "IP4" {
            return Err(ValidationError::UnsupportedAddressFamily {
                net_type: origin.net_type.clone(),
                addr_type: origin.addr_type.clone(),
            });
        }
        let creator = origin
            .unicast_address
            .parse::<Ipv4Addr>()
            .map_err(|_| ValidationError::InvalidAddress(origin.unicast_address.clone()))?;

        Ok(Self {
            key: SessionKey {
                username: origin.username.clone(),
                session_id: origin.session_id.clone(),
                creator,
            },
            version: parse_version(&origin.session_version)?,
        })
    }

    /// Whether both identities name the same channel
    pub fn matches(&self, other: &SessionIdentity) -> bool {
        self.key == other.key
    }
}

impl PartialEq for SessionIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for SessionIdentity {}

impl FromStr for SessionIdentity {
    type Err = ValidationError;

    /// Parse `o=<username> <session-id> <version> IN IP4 <creator>`; the
    /// leading `o=` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let text = text.strip_prefix("o=").unwrap_or(text);
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [username, session_id, version, net_type, addr_type, address] = tokens[..] else {
            return Err(ValidationError::InvalidIdentity(s.to_string()));
        };
        Self::from_origin(&Origin {
            username: username.to_string(),
            session_id: session_id.to_string(),
            session_version: version.to_string(),
            net_type: net_type.to_string(),
            addr_type: addr_type.to_string(),
            unicast_address: address.to_string(),
        })
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "o={} {} {} IN IP4 {}",
            self.key.username, self.key.session_id, self.version, self.key.creator
        )
    }
}

/// Decimal session version: digits only, at most 20 of them, and it must
/// fit in 64 bits.
pub fn parse_version(text: &str) -> Result<u64, ValidationError> {
    if text.is_empty() || text.len() > MAX_VERSION_DIGITS || !text.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ValidationError::InvalidVersion(text.to_string()));
    }
    text.parse::<u64>()
        .map_err(|_| ValidationError::InvalidVersion(text.to_string()))
}
