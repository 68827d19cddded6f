//! Read-only query interface over a parsed session description.
//!
//! Consumers that validate sessions (the channel extraction engine) depend
//! on this trait rather than on [`SdpSession`] directly, so any parser that
//! can answer these questions can feed them.

use crate::types::{
    Attribute, Bandwidth, ConnectionData, Group, MediaDescription, Origin, SdpSession, Timing,
};

/// Query interface over one parsed session description
pub trait SessionAccessor {
    /// Origin (o=) line
    fn origin(&self) -> &Origin;

    /// Session name (s=)
    fn session_name(&self) -> &str;

    /// First time description (t=)
    fn timing(&self) -> &Timing;

    /// Session-level connection data
    fn session_connection(&self) -> Option<&ConnectionData>;

    /// Session-level attributes in document order
    fn session_attributes(&self) -> &[Attribute];

    /// Session-level bandwidth lines
    fn session_bandwidths(&self) -> &[Bandwidth];

    /// Number of m= lines
    fn media_count(&self) -> usize;

    /// Media description by position
    fn media(&self, index: usize) -> Option<&MediaDescription>;

    /// First session-level attribute with the given name
    fn session_attribute(&self, name: &str) -> Option<&Attribute> {
        self.session_attributes().iter().find(|a| a.name == name)
    }

    /// Connection data that applies to a media description: its own c=
    /// line, falling back to the session-level one.
    fn media_connection(&self, index: usize) -> Option<&ConnectionData> {
        let media = self.media(index)?;
        media
            .connection
            .as_ref()
            .or_else(|| self.session_connection())
    }

    /// All `a=group` lines, parsed. Group lines without a semantics token
    /// are skipped.
    fn groups(&self) -> Vec<Group> {
        self.session_attributes()
            .iter()
            .filter(|a| a.name == "group")
            .filter_map(|a| a.value.as_deref().and_then(Group::from_attribute_value))
            .collect()
    }
}

impl SessionAccessor for SdpSession {
    fn origin(&self) -> &Origin {
        &self.origin
    }

    fn session_name(&self) -> &str {
        &self.session_name
    }

    fn timing(&self) -> &Timing {
        &self.timing
    }

    fn session_connection(&self) -> Option<&ConnectionData> {
        self.connection.as_ref()
    }

    fn session_attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn session_bandwidths(&self) -> &[Bandwidth] {
        &self.bandwidths
    }

    fn media_count(&self) -> usize {
        self.media.len()
    }

    fn media(&self, index: usize) -> Option<&MediaDescription> {
        self.media.get(index)
    }
}
