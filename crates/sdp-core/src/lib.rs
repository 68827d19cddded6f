//! # SDP-Core: Session Description accessor for channel configuration
//!
//! This crate parses Session Description Protocol text (RFC 4566) into a
//! structured [`SdpSession`] and exposes it through the read-only
//! [`SessionAccessor`] trait that the channel extraction engine consumes.
//!
//! It deliberately does no channel-level validation: a description that is
//! syntactically valid SDP parses, whatever it describes.
//!
//! ## Usage
//!
//! ```rust
//! use chancfg_sdp_core::{SdpSession, SessionAccessor};
//!
//! let text = "v=0\r\n\
//! o=- 1 1 IN IP4 10.1.1.1\r\n\
//! s=Channel 1\r\n\
//! t=0 0\r\n\
//! m=video 50000 RTP/AVP 96\r\n\
//! c=IN IP4 224.1.1.1/255\r\n\
//! a=rtpmap:96 MP2T/90000\r\n";
//!
//! let session = SdpSession::parse(text)?;
//! assert_eq!(session.media_count(), 1);
//! assert_eq!(session.media_connection(0).unwrap().address, "224.1.1.1");
//!
//! // Rendering gives canonical SDP text back
//! assert_eq!(SdpSession::parse(&session.to_string())?, session);
//! # Ok::<(), chancfg_sdp_core::SdpError>(())
//! ```

pub mod accessor;
pub mod error;
pub mod parser;
pub mod types;

pub use accessor::SessionAccessor;
pub use error::{Result, SdpError};
pub use types::{
    Attribute, Bandwidth, ConnectionData, Group, MediaDescription, Origin, SdpSession, Timing,
};
