//! # Channel-Core: multicast video channel configuration
//!
//! Validates session descriptions describing multicast video channels,
//! keeps the accepted channels in a registry indexed for uniqueness, and
//! replaces the whole configuration atomically when a new document
//! arrives.
//!
//! ## Layers
//!
//! - [`extract`]: one session description in, one [`ChannelCfg`] (or a
//!   reason) out
//! - [`registry`]: channel storage with the session-key index and the two
//!   (address, port) [`map`]s
//! - [`update`]: the stage / validate / commit protocol
//! - [`manager`]: live snapshot ownership, file load and save
//! - [`render`]: channel back to canonical SDP text
//!
//! ## Usage
//!
//! ```rust
//! use chancfg_channel_core::{ChannelManager, ChannelMode, ChannelRole};
//!
//! let document = "v=0\n\
//! o=- 1001 1 IN IP4 10.1.1.1\n\
//! s=Channel 1\n\
//! t=0 0\n\
//! m=video 50000 RTP/AVP 33\n\
//! c=IN IP4 224.1.1.1/255\n\
//! a=recvonly\n\
//! a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2\n";
//!
//! let manager = ChannelManager::default();
//! let report = manager.apply_document(document)?;
//! assert_eq!(report.added, 1);
//!
//! let (_, channel) = manager.lookup_primary("224.1.1.1".parse()?, 50000).unwrap();
//! assert_eq!((channel.role, channel.mode), (ChannelRole::SetTop, ChannelMode::RecvOnly));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod channel;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod handle;
pub mod logging;
pub mod manager;
pub mod map;
pub mod registry;
pub mod render;
pub mod update;

pub use channel::{
    ChannelCfg, ChannelMode, ChannelRole, ChannelType, SessionIdentity, SessionKey, StreamKind,
};
pub use config::{EngineConfig, RegistryConfig};
pub use document::{render_document, split_sessions};
pub use error::{ConfigError, ExtractError, MapError, PersistError, RegistryError, UpdateError, ValidationError};
pub use extract::{extract_channel, extract_text, ExtractWarning, Extraction};
pub use handle::ChannelHandle;
pub use logging::{setup_logging, LoggingConfig};
pub use manager::ChannelManager;
pub use registry::{ChannelRegistry, RegistryCounters};
pub use render::{render_channel, render_session};
pub use update::{UpdateCoordinator, UpdateReport, UpdateState};
