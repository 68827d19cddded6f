//! Channel record model and session identity

pub mod key;
pub mod types;

pub use key::{parse_version, SessionIdentity, SessionKey};
pub use types::*;
