//! Error types for SDP parsing

use thiserror::Error;

/// Result type alias for SDP operations
pub type Result<T> = std::result::Result<T, SdpError>;

/// Errors raised while turning SDP text into a [`crate::SdpSession`].
///
/// Every variant describes a syntax problem. Semantic checks (is this a
/// sensible channel?) belong to the consumers of the accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdpError {
    /// The description contained no lines at all
    #[error("Empty session description")]
    Empty,

    /// A line did not have the `<type>=<value>` shape
    #[error("Malformed SDP line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    /// A line had the right shape but an unparseable value
    #[error("Invalid {kind}= line {line}: {value:?}")]
    InvalidField { kind: char, line: usize, value: String },

    /// A mandatory line never appeared
    #[error("Missing mandatory {0}= line")]
    MissingField(char),

    /// A line appeared where the field order forbids it
    #[error("{kind}= line {line} out of order: {reason}")]
    OutOfOrder {
        kind: char,
        line: usize,
        reason: &'static str,
    },

    /// v= carried something other than 0
    #[error("Unsupported SDP protocol version: {0}")]
    UnsupportedVersion(String),
}

impl SdpError {
    /// Create an invalid field error
    pub fn invalid_field(kind: char, line: usize, value: impl Into<String>) -> Self {
        Self::InvalidField {
            kind,
            line,
            value: value.into(),
        }
    }

    /// Line number the error refers to, when there is one
    pub fn line(&self) -> Option<usize> {
        match self {
            SdpError::MalformedLine { line, .. }
            | SdpError::InvalidField { line, .. }
            | SdpError::OutOfOrder { line, .. } => Some(*line),
            _ => None,
        }
    }
}
