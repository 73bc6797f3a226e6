//! Error types for the translation pipeline

use thiserror::Error;

/// A frame that does not match the H02 location grammar.
///
/// Any mismatch, including numeric sub-fields that fail to convert, collapses
/// into this one error. No partially decoded position is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Frame does not match the location message grammar
    #[error("malformed frame")]
    Malformed,

    /// Frame matched the grammar but a field could not be converted
    #[error("malformed frame: invalid {field} {value:?}")]
    InvalidField {
        /// Name of the offending capture
        field: &'static str,
        /// Raw text of the capture
        value: String,
    },
}

impl ParseError {
    pub(crate) fn invalid(field: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}

/// Errors from device identity resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No configured device carries this hardware id
    #[error("config for device id {0} not found")]
    NotFound(u64),
}

/// Errors from handing a location report to the message bus
#[derive(Debug, Error)]
pub enum PublishError {
    /// Record could not be serialized to JSON
    #[error("failed to encode location report: {0}")]
    Encode(#[from] serde_json::Error),

    /// Bus client rejected the publish
    #[error("bus transport error: {0}")]
    Transport(String),

    /// Publish did not complete before the deadline
    #[error("publish timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Why a frame was dropped by the gateway
#[derive(Debug, Error)]
pub enum DropReason {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    UnknownDevice(#[from] ResolveError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
