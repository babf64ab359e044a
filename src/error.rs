//! Per-field unavailability reasons

use thiserror::Error;

/// Why a single snapshot field could not be determined.
///
/// This is an expected, recoverable condition: the field is reported as
/// unavailable and the capture carries on with the remaining sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldUnavailable {
    #[error("not supported on this platform")]
    Unsupported,

    #[error("no rendering context is current on this thread")]
    NoRenderContext,

    #[error("{source_name} query failed: {detail}")]
    QueryFailed {
        source_name: &'static str,
        detail: String,
    },

    #[error("{source_name} returned an empty value")]
    Empty { source_name: &'static str },

    #[error("{source_name} returned text that is not valid UTF-8")]
    InvalidText { source_name: &'static str },
}

impl FieldUnavailable {
    /// Create a query failure
    pub fn query<S: Into<String>>(source_name: &'static str, detail: S) -> Self {
        FieldUnavailable::QueryFailed {
            source_name,
            detail: detail.into(),
        }
    }
}
