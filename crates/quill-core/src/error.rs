//! Error types for Quill Core.

use thiserror::Error;

/// Core errors that can occur while encoding or decoding registry data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("unknown event kind: {0}")]
    UnknownEventKind(u16),
}

/// Validation errors for caller-supplied payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("content is {len} bytes, maximum is {max}")]
    ContentTooLarge { len: usize, max: usize },

    #[error("attachment reference must not be empty")]
    EmptyReference,

    #[error("name is empty after normalization")]
    EmptyName,

    #[error("batch must contain at least one item")]
    EmptyBatch,

    #[error("batch has {titles} titles but {contents} contents")]
    BatchLengthMismatch { titles: usize, contents: usize },

    #[error("batch item {index}: {source}")]
    BatchItem {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}
