//! Error types for tuneshelf-ingest
//!
//! Every stage error is local to one object: it is logged and then handled
//! according to the orchestrator's failure policy.

use thiserror::Error;

/// Result type for the ingestion entry points
pub type IngestResult<T> = Result<T, IngestError>;

/// Storage notification could not be decoded
#[derive(Debug, Error)]
pub enum EventError {
    /// Record carries no bucket name
    #[error("Record {0} has no bucket name")]
    MissingBucket(usize),

    /// Record carries no object key
    #[error("Record {0} has no object key")]
    MissingKey(usize),

    /// Object key is not valid percent-encoded UTF-8
    #[error("Object key '{key}' cannot be decoded: {reason}")]
    KeyDecode { key: String, reason: String },
}

/// Source object could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    /// Object does not exist
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Object exists but could not be read
    #[error("Object s3://{bucket}/{key} unreadable: {reason}")]
    Unreadable {
        bucket: String,
        key: String,
        reason: String,
    },
}

/// Tags could not be turned into track metadata
#[derive(Debug, Error)]
pub enum TagError {
    /// Stream is not decodable audio or its tags are corrupt
    #[error("Tag parse failed: {0}")]
    ParseFailure(String),

    /// Track number field contains no digits
    #[error("No track number in tag")]
    NoTrackNumber,
}

/// Transcode job submission failed
#[derive(Debug, Error)]
#[error("Transcode job submission failed: {0}")]
pub struct TranscodeSubmitError(pub String);

/// Keyed document storage rejected an operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Item is not a JSON object or lacks key attributes
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Backend rejected or failed the request
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// One view write failed
#[derive(Debug, Error)]
#[error("{view} view write failed: {source}")]
pub struct ViewWriteError {
    pub view: crate::writer::View,
    #[source]
    pub source: StoreError,
}

/// Invocation-level error
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failures surfaced under the propagate policy
    #[error("{failed} of {total} objects failed ingestion")]
    Failed { failed: usize, total: usize },
}
