//! Collaborator interfaces
//!
//! The orchestrator and writer only see these traits. AWS-backed
//! implementations live in [`crate::aws`], in-memory ones in [`crate::memory`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{FetchError, StoreError, TranscodeSubmitError};

/// Stored document: attribute name → JSON value
pub type Item = Map<String, Value>;

/// Object storage holding the uploaded files
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object content
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError>;
}

/// Input container value asking the transcoder to detect the format
pub const CONTAINER_AUTO: &str = "auto";

/// Transcode job request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub pipeline_id: String,
    pub input_key: String,
    pub input_container: String,
    pub output_key: String,
    pub preset_id: String,
    /// Passed through to the job for provenance
    pub user_metadata: BTreeMap<String, String>,
}

/// Handle of a submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

/// Managed transcoding service
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn create_job(&self, job: &TranscodeJob) -> Result<JobHandle, TranscodeSubmitError>;
}

/// Atomic "append to list, creating it if absent" update
#[derive(Debug, Clone, PartialEq)]
pub struct ListAppend {
    /// Primary key attributes of the target item
    pub key: Item,
    /// Attribute holding the list
    pub list_attribute: String,
    /// Element appended to the end of the list
    pub entry: Value,
    /// Scalar attributes set alongside the append
    pub set: Item,
}

/// Keyed document storage holding the views
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Write an item, replacing any item with the same primary key
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError>;

    /// Append one element to a list attribute; must not lose concurrent appends
    async fn append_to_list(&self, table: &str, update: ListAppend) -> Result<(), StoreError>;
}

/// Serialize a record into a stored item
pub fn to_item<T: serde::Serialize>(record: &T) -> Result<Item, StoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidItem(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::InvalidItem(e.to_string())),
    }
}
