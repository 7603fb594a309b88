//! In-memory collaborators
//!
//! Process-local stand-ins for object storage, the transcoder and the view
//! store. Each one can be told to fail so error paths are reachable without
//! a network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{FetchError, StoreError, TranscodeSubmitError};
use crate::store::{Item, JobHandle, ListAppend, ObjectStore, TranscodeJob, Transcoder, ViewStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Object storage backed by a map
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, content: impl Into<Vec<u8>>) {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), content.into());
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

/// Transcoder that records submitted jobs
#[derive(Debug, Default)]
pub struct RecordingTranscoder {
    jobs: Mutex<Vec<TranscodeJob>>,
    failure: Mutex<Option<String>>,
}

impl RecordingTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following submission with `reason`
    pub fn fail_with(&self, reason: impl Into<String>) {
        *lock(&self.failure) = Some(reason.into());
    }

    /// Jobs accepted so far
    pub fn jobs(&self) -> Vec<TranscodeJob> {
        lock(&self.jobs).clone()
    }
}

#[async_trait]
impl Transcoder for RecordingTranscoder {
    async fn create_job(&self, job: &TranscodeJob) -> Result<JobHandle, TranscodeSubmitError> {
        if let Some(reason) = lock(&self.failure).clone() {
            return Err(TranscodeSubmitError(reason));
        }

        let mut jobs = lock(&self.jobs);
        jobs.push(job.clone());
        Ok(JobHandle {
            id: format!("job-{}", jobs.len()),
        })
    }
}

#[derive(Debug)]
struct MemoryTable {
    key_attributes: Vec<String>,
    items: BTreeMap<String, Item>,
    writes: usize,
}

impl MemoryTable {
    /// Identity of an item: its key attribute values in schema order
    fn identity(&self, item: &Item) -> Result<String, StoreError> {
        let values = self
            .key_attributes
            .iter()
            .map(|attr| {
                item.get(attr)
                    .cloned()
                    .ok_or_else(|| StoreError::InvalidItem(format!("missing key attribute '{}'", attr)))
            })
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(Value::Array(values).to_string())
    }
}

/// Document store with per-table key schemas
///
/// Every operation holds the store lock for its whole read-modify-write, so
/// list appends are atomic.
#[derive(Debug, Default)]
pub struct MemoryViewStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table keyed by `key_attributes`
    pub fn with_table(self, name: &str, key_attributes: &[&str]) -> Self {
        lock(&self.tables).insert(
            name.to_string(),
            MemoryTable {
                key_attributes: key_attributes.iter().map(|a| a.to_string()).collect(),
                items: BTreeMap::new(),
                writes: 0,
            },
        );
        self
    }

    /// Reject every following write to `table`
    pub fn fail_table(&self, table: &str) {
        lock(&self.failing).insert(table.to_string());
    }

    /// Current items of `table`, ordered by key
    pub fn items(&self, table: &str) -> Vec<Item> {
        lock(&self.tables)
            .get(table)
            .map(|t| t.items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Item of `table` whose key attributes equal `key`
    pub fn get(&self, table: &str, key: &Item) -> Option<Item> {
        let tables = lock(&self.tables);
        let table = tables.get(table)?;
        let identity = table.identity(key).ok()?;
        table.items.get(&identity).cloned()
    }

    /// Accepted writes to `table`, including overwrites
    pub fn write_count(&self, table: &str) -> usize {
        lock(&self.tables).get(table).map(|t| t.writes).unwrap_or(0)
    }

    /// Accepted writes across all tables
    pub fn total_writes(&self) -> usize {
        lock(&self.tables).values().map(|t| t.writes).sum()
    }

    fn check_available(&self, table: &str) -> Result<(), StoreError> {
        if lock(&self.failing).contains(table) {
            return Err(StoreError::Backend(format!("table '{}' unavailable", table)));
        }
        Ok(())
    }
}

fn no_such_table(table: &str) -> StoreError {
    StoreError::Backend(format!("no such table '{}'", table))
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        self.check_available(table)?;

        let mut tables = lock(&self.tables);
        let target = tables.get_mut(table).ok_or_else(|| no_such_table(table))?;
        let identity = target.identity(&item)?;
        target.items.insert(identity, item);
        target.writes += 1;
        Ok(())
    }

    async fn append_to_list(&self, table: &str, update: ListAppend) -> Result<(), StoreError> {
        self.check_available(table)?;

        let mut tables = lock(&self.tables);
        let target = tables.get_mut(table).ok_or_else(|| no_such_table(table))?;
        let identity = target.identity(&update.key)?;

        let item = target
            .items
            .entry(identity)
            .or_insert_with(|| update.key.clone());
        item.extend(update.set);

        match item
            .entry(update.list_attribute.clone())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(list) => list.push(update.entry),
            other => {
                return Err(StoreError::InvalidItem(format!(
                    "attribute '{}' is not a list: {}",
                    update.list_attribute, other
                )))
            }
        }

        target.writes += 1;
        Ok(())
    }
}
