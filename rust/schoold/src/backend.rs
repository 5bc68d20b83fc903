use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Collection, Record};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl From<rusqlite::Error> for BackendError {
    fn from(e: rusqlite::Error) -> Self {
        BackendError(e.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError(e.to_string())
    }
}

impl From<anyhow::Error> for BackendError {
    fn from(e: anyhow::Error) -> Self {
        BackendError(format!("{e:#}"))
    }
}

/// Change applied to one field of an existing record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDelta {
    /// Replace the field value.
    Set(Value),
    /// Append members not already present; never removes.
    Union(Vec<Value>),
}

/// Receives the full content of a collection every time it changes.
pub type SnapshotSink = Box<dyn FnMut(Result<Vec<Record>, BackendError>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Storage and change-feed service the core delegates persistence to.
///
/// Any transport that can hand out full-collection snapshots satisfies it.
/// `subscribe` delivers the current snapshot immediately, then one snapshot
/// per change until `unsubscribe`.
pub trait Backend: Send {
    /// Opaque subject id for this client. Only "resolved" matters downstream.
    fn resolve_identity(&mut self) -> Result<String, BackendError>;

    fn read_all(&self, collection: Collection) -> Result<Vec<Record>, BackendError>;

    fn create_record(
        &mut self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<String, BackendError>;

    fn update_record(
        &mut self,
        collection: Collection,
        id: &str,
        field: &str,
        delta: FieldDelta,
    ) -> Result<(), BackendError>;

    fn subscribe(
        &mut self,
        collection: Collection,
        sink: SnapshotSink,
    ) -> Result<SubscriptionId, BackendError>;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Applies a delta to a field map in place.
pub fn apply_delta(fields: &mut Map<String, Value>, field: &str, delta: FieldDelta) {
    match delta {
        FieldDelta::Set(v) => {
            fields.insert(field.to_string(), v);
        }
        FieldDelta::Union(values) => {
            let mut current = match fields.remove(field) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            for v in values {
                if !current.contains(&v) {
                    current.push(v);
                }
            }
            fields.insert(field.to_string(), Value::Array(current));
        }
    }
}
