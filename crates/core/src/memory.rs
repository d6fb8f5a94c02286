//! In-process [`Backend`] used by tests and for exercising workflows without a server.
//!
//! Records are stored in their JSON wire form, keyed by resource kind and id, so the same serde
//! paths the REST client uses are exercised here. Ids are allocated from a single counter
//! shared by all kinds.

use crate::auth::AuthContext;
use crate::backend::{Backend, Filter};
use crate::error::{HmsError, HmsResult};
use crate::models::{Resource, ResourceKind};
use chrono::Utc;
use hms_types::RecordId;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    collections: HashMap<ResourceKind, BTreeMap<RecordId, Value>>,
}

impl Store {
    fn allocate_id(&mut self) -> RecordId {
        self.last_id += 1;
        RecordId::new(self.last_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully-formed record under its own id, replacing any existing one.
    pub fn seed<R: Resource>(&self, record: &R) -> HmsResult<()> {
        let value = to_wire(record)?;
        let mut store = self.lock();
        store.last_id = store.last_id.max(record.id().get());
        store
            .collections
            .entry(R::KIND)
            .or_default()
            .insert(record.id(), value);
        Ok(())
    }

    /// Number of stored records of `kind`.
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.lock().collections.get(&kind).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // A panic while holding the lock cannot leave a half-written record: every mutation is a
        // single insert or remove.
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn to_wire<T: serde::Serialize>(value: &T) -> HmsResult<Value> {
    serde_json::to_value(value).map_err(|e| HmsError::Validation(e.to_string()))
}

fn from_wire<R: Resource>(value: Value) -> HmsResult<R> {
    serde_json::from_value(value)
        .map_err(|e| HmsError::Validation(format!("invalid {} payload: {e}", R::KIND)))
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

impl Backend for InMemoryBackend {
    async fn list_filtered<R: Resource>(
        &self,
        _auth: &AuthContext,
        filter: &Filter,
    ) -> HmsResult<Vec<R>> {
        let matching: Vec<Value> = {
            let store = self.lock();
            store
                .collections
                .get(&R::KIND)
                .map(|records| {
                    records
                        .values()
                        .filter(|v| filter.matches(v))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        matching.into_iter().map(from_wire).collect()
    }

    async fn retrieve<R: Resource>(&self, _auth: &AuthContext, id: RecordId) -> HmsResult<R> {
        let value = self
            .lock()
            .collections
            .get(&R::KIND)
            .and_then(|records| records.get(&id))
            .cloned()
            .ok_or(HmsError::NotFound { kind: R::KIND, id })?;
        from_wire(value)
    }

    async fn create<R: Resource>(&self, _auth: &AuthContext, draft: &R::Draft) -> HmsResult<R> {
        let mut value = to_wire(draft)?;
        let Some(object) = value.as_object_mut() else {
            return Err(HmsError::Validation(format!(
                "{} draft must serialise to an object",
                R::KIND
            )));
        };

        let mut store = self.lock();
        let id = store.allocate_id();
        object.insert("id".into(), Value::from(id.get()));
        object.insert("created_at".into(), now_value());
        object.insert("updated_at".into(), now_value());

        // Round-trip through the record type so defaults (such as `status`) are stored.
        let record: R = from_wire(value)?;
        let stored = to_wire(&record)?;
        store.collections.entry(R::KIND).or_default().insert(id, stored);
        tracing::debug!("created {} {}", R::KIND, id);
        Ok(record)
    }

    async fn patch<R: Resource>(
        &self,
        _auth: &AuthContext,
        id: RecordId,
        fields: &Value,
    ) -> HmsResult<R> {
        let Some(updates) = fields.as_object() else {
            return Err(HmsError::Validation("patch body must be a JSON object".into()));
        };

        let mut store = self.lock();
        let mut value = store
            .collections
            .get(&R::KIND)
            .and_then(|records| records.get(&id))
            .cloned()
            .ok_or(HmsError::NotFound { kind: R::KIND, id })?;

        if let Some(object) = value.as_object_mut() {
            for (key, field) in updates {
                if key == "id" {
                    continue;
                }
                object.insert(key.clone(), field.clone());
            }
            object.insert("updated_at".into(), now_value());
        }

        // Validate before storing so a rejected patch leaves the record untouched.
        let record: R = from_wire(value)?;
        let stored = to_wire(&record)?;
        store.collections.entry(R::KIND).or_default().insert(id, stored);
        tracing::debug!("patched {} {}", R::KIND, id);
        Ok(record)
    }

    async fn delete<R: Resource>(&self, _auth: &AuthContext, id: RecordId) -> HmsResult<()> {
        self.lock()
            .collections
            .get_mut(&R::KIND)
            .and_then(|records| records.remove(&id))
            .map(|_| ())
            .ok_or(HmsError::NotFound { kind: R::KIND, id })
    }
}
