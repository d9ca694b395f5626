//! Mock ResourceClient for unit testing
//!
//! Stores resources in memory and plays back scripted `get_status` responses,
//! so watch behaviour can be tested without a running cluster.

use crate::client_trait::{Deletion, ResourceClient};
use crate::error::ResourceClientError;
use crate::reference::ResourceRef;
use crate::status::StructuredStatus;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

type Scripted = Result<StructuredStatus, ResourceClientError>;

/// Mock ResourceClient for testing
///
/// `get_status` first consults the script registered for a reference (the last
/// scripted response repeats once the rest are consumed), then the in-memory
/// store, and finally reports `NotFound`.
#[derive(Clone, Default)]
pub struct MockResourceClient {
    pub(crate) scripts: Arc<Mutex<HashMap<ResourceRef, VecDeque<Scripted>>>>,
    pub(crate) store: Arc<Mutex<HashMap<ResourceRef, StructuredStatus>>>,
    pub(crate) get_calls: Arc<Mutex<HashMap<ResourceRef, u32>>>,
    pub(crate) created: Arc<Mutex<Vec<(ResourceRef, Value)>>>,
    pub(crate) applied: Arc<Mutex<Vec<(ResourceRef, Value)>>>,
    pub(crate) deleted: Arc<Mutex<Vec<ResourceRef>>>,
    pub(crate) write_error: Arc<Mutex<Option<ResourceClientError>>>,
}

impl MockResourceClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the sequence of `get_status` responses for a reference (for test setup)
    pub fn script<I>(&self, resource: &ResourceRef, responses: I)
    where
        I: IntoIterator<Item = Result<Value, ResourceClientError>>,
    {
        let queue = responses
            .into_iter()
            .map(|r| r.map(StructuredStatus::new))
            .collect();
        self.scripts.lock().unwrap().insert(resource.clone(), queue);
    }

    /// Put a resource document into the mock store (for test setup)
    pub fn insert(&self, resource: &ResourceRef, document: Value) {
        self.store
            .lock()
            .unwrap()
            .insert(resource.clone(), StructuredStatus::new(document));
    }

    /// Make every following create/apply/delete fail with `error`
    pub fn fail_writes(&self, error: ResourceClientError) {
        *self.write_error.lock().unwrap() = Some(error);
    }

    /// Number of `get_status` calls issued for a reference
    pub fn get_calls(&self, resource: &ResourceRef) -> u32 {
        self.get_calls.lock().unwrap().get(resource).copied().unwrap_or(0)
    }

    /// Bodies passed to `create`, in call order
    pub fn created(&self) -> Vec<(ResourceRef, Value)> {
        self.created.lock().unwrap().clone()
    }

    /// Bodies passed to `apply`, in call order
    pub fn applied(&self) -> Vec<(ResourceRef, Value)> {
        self.applied.lock().unwrap().clone()
    }

    /// References passed to `delete`, in call order
    pub fn deleted(&self) -> Vec<ResourceRef> {
        self.deleted.lock().unwrap().clone()
    }

    fn check_writes(&self) -> Result<(), ResourceClientError> {
        match self.write_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// JSON merge patch (RFC 7386)
fn merge(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[async_trait::async_trait]
impl ResourceClient for MockResourceClient {
    async fn get_status(&self, resource: &ResourceRef) -> Result<StructuredStatus, ResourceClientError> {
        *self.get_calls.lock().unwrap().entry(resource.clone()).or_insert(0) += 1;

        if let Some(queue) = self.scripts.lock().unwrap().get_mut(resource) {
            let next = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
            if let Some(response) = next {
                return response;
            }
        }

        self.store
            .lock()
            .unwrap()
            .get(resource)
            .cloned()
            .ok_or_else(|| ResourceClientError::NotFound(resource.to_string()))
    }

    async fn create(&self, resource: &ResourceRef, body: Value) -> Result<StructuredStatus, ResourceClientError> {
        self.check_writes()?;
        self.created.lock().unwrap().push((resource.clone(), body.clone()));

        let mut store = self.store.lock().unwrap();
        if store.contains_key(resource) {
            return Err(ResourceClientError::Conflict(format!("{} already exists", resource)));
        }
        let mut document = body;
        merge(
            &mut document,
            &serde_json::json!({
                "metadata": {"name": resource.name(), "namespace": resource.namespace()}
            }),
        );
        let status = StructuredStatus::new(document);
        store.insert(resource.clone(), status.clone());
        Ok(status)
    }

    async fn apply(&self, resource: &ResourceRef, body: Value) -> Result<StructuredStatus, ResourceClientError> {
        self.check_writes()?;
        self.applied.lock().unwrap().push((resource.clone(), body.clone()));

        let mut store = self.store.lock().unwrap();
        let existing = store
            .get(resource)
            .cloned()
            .ok_or_else(|| ResourceClientError::NotFound(resource.to_string()))?;
        let mut document = existing.into_value();
        merge(&mut document, &body);
        let status = StructuredStatus::new(document);
        store.insert(resource.clone(), status.clone());
        Ok(status)
    }

    async fn delete(&self, resource: &ResourceRef) -> Result<Deletion, ResourceClientError> {
        self.check_writes()?;
        self.deleted.lock().unwrap().push(resource.clone());

        match self.store.lock().unwrap().remove(resource) {
            Some(_) => Ok(Deletion::Completed),
            None => Err(ResourceClientError::NotFound(resource.to_string())),
        }
    }
}
