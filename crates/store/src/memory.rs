// In-Memory Store
//
// Single-process backend used by tests and non-persistent dev runs. One
// RwLock over the whole state gives every primitive per-call atomicity.

use crate::{Store, StoreError, Version};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, (Value, Version)>,
    sets: HashMap<String, HashSet<String>>,
    lists: HashMap<String, VecDeque<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(key).map(|(value, _)| value.clone()))
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let version = inner.records.get(key).map(|(_, v)| v + 1).unwrap_or(1);
        inner.records.insert(key.to_string(), (value, version));
        Ok(())
    }

    async fn get_versioned(&self, key: &str) -> Result<Option<(Value, Version)>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(key).cloned())
    }

    async fn put_if_version(
        &self,
        key: &str,
        value: Value,
        expected: Option<Version>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.records.get(key).map(|(_, v)| *v);
        if current != expected {
            return Ok(false);
        }
        let version = current.map(|v| v + 1).unwrap_or(1);
        inner.records.insert(key.to_string(), (value, version));
        Ok(true)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(set) = inner.sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_push_front(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value);
        Ok(())
    }

    async fn list_trim(&self, key: &str, len: usize) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(list) = inner.lists.get_mut(key) {
            list.truncate(len);
        }
        Ok(())
    }

    async fn list_range(&self, key: &str, count: usize) -> Result<Vec<Value>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .lists
            .get(key)
            .map(|list| list.iter().take(count).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        let inner = self.inner.read().await;
        Ok(keys
            .iter()
            .map(|key| inner.records.get(key).map(|(value, _)| value.clone()))
            .collect())
    }
}
