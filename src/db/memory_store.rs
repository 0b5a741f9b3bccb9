// src/db/memory_store.rs

//! Store em memória. Usado nos testes e no desenvolvimento local quando
//! `DATABASE_URL` não está definida. Nada sobrevive a um reinício do processo.

use std::collections::{btree_map::Entry, BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::common::error::AppError;
use crate::db::document_store::{sort_and_limit, DocumentStore, Filter, Query};
use crate::models::document::{Document, JsonMap};

#[derive(Default)]
pub struct MemoryDocumentStore {
    // coleção -> (id -> campos). BTreeMap deixa a ordem sem `order_by` estável.
    collections: RwLock<HashMap<String, BTreeMap<String, JsonMap>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set(&self, collection: &str, id: &str, data: JsonMap) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn insert(&self, collection: &str, id: &str, data: JsonMap) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        match collections.entry(collection.to_string()).or_default().entry(id.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(true)
            }
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let matched = docs
            .iter()
            .filter(|(_, data)| query.matches(data))
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect();

        Ok(sort_and_limit(matched, query))
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        let Some(existing) = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(false);
        };

        if condition.is_some_and(|c| !c.matches(existing)) {
            return Ok(false);
        }
        existing.extend(patch);
        Ok(true)
    }

    async fn delete(
        &self,
        collection: &str,
        id: &str,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match docs.get(id) {
            Some(existing) if condition.is_none_or(|c| c.matches(existing)) => {
                docs.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn close(&self) {
        tracing::info!("Store em memória encerrado (dados descartados)");
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
