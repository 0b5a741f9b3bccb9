#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use chrono::Utc;

use school_backend::common::error::AppError;
use school_backend::db::{DocumentStore, Filter, MemoryDocumentStore, Query};
use school_backend::models::auth::{Identity, Role};
use school_backend::models::document::{Document, JsonMap};
use school_backend::models::rbac::PermissionGrant;
use school_backend::{AppConfig, AppState};

pub const JWT_SECRET: &str = "segredo-de-teste";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::new(JWT_SECRET);
    // bcrypt mínimo: os testes criam muitas contas
    config.bcrypt_cost = 4;
    config
}

pub fn test_state() -> AppState {
    AppState::with_store(test_config(), Arc::new(MemoryDocumentStore::new()))
}

pub fn identity(id: &str, role: Role, tenant_id: &str, permissions: Option<Vec<PermissionGrant>>) -> Identity {
    let now = Utc::now();
    Identity {
        id: id.into(),
        email: format!("{id}@escola.com"),
        name: format!("Usuário {id}"),
        role,
        tenant_id: tenant_id.into(),
        permissions,
        photo_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn json_map(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("esperava objeto, veio {other}"),
    }
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

/// Store em memória que falha toda escrita numa coleção (simula queda parcial).
pub struct FailingCollectionStore {
    inner: MemoryDocumentStore,
    failing: &'static str,
}

impl FailingCollectionStore {
    pub fn new(failing: &'static str) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            failing,
        }
    }

    fn check(&self, collection: &str) -> Result<(), AppError> {
        if collection == self.failing {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "store indisponível para {collection}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingCollectionStore {
    async fn set(&self, collection: &str, id: &str, data: JsonMap) -> Result<(), AppError> {
        self.check(collection)?;
        self.inner.set(collection, id, data).await
    }

    async fn insert(&self, collection: &str, id: &str, data: JsonMap) -> Result<bool, AppError> {
        self.check(collection)?;
        self.inner.insert(collection, id, data).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError> {
        self.inner.query(collection, query).await
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError> {
        self.check(collection)?;
        self.inner.merge(collection, id, patch, condition).await
    }

    async fn delete(&self, collection: &str, id: &str, condition: Option<&Filter>) -> Result<bool, AppError> {
        self.check(collection)?;
        self.inner.delete(collection, id, condition).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.inner.health_check().await
    }

    async fn close(&self) {
        self.inner.close().await
    }

    fn backend_name(&self) -> &'static str {
        "failing-memory"
    }
}

/// Store em memória cujas leituras por id numa coleção devolvem uma foto velha,
/// como se toda checagem prévia perdesse a corrida para outra escrita.
/// Escritas e consultas seguem normais.
pub struct StaleReadStore {
    inner: MemoryDocumentStore,
    stale: &'static str,
    frozen: Option<JsonMap>,
}

impl StaleReadStore {
    /// Toda leitura na coleção vê "não existe".
    pub fn new(stale: &'static str) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            stale,
            frozen: None,
        }
    }

    /// Toda leitura na coleção vê `frozen`, seja qual for o estado real.
    pub fn frozen(stale: &'static str, frozen: JsonMap) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            stale,
            frozen: Some(frozen),
        }
    }
}

#[async_trait]
impl DocumentStore for StaleReadStore {
    async fn set(&self, collection: &str, id: &str, data: JsonMap) -> Result<(), AppError> {
        self.inner.set(collection, id, data).await
    }

    async fn insert(&self, collection: &str, id: &str, data: JsonMap) -> Result<bool, AppError> {
        self.inner.insert(collection, id, data).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        if collection == self.stale {
            return Ok(self.frozen.clone().map(|data| Document::new(id, data)));
        }
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError> {
        self.inner.query(collection, query).await
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: JsonMap,
        condition: Option<&Filter>,
    ) -> Result<bool, AppError> {
        self.inner.merge(collection, id, patch, condition).await
    }

    async fn delete(&self, collection: &str, id: &str, condition: Option<&Filter>) -> Result<bool, AppError> {
        self.inner.delete(collection, id, condition).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.inner.health_check().await
    }

    async fn close(&self) {
        self.inner.close().await
    }

    fn backend_name(&self) -> &'static str {
        "stale-memory"
    }
}
