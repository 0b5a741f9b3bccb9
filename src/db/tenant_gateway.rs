// src/db/tenant_gateway.rs

//! Único caminho de leitura/escrita das entidades do domínio.
//!
//! Toda operação recebe o `tenant_id` da escola do chamador:
//! - `create` carimba `tenantId`, `createdAt` e `updatedAt`;
//! - `get`, `update` e `delete` falham com `AccessDenied` se o documento é de outra escola;
//! - `list` sempre filtra por `tenantId` antes de qualquer filtro do chamador.
//!
//! O isolamento vale mesmo para quem já passou pela checagem de permissão.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::document_store::{DocumentStore, Filter, Query};
use crate::models::document::{Document, JsonMap};

pub const TENANT_FIELD: &str = "tenantId";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Timestamp do servidor em RFC 3339 (UTC, microssegundos). Ordena como texto.
pub fn server_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Clone)]
pub struct TenantGateway {
    store: Arc<dyn DocumentStore>,
}

impl TenantGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        collection: &str,
        mut data: JsonMap,
        tenant_id: &str,
        custom_id: Option<&str>,
    ) -> Result<String, AppError> {
        let id = custom_id.map_or_else(generate_id, str::to_string);

        let now = server_timestamp();
        data.insert(TENANT_FIELD.into(), Value::String(tenant_id.to_string()));
        data.insert(CREATED_AT_FIELD.into(), Value::String(now.clone()));
        data.insert(UPDATED_AT_FIELD.into(), Value::String(now));

        // Checagem e escrita numa operação só: duas criações com o mesmo id
        // nunca terminam ambas com sucesso
        if !self.store.insert(collection, &id, data).await? {
            if let Some(existing) = self.store.get(collection, &id).await? {
                self.ensure_same_tenant(collection, &existing, tenant_id)?;
            }
            return Err(AppError::AlreadyExists {
                collection: collection.to_string(),
                id,
            });
        }

        tracing::debug!(collection, id = %id, tenant_id, "documento criado");
        Ok(id)
    }

    pub async fn get(
        &self,
        collection: &str,
        id: &str,
        tenant_id: &str,
    ) -> Result<Option<Document>, AppError> {
        let Some(doc) = self.store.get(collection, id).await? else {
            return Ok(None);
        };

        self.ensure_same_tenant(collection, &doc, tenant_id)?;
        Ok(Some(doc))
    }

    /// Lista os documentos da escola. O filtro de escola vem sempre primeiro e os filtros
    /// do chamador só podem restringir mais o resultado.
    pub async fn list(
        &self,
        collection: &str,
        tenant_id: &str,
        extra: Query,
    ) -> Result<Vec<Document>, AppError> {
        let mut filters = Vec::with_capacity(extra.filters.len() + 1);
        filters.push(Filter::eq(TENANT_FIELD, tenant_id));
        filters.extend(extra.filters);

        let query = Query {
            filters,
            order_by: extra.order_by,
            limit: extra.limit,
        };

        let docs = self.store.query(collection, &query).await?;

        // Segunda barreira: nada de outra escola passa, seja qual for o backend
        Ok(docs
            .into_iter()
            .filter(|doc| doc.str_field(TENANT_FIELD) == Some(tenant_id))
            .collect())
    }

    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        mut partial: JsonMap,
        tenant_id: &str,
    ) -> Result<(), AppError> {
        self.load_for_write(collection, id, tenant_id).await?;

        // tenantId e createdAt são imutáveis depois da criação
        for field in [TENANT_FIELD, CREATED_AT_FIELD] {
            if partial.remove(field).is_some() {
                tracing::warn!(collection, id, field, "campo imutável removido do update");
            }
        }
        partial.insert(UPDATED_AT_FIELD.into(), Value::String(server_timestamp()));

        let owner = Filter::eq(TENANT_FIELD, tenant_id);
        if !self.store.merge(collection, id, partial, Some(&owner)).await? {
            return Err(self.write_rejected(collection, id, tenant_id).await);
        }
        Ok(())
    }

    pub async fn delete(&self, collection: &str, id: &str, tenant_id: &str) -> Result<(), AppError> {
        self.load_for_write(collection, id, tenant_id).await?;

        let owner = Filter::eq(TENANT_FIELD, tenant_id);
        if !self.store.delete(collection, id, Some(&owner)).await? {
            return Err(self.write_rejected(collection, id, tenant_id).await);
        }
        Ok(())
    }

    // A escrita condicional não aconteceu: o documento sumiu ou mudou de dono
    // entre a leitura e a escrita. Reclassifica com o estado atual.
    async fn write_rejected(&self, collection: &str, id: &str, tenant_id: &str) -> AppError {
        match self.load_for_write(collection, id, tenant_id).await {
            Err(e) => e,
            Ok(_) => not_found(collection, id),
        }
    }

    // Not-Found é checado antes da escola; os dois erros nunca se confundem.
    async fn load_for_write(
        &self,
        collection: &str,
        id: &str,
        tenant_id: &str,
    ) -> Result<Document, AppError> {
        let doc = self
            .store
            .get(collection, id)
            .await?
            .ok_or_else(|| not_found(collection, id))?;

        self.ensure_same_tenant(collection, &doc, tenant_id)?;
        Ok(doc)
    }

    fn ensure_same_tenant(
        &self,
        collection: &str,
        doc: &Document,
        tenant_id: &str,
    ) -> Result<(), AppError> {
        let stored = doc.str_field(TENANT_FIELD);
        if stored == Some(tenant_id) {
            return Ok(());
        }

        tracing::warn!(
            collection,
            id = %doc.id,
            stored_tenant = stored.unwrap_or("<none>"),
            caller_tenant = tenant_id,
            "acesso entre escolas bloqueado"
        );
        Err(AppError::AccessDenied {
            collection: collection.to_string(),
            id: doc.id.clone(),
        })
    }
}

fn not_found(collection: &str, id: &str) -> AppError {
    AppError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}
