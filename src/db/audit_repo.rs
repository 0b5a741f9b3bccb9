// src/db/audit_repo.rs

use std::sync::Arc;

use serde_json::Value;

use crate::common::error::AppError;
use crate::db::document_store::{Direction, DocumentStore, Filter, FilterOp, Query};
use crate::db::tenant_gateway::{generate_id, server_timestamp, TENANT_FIELD};
use crate::models::audit::{AuditLogEntry, NewAuditEntry};
use crate::models::document::to_json_map;

pub const AUDIT_COLLECTION: &str = "audit_logs";

// Repositório só de escrita-por-acréscimo: não existe update nem delete aqui.
#[derive(Clone)]
pub struct AuditRepository {
    store: Arc<dyn DocumentStore>,
}

impl AuditRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Grava a entrada com timestamp do servidor. Retorna o id gerado.
    pub async fn append(&self, entry: &NewAuditEntry) -> Result<String, AppError> {
        let id = generate_id();
        let mut data = to_json_map(entry)?;
        data.insert("timestamp".into(), Value::String(server_timestamp()));

        self.store.set(AUDIT_COLLECTION, &id, data).await?;
        Ok(id)
    }

    /// Lista da escola, mais recentes primeiro.
    pub async fn list(
        &self,
        tenant_id: &str,
        actor_id: Option<&str>,
        module: Option<&str>,
        start: Option<String>,
        end: Option<String>,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        let mut query = Query::new().where_eq(TENANT_FIELD, tenant_id);

        if let Some(actor_id) = actor_id {
            query = query.where_eq("actorId", actor_id);
        }
        if let Some(module) = module {
            query = query.where_eq("module", module);
        }
        if let Some(start) = start {
            query = query.filter(Filter::new("timestamp", FilterOp::Gte, start));
        }
        if let Some(end) = end {
            query = query.filter(Filter::new("timestamp", FilterOp::Lte, end));
        }

        let query = query.order_by("timestamp", Direction::Desc).limit(limit);

        self.store
            .query(AUDIT_COLLECTION, &query)
            .await?
            .into_iter()
            .filter(|doc| doc.str_field(TENANT_FIELD) == Some(tenant_id))
            .map(|doc| doc.into_model::<AuditLogEntry>().map_err(AppError::from))
            .collect()
    }
}
