// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::models::auth::Identity;

// Registro imutável da trilha de auditoria. O timestamp é sempre do servidor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub tenant_id: String,
    pub actor_id: String,
    pub actor_name: String,

    #[schema(example = "update_permissions")]
    pub action: String,
    #[schema(example = "settings")]
    pub module: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    // Antes/depois, criado ou apagado
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Value>,

    pub timestamp: DateTime<Utc>,
}

/// Entrada ainda não gravada: sem id e sem timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEntry {
    pub tenant_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub action: String,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(
        tenant_id: impl Into<String>,
        actor_id: impl Into<String>,
        actor_name: impl Into<String>,
        action: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            action: action.into(),
            module: module.into(),
            target_id: None,
            target_type: None,
            changes: None,
        }
    }

    /// Atalho para quando o autor é o usuário autenticado (a escola vem dele).
    pub fn by(actor: &Identity, action: impl Into<String>, module: impl Into<String>) -> Self {
        Self::new(&actor.tenant_id, &actor.id, &actor.name, action, module)
    }

    pub fn target(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self.target_type = Some(kind.into());
        self
    }

    pub fn changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }
}

// Filtros da tela de auditoria (query string)
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    pub actor_id: Option<String>,
    pub module: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Busca por trecho da ação ou do nome do autor (sem diferenciar maiúsculas).
    pub search: Option<String>,
}
