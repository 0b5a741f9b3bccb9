// src/services/audit_service.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::common::error::AppError;
use crate::db::AuditRepository;
use crate::models::audit::{AuditLogEntry, AuditQuery, NewAuditEntry};
use crate::models::auth::Identity;

/// `create_student`, `update_class`... (módulo sem o "s" final)
pub fn action_label(verb: &str, module: &str) -> String {
    format!("{verb}_{}", singular(module))
}

fn singular(module: &str) -> &str {
    // classes -> class; grades -> grade
    match module.strip_suffix("es") {
        Some(stem) if stem.ends_with("ss") => stem,
        _ => module.strip_suffix('s').unwrap_or(module),
    }
}

// Mesmo formato do timestamp gravado, para que a comparação textual valha
fn bound(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Busca sem diferenciar maiúsculas no rótulo da ação ou no nome do autor.
pub fn filter_by_search(entries: Vec<AuditLogEntry>, term: &str) -> Vec<AuditLogEntry> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return entries;
    }

    entries
        .into_iter()
        .filter(|e| {
            e.action.to_lowercase().contains(&term) || e.actor_name.to_lowercase().contains(&term)
        })
        .collect()
}

#[derive(Clone)]
pub struct AuditService {
    repo: AuditRepository,
    default_limit: usize,
    max_limit: usize,
}

impl AuditService {
    pub fn new(repo: AuditRepository, default_limit: usize, max_limit: usize) -> Self {
        Self {
            repo,
            default_limit,
            max_limit: max_limit.max(1),
        }
    }

    /// Acrescenta uma entrada na trilha.
    ///
    /// Nunca falha para quem chama: a operação principal já foi gravada e a
    /// auditoria é melhor-esforço. Erros vão só para o log.
    pub async fn record(&self, entry: NewAuditEntry) {
        match self.repo.append(&entry).await {
            Ok(id) => {
                tracing::debug!(
                    audit_id = %id,
                    tenant_id = %entry.tenant_id,
                    action = %entry.action,
                    "auditoria registrada"
                );
            }
            Err(e) => {
                tracing::error!(
                    tenant_id = %entry.tenant_id,
                    actor_id = %entry.actor_id,
                    action = %entry.action,
                    module = %entry.module,
                    target_id = entry.target_id.as_deref().unwrap_or("-"),
                    error = ?e,
                    "🔥 falha ao gravar auditoria"
                );
            }
        }
    }

    pub async fn record_create(&self, actor: &Identity, module: &str, target_id: &str, created: Value) {
        let entry = NewAuditEntry::by(actor, action_label("create", module), module)
            .target(target_id, singular(module))
            .changes(json!({ "created": created }));
        self.record(entry).await;
    }

    pub async fn record_update(
        &self,
        actor: &Identity,
        module: &str,
        target_id: &str,
        before: Value,
        after: Value,
    ) {
        let entry = NewAuditEntry::by(actor, action_label("update", module), module)
            .target(target_id, singular(module))
            .changes(json!({ "before": before, "after": after }));
        self.record(entry).await;
    }

    pub async fn record_delete(&self, actor: &Identity, module: &str, target_id: &str, deleted: Value) {
        let entry = NewAuditEntry::by(actor, action_label("delete", module), module)
            .target(target_id, singular(module))
            .changes(json!({ "deleted": deleted }));
        self.record(entry).await;
    }

    /// Limite pedido, ou o padrão, nunca acima do teto.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit)
    }

    /// Entradas da escola, mais recentes primeiro. A busca textual é aplicada
    /// depois da consulta, sobre o resultado já limitado.
    pub async fn list(&self, tenant_id: &str, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AppError> {
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(AppError::BadRequest("startDate depois de endDate".into()));
            }
        }

        let entries = self
            .repo
            .list(
                tenant_id,
                query.actor_id.as_deref(),
                query.module.as_deref(),
                query.start_date.map(bound),
                query.end_date.map(bound),
                self.effective_limit(query.limit),
            )
            .await?;

        Ok(match query.search.as_deref() {
            Some(term) => filter_by_search(entries, term),
            None => entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str, actor_name: &str) -> AuditLogEntry {
        AuditLogEntry {
            id: "a1".into(),
            tenant_id: "school_1".into(),
            actor_id: "u1".into(),
            actor_name: actor_name.into(),
            action: action.into(),
            module: "settings".into(),
            target_id: None,
            target_type: None,
            changes: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn labels_use_singular_module() {
        assert_eq!(action_label("create", "students"), "create_student");
        assert_eq!(action_label("update", "attendance"), "update_attendance");
        assert_eq!(action_label("delete", "classes"), "delete_class");
        assert_eq!(action_label("update", "grades"), "update_grade");
    }

    #[test]
    fn search_matches_action_or_actor_ignoring_case() {
        let entries = vec![
            entry("update_permissions", "Maria Silva"),
            entry("create_student", "João"),
            entry("delete_grade", "Ana"),
        ];

        let by_action = filter_by_search(entries.clone(), "PERMISSIONS");
        assert_eq!(by_action.len(), 1);

        let by_actor = filter_by_search(entries.clone(), "joão");
        assert_eq!(by_actor[0].action, "create_student");

        assert_eq!(filter_by_search(entries, "  ").len(), 3);
    }
}
