// src/services/record_service.rs

//! CRUD dos módulos da escola (alunos, turmas, notas...).
//!
//! Cada operação segue o mesmo fluxo: motor de permissões -> gateway -> auditoria.
//! A auditoria só acontece depois que a escrita foi aceita pelo store.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
    common::error::AppError,
    db::{Direction, Query, TenantGateway},
    models::auth::Identity,
    models::document::{Document, JsonMap},
    models::rbac::{Action, Module},
    services::{audit_service::AuditService, rbac_service::PermissionEngine},
};

pub const LATEST_ANNOUNCEMENTS: usize = 10;
pub const MAX_LIST_LIMIT: usize = 1000;

// Parâmetros de listagem que não viram filtro
const ORDER_BY_PARAM: &str = "orderBy";
const DIRECTION_PARAM: &str = "direction";
const LIMIT_PARAM: &str = "limit";

/// Query string -> consulta. Demais parâmetros viram filtros de igualdade (texto).
pub fn query_from_params(params: &HashMap<String, String>) -> Result<Query, AppError> {
    let mut fields: Vec<(&String, &String)> = params
        .iter()
        .filter(|(k, _)| ![ORDER_BY_PARAM, DIRECTION_PARAM, LIMIT_PARAM].contains(&k.as_str()))
        .collect();
    // HashMap não tem ordem; a consulta gerada deve ser estável
    fields.sort();

    let mut query = Query::new();
    for (field, value) in fields {
        query = query.where_eq(field.as_str(), value.as_str());
    }

    if let Some(field) = params.get(ORDER_BY_PARAM) {
        let direction = match params.get(DIRECTION_PARAM).map(String::as_str) {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(AppError::BadRequest(format!("direção inválida '{other}'")));
            }
        };
        query = query.order_by(field.as_str(), direction);
    }

    // Sem limit explícito, vale o teto
    let limit = match params.get(LIMIT_PARAM) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| AppError::BadRequest(format!("limit inválido '{raw}'")))?
            .clamp(1, MAX_LIST_LIMIT),
        None => MAX_LIST_LIMIT,
    };
    query = query.limit(limit);

    Ok(query)
}

#[derive(Clone)]
pub struct RecordService {
    gateway: TenantGateway,
    engine: PermissionEngine,
    audit: AuditService,
}

impl RecordService {
    pub fn new(gateway: TenantGateway, engine: PermissionEngine, audit: AuditService) -> Self {
        Self { gateway, engine, audit }
    }

    fn authorize(&self, actor: &Identity, module: Module, action: Action) -> Result<(), AppError> {
        if !module.holds_records() {
            return Err(AppError::BadRequest(format!(
                "o módulo '{module}' não guarda registros"
            )));
        }
        if !self.engine.is_allowed(Some(actor), module.as_str(), action.as_str()) {
            tracing::info!(
                user_id = %actor.id,
                module = %module,
                action = %action,
                "permissão negada"
            );
            return Err(AppError::Forbidden {
                module: module.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    async fn load(&self, module: Module, id: &str, tenant_id: &str) -> Result<Document, AppError> {
        self.gateway
            .get(module.as_str(), id, tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                collection: module.to_string(),
                id: id.to_string(),
            })
    }

    pub async fn create(
        &self,
        actor: &Identity,
        module: Module,
        mut data: JsonMap,
        custom_id: Option<&str>,
    ) -> Result<Document, AppError> {
        self.authorize(actor, module, Action::Create)?;
        data.remove("id");

        let id = self
            .gateway
            .create(module.as_str(), data, &actor.tenant_id, custom_id)
            .await?;
        let created = self.load(module, &id, &actor.tenant_id).await?;

        self.audit
            .record_create(actor, module.as_str(), &id, Value::Object(created.data.clone()))
            .await;
        Ok(created)
    }

    pub async fn get(&self, actor: &Identity, module: Module, id: &str) -> Result<Document, AppError> {
        self.authorize(actor, module, Action::Read)?;
        self.load(module, id, &actor.tenant_id).await
    }

    pub async fn list(&self, actor: &Identity, module: Module, query: Query) -> Result<Vec<Document>, AppError> {
        self.authorize(actor, module, Action::Read)?;
        self.gateway
            .list(module.as_str(), &actor.tenant_id, query)
            .await
    }

    pub async fn update(
        &self,
        actor: &Identity,
        module: Module,
        id: &str,
        mut patch: JsonMap,
    ) -> Result<Document, AppError> {
        self.authorize(actor, module, Action::Update)?;
        patch.remove("id");

        let before = self.load(module, id, &actor.tenant_id).await?;
        self.gateway
            .update(module.as_str(), id, patch, &actor.tenant_id)
            .await?;
        let after = self.load(module, id, &actor.tenant_id).await?;

        self.audit
            .record_update(
                actor,
                module.as_str(),
                id,
                Value::Object(before.data),
                Value::Object(after.data.clone()),
            )
            .await;
        Ok(after)
    }

    pub async fn delete(&self, actor: &Identity, module: Module, id: &str) -> Result<(), AppError> {
        self.authorize(actor, module, Action::Delete)?;

        let before = self.load(module, id, &actor.tenant_id).await?;
        self.gateway
            .delete(module.as_str(), id, &actor.tenant_id)
            .await?;

        self.audit
            .record_delete(actor, module.as_str(), id, Value::Object(before.data))
            .await;
        Ok(())
    }

    // ---
    // Consultas prontas dos painéis
    // ---

    /// Alunos de uma turma, por nome.
    pub async fn students_by_class(&self, actor: &Identity, class_id: &str) -> Result<Vec<Document>, AppError> {
        let query = Query::new()
            .where_eq("classId", class_id)
            .order_by("name", Direction::Asc)
            .limit(MAX_LIST_LIMIT);
        self.list(actor, Module::Students, query).await
    }

    /// Tarefas de um aluno, entrega mais distante primeiro.
    pub async fn assignments_by_student(
        &self,
        actor: &Identity,
        student_id: &str,
    ) -> Result<Vec<Document>, AppError> {
        let query = Query::new()
            .where_eq("studentId", student_id)
            .order_by("dueDate", Direction::Desc)
            .limit(MAX_LIST_LIMIT);
        self.list(actor, Module::Assignments, query).await
    }

    pub async fn latest_announcements(&self, actor: &Identity) -> Result<Vec<Document>, AppError> {
        let query = Query::new()
            .order_by("createdAt", Direction::Desc)
            .limit(LATEST_ANNOUNCEMENTS);
        self.list(actor, Module::Announcements, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Filter, FilterOp};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn params_become_sorted_equality_filters() {
        let query = query_from_params(&params(&[
            ("status", "active"),
            ("classId", "c1"),
            ("orderBy", "name"),
            ("direction", "desc"),
            ("limit", "5"),
        ]))
        .unwrap();

        assert_eq!(
            query.filters,
            vec![Filter::eq("classId", "c1"), Filter::new("status", FilterOp::Eq, "active")]
        );
        let order = query.order_by.unwrap();
        assert_eq!(order.field, "name");
        assert_eq!(order.direction, Direction::Desc);
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn bad_direction_or_limit_is_rejected() {
        assert!(query_from_params(&params(&[("orderBy", "name"), ("direction", "up")])).is_err());
        assert!(query_from_params(&params(&[("limit", "-1")])).is_err());
    }

    #[test]
    fn limit_is_capped() {
        let query = query_from_params(&params(&[("limit", "999999")])).unwrap();
        assert_eq!(query.limit, Some(MAX_LIST_LIMIT));
    }

    #[test]
    fn missing_limit_defaults_to_cap() {
        let query = query_from_params(&params(&[("classId", "c1")])).unwrap();
        assert_eq!(query.limit, Some(MAX_LIST_LIMIT));

        let query = query_from_params(&params(&[("limit", "5")])).unwrap();
        assert_eq!(query.limit, Some(5));
    }
}
