// src/services/permission_admin.rs

use std::collections::HashSet;

use serde_json::Value;

use crate::common::error::AppError;
use crate::db::TenantGateway;
use crate::models::auth::Identity;
use crate::models::document::JsonMap;
use crate::models::rbac::{Action, Module, PermissionGrant};
use crate::services::permission_model::default_permissions_for;
use crate::services::user_service::USERS_COLLECTION;

/// O que está valendo para o usuário: a lista personalizada, ou o padrão do perfil.
/// Mesma regra de fallback do motor de decisão.
pub fn load_effective_permissions(identity: &Identity) -> Vec<PermissionGrant> {
    match identity.custom_permissions() {
        Some(grants) => grants.to_vec(),
        None => default_permissions_for(identity.role),
    }
}

/// Marca/desmarca `action` em `module`. Transformação pura:
/// - módulo ausente: entra `{module, [action]}` (na posição alfabética);
/// - ação ausente: é adicionada;
/// - ação presente: é removida, e o módulo sai da lista se ficar sem ações.
///
/// Aplicar duas vezes devolve a lista original.
pub fn toggle_action(grants: &[PermissionGrant], module: &str, action: &str) -> Vec<PermissionGrant> {
    let mut next = grants.to_vec();

    match next.iter().position(|g| g.module == module) {
        Some(idx) => {
            let grant = &mut next[idx];
            if !grant.actions.remove(action) {
                grant.actions.insert(action.to_string());
            } else if grant.actions.is_empty() {
                next.remove(idx);
            }
        }
        None => {
            let at = next.partition_point(|g| g.module.as_str() < module);
            next.insert(at, PermissionGrant::new(module, [action]));
        }
    }

    next
}

/// Valida contra o catálogo fechado: módulo conhecido, ação válida no módulo,
/// sem módulo repetido. Concessões sem ação são descartadas.
pub fn validate_grants(grants: Vec<PermissionGrant>) -> Result<Vec<PermissionGrant>, AppError> {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(grants.len());

    for grant in grants {
        let module: Module = grant.module.parse()?;
        if !seen.insert(module) {
            return Err(AppError::InvalidPermission(format!(
                "módulo '{module}' aparece mais de uma vez"
            )));
        }

        for raw in &grant.actions {
            let action: Action = raw.parse()?;
            if !module.actions().contains(&action) {
                return Err(AppError::InvalidPermission(format!(
                    "ação '{action}' não se aplica ao módulo '{module}'"
                )));
            }
        }

        if !grant.actions.is_empty() {
            valid.push(grant);
        }
    }

    Ok(valid)
}

#[derive(Clone)]
pub struct PermissionAdminService {
    gateway: TenantGateway,
}

impl PermissionAdminService {
    pub fn new(gateway: TenantGateway) -> Self {
        Self { gateway }
    }

    /// Grava `grants` como as permissões personalizadas de `identity`.
    ///
    /// Não registra auditoria: quem chama é responsável pela entrada
    /// `update_permissions`.
    pub async fn save(
        &self,
        identity: &Identity,
        grants: Vec<PermissionGrant>,
        tenant_id: &str,
    ) -> Result<Vec<PermissionGrant>, AppError> {
        let grants = validate_grants(grants)?;

        let mut patch = JsonMap::new();
        patch.insert("permissions".into(), serde_json::to_value(&grants)?);

        self.gateway
            .update(USERS_COLLECTION, &identity.id, patch, tenant_id)
            .await?;

        tracing::info!(
            user_id = %identity.id,
            tenant_id,
            modules = grants.len(),
            "permissões personalizadas salvas"
        );
        Ok(grants)
    }

    /// Volta o usuário para o padrão do perfil (remove a lista personalizada).
    pub async fn reset(&self, identity: &Identity, tenant_id: &str) -> Result<(), AppError> {
        let mut patch = JsonMap::new();
        patch.insert("permissions".into(), Value::Null);

        self.gateway
            .update(USERS_COLLECTION, &identity.id, patch, tenant_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn grants(rows: &[(&str, &[&str])]) -> Vec<PermissionGrant> {
        rows.iter()
            .map(|(m, a)| PermissionGrant::new(*m, a.iter().copied()))
            .collect()
    }

    #[test]
    fn toggle_adds_missing_module() {
        let out = toggle_action(&grants(&[("students", &["read"])]), "grades", "read");
        assert_eq!(out, grants(&[("grades", &["read"]), ("students", &["read"])]));
    }

    #[test]
    fn toggle_adds_and_removes_actions() {
        let start = grants(&[("grades", &["read"])]);

        let added = toggle_action(&start, "grades", "update");
        assert_eq!(added, grants(&[("grades", &["read", "update"])]));

        let removed = toggle_action(&added, "grades", "read");
        assert_eq!(removed, grants(&[("grades", &["update"])]));
    }

    #[test]
    fn toggle_drops_module_without_actions() {
        let out = toggle_action(&grants(&[("grades", &["read"])]), "grades", "read");
        assert!(out.is_empty());
    }

    #[test]
    fn effective_permissions_follow_engine_fallback() {
        let now = Utc::now();
        let mut parent = Identity {
            id: "p1".into(),
            email: "p1@escola.com".into(),
            name: "Pai".into(),
            role: Role::Parent,
            tenant_id: "school_1".into(),
            permissions: None,
            photo_url: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(load_effective_permissions(&parent), default_permissions_for(Role::Parent));

        parent.permissions = Some(grants(&[("grades", &["read"])]));
        assert_eq!(load_effective_permissions(&parent), grants(&[("grades", &["read"])]));
    }

    #[test]
    fn validation_rejects_unknown_and_duplicates() {
        assert!(validate_grants(grants(&[("library", &["read"])])).is_err());
        assert!(validate_grants(grants(&[("grades", &["approve"])])).is_err());
        assert!(validate_grants(grants(&[("grades", &["export"])])).is_err());
        assert!(validate_grants(grants(&[("grades", &["read"]), ("grades", &["update"])])).is_err());

        let ok = validate_grants(grants(&[("reports", &["export"]), ("grades", &[])])).unwrap();
        assert_eq!(ok, grants(&[("reports", &["export"])]));
    }

    const MODULES: [&str; 6] = ["announcements", "attendance", "classes", "grades", "reports", "students"];
    const ACTIONS: [&str; 5] = ["create", "read", "update", "delete", "export"];

    // Lista válida: módulos únicos, cada um com pelo menos uma ação
    fn grant_list() -> impl Strategy<Value = Vec<PermissionGrant>> {
        prop::collection::btree_map(
            prop::sample::select(MODULES.to_vec()),
            prop::collection::btree_set(prop::sample::select(ACTIONS.to_vec()), 1..=5),
            0..=6,
        )
        .prop_map(|map: BTreeMap<&str, BTreeSet<&str>>| {
            map.into_iter()
                .map(|(m, actions)| PermissionGrant::new(m, actions))
                .collect()
        })
    }

    fn as_map(grants: &[PermissionGrant]) -> BTreeMap<String, BTreeSet<String>> {
        grants
            .iter()
            .map(|g| (g.module.clone(), g.actions.clone()))
            .collect()
    }

    proptest! {
        #[test]
        fn toggle_is_self_inverse(
            start in grant_list(),
            module in prop::sample::select(MODULES.to_vec()),
            action in prop::sample::select(ACTIONS.to_vec()),
        ) {
            let twice = toggle_action(&toggle_action(&start, module, action), module, action);
            prop_assert_eq!(twice, start);
        }

        #[test]
        fn toggle_is_self_inverse_for_any_order(
            start in grant_list().prop_shuffle(),
            module in prop::sample::select(MODULES.to_vec()),
            action in prop::sample::select(ACTIONS.to_vec()),
        ) {
            let twice = toggle_action(&toggle_action(&start, module, action), module, action);
            prop_assert_eq!(as_map(&twice), as_map(&start));
        }

        #[test]
        fn repeated_toggles_keep_modules_unique_and_non_empty(
            steps in prop::collection::vec(
                (prop::sample::select(MODULES.to_vec()), prop::sample::select(ACTIONS.to_vec())),
                0..40,
            ),
        ) {
            let mut current = Vec::new();
            for (module, action) in steps {
                current = toggle_action(&current, module, action);

                let modules: BTreeSet<&str> = current.iter().map(|g| g.module.as_str()).collect();
                prop_assert_eq!(modules.len(), current.len());
                prop_assert!(current.iter().all(|g| !g.actions.is_empty()));
            }
        }
    }
}
