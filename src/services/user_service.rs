// src/services/user_service.rs

use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    db::{Direction, Query, TenantGateway},
    models::audit::NewAuditEntry,
    models::auth::{Identity, Role, SignUpPayload, UpdateProfilePayload},
    models::document::JsonMap,
    models::rbac::{Action, Module},
    services::{
        audit_service::AuditService,
        auth::{AuthService, NewAccount},
        rbac_service::PermissionEngine,
    },
};

pub const USERS_COLLECTION: &str = "users";

// Gestão das identidades da escola (fora o login em si, que é do AuthService)
#[derive(Clone)]
pub struct UserService {
    gateway: TenantGateway,
    auth: AuthService,
    audit: AuditService,
    engine: PermissionEngine,
}

impl UserService {
    pub fn new(
        gateway: TenantGateway,
        auth: AuthService,
        audit: AuditService,
        engine: PermissionEngine,
    ) -> Self {
        Self { gateway, auth, audit, engine }
    }

    /// Usuários da escola, por nome. Filtro opcional de perfil.
    pub async fn list(&self, tenant_id: &str, role: Option<Role>) -> Result<Vec<Identity>, AppError> {
        let mut query = Query::new().order_by("name", Direction::Asc);
        if let Some(role) = role {
            query = query.where_eq("role", role.as_str());
        }

        self.gateway
            .list(USERS_COLLECTION, tenant_id, query)
            .await?
            .into_iter()
            .map(|doc| doc.into_model::<Identity>().map_err(AppError::from))
            .collect()
    }

    pub async fn get(&self, user_id: &str, tenant_id: &str) -> Result<Identity, AppError> {
        let doc = self
            .gateway
            .get(USERS_COLLECTION, user_id, tenant_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        Ok(doc.into_model()?)
    }

    /// Cadastro feito por alguém da escola (ex.: secretaria cria um aluno).
    /// A permissão exigida depende do perfil criado: `students:create` para aluno,
    /// `settings:update` para outro administrador.
    pub async fn provision(&self, actor: &Identity, payload: &SignUpPayload) -> Result<Identity, AppError> {
        let module = payload.role.provisioning_module();
        let action = match payload.role {
            Role::TenantAdmin => Action::Update,
            _ => Action::Create,
        };

        if !self.engine.is_allowed(Some(actor), module.as_str(), action.as_str()) {
            return Err(AppError::Forbidden {
                module: module.to_string(),
                action: action.to_string(),
            });
        }

        let account = NewAccount {
            email: payload.email.clone(),
            password: payload.password.clone(),
            name: payload.name.clone(),
            role: payload.role,
        };
        let created = self.auth.create_account(&account, &actor.tenant_id).await?;

        let snapshot = serde_json::to_value(&created)?;
        match payload.role {
            // Administrador novo é mudança de configuração, mas o alvo continua sendo um usuário
            Role::TenantAdmin => {
                let entry = NewAuditEntry::by(actor, "create_user", Module::Settings.as_str())
                    .target(&created.id, "user")
                    .changes(json!({ "created": snapshot }));
                self.audit.record(entry).await;
            }
            _ => {
                self.audit
                    .record_create(actor, module.as_str(), &created.id, snapshot)
                    .await;
            }
        }

        Ok(created)
    }

    /// Edição do próprio perfil: só nome e foto.
    pub async fn update_profile(
        &self,
        identity: &Identity,
        payload: &UpdateProfilePayload,
    ) -> Result<Identity, AppError> {
        let mut patch = JsonMap::new();
        if let Some(name) = &payload.name {
            patch.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(photo_url) = &payload.photo_url {
            patch.insert("photoUrl".into(), Value::String(photo_url.clone()));
        }

        if patch.is_empty() {
            return Ok(identity.clone());
        }

        self.gateway
            .update(USERS_COLLECTION, &identity.id, patch, &identity.tenant_id)
            .await?;
        self.get(&identity.id, &identity.tenant_id).await
    }
}
