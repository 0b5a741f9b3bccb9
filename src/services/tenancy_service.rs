// src/services/tenancy_service.rs

use serde_json::json;

use crate::{
    common::error::AppError,
    db::{tenant_gateway::generate_id, TenantGateway},
    models::audit::NewAuditEntry,
    models::auth::{Identity, Role},
    models::document::{to_json_map, JsonMap},
    models::rbac::Module,
    models::tenancy::{
        RegisterSchoolPayload, RegisterSchoolResponse, School, SchoolStatus, UpdateSchoolPayload,
    },
    services::{
        audit_service::AuditService,
        auth::{AuthService, NewAccount},
    },
};

pub const SCHOOLS_COLLECTION: &str = "schools";

// A escola é dona de si mesma: o documento dela carrega tenantId == id,
// então passa pelo mesmo gateway que o resto.
#[derive(Clone)]
pub struct TenancyService {
    gateway: TenantGateway,
    auth: AuthService,
    audit: AuditService,
}

impl TenancyService {
    pub fn new(gateway: TenantGateway, auth: AuthService, audit: AuditService) -> Self {
        Self { gateway, auth, audit }
    }

    /// Cria a escola e o primeiro administrador dela.
    pub async fn register_school(
        &self,
        payload: &RegisterSchoolPayload,
    ) -> Result<RegisterSchoolResponse, AppError> {
        let school_id = format!("school_{}", generate_id());

        // 1. Escola
        let data = school_data(payload)?;
        self.gateway
            .create(SCHOOLS_COLLECTION, data, &school_id, Some(&school_id))
            .await?;

        // 2. Administrador. Se falhar (ex.: e-mail já usado), a escola não fica órfã.
        let account = NewAccount {
            email: payload.admin_email.clone(),
            password: payload.admin_password.clone(),
            name: payload.admin_name.clone(),
            role: Role::TenantAdmin,
        };
        let auth = match self.auth.sign_up(&account, &school_id).await {
            Ok(auth) => auth,
            Err(e) => {
                if let Err(cleanup) = self.gateway.delete(SCHOOLS_COLLECTION, &school_id, &school_id).await {
                    tracing::error!(school_id = %school_id, error = ?cleanup, "falha ao desfazer escola órfã");
                }
                return Err(e);
            }
        };

        // 3. Dono da escola
        let mut patch = JsonMap::new();
        patch.insert("adminUserId".into(), json!(auth.user.id));
        self.gateway
            .update(SCHOOLS_COLLECTION, &school_id, patch, &school_id)
            .await?;

        let school = self.get_school(&school_id).await?;
        tracing::info!(school_id = %school.id, name = %school.name, "🏫 escola cadastrada");

        Ok(RegisterSchoolResponse {
            school,
            admin: auth.user,
            token: auth.token,
        })
    }

    pub async fn get_school(&self, tenant_id: &str) -> Result<School, AppError> {
        let doc = self
            .gateway
            .get(SCHOOLS_COLLECTION, tenant_id, tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                collection: SCHOOLS_COLLECTION.to_string(),
                id: tenant_id.to_string(),
            })?;
        Ok(doc.into_model()?)
    }

    /// Atualiza perfil/configurações da escola do `actor` e audita como `update_school`.
    pub async fn update_school(
        &self,
        actor: &Identity,
        payload: &UpdateSchoolPayload,
    ) -> Result<School, AppError> {
        let tenant_id = actor.tenant_id.as_str();
        let before = self.get_school(tenant_id).await?;

        let patch = to_json_map(payload)?;
        if patch.is_empty() {
            return Ok(before);
        }

        self.gateway
            .update(SCHOOLS_COLLECTION, tenant_id, patch, tenant_id)
            .await?;
        let after = self.get_school(tenant_id).await?;

        let entry = NewAuditEntry::by(actor, "update_school", Module::Settings.as_str())
            .target(tenant_id, "school")
            .changes(json!({ "before": before, "after": after }));
        self.audit.record(entry).await;

        Ok(after)
    }
}

fn school_data(payload: &RegisterSchoolPayload) -> Result<JsonMap, AppError> {
    let mut data = JsonMap::new();
    data.insert("name".into(), json!(payload.name));
    data.insert("address".into(), json!(payload.address));
    data.insert("phone".into(), json!(payload.phone));
    data.insert("email".into(), json!(payload.email));
    if let Some(website) = &payload.website {
        data.insert("website".into(), json!(website));
    }
    data.insert("principalName".into(), json!(payload.principal_name));
    data.insert("status".into(), serde_json::to_value(SchoolStatus::Active)?);
    data.insert("settings".into(), serde_json::to_value(&payload.settings)?);
    Ok(data)
}
