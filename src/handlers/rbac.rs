// src/handlers/rbac.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSettingsRead, PermSettingsUpdate, RequirePermission},
        tenancy::TenantContext,
    },
    models::audit::NewAuditEntry,
    models::auth::Identity,
    models::rbac::{
        EffectivePermissionsResponse, Module, ModuleCatalogEntry, PermissionCheckQuery,
        PermissionCheckResponse, PermissionGrant, SavePermissionsPayload, TogglePermissionPayload,
    },
    services::{
        permission_admin::{load_effective_permissions, toggle_action},
        permission_model::module_catalog,
    },
};

fn effective(user: &Identity) -> EffectivePermissionsResponse {
    EffectivePermissionsResponse {
        user_id: user.id.clone(),
        custom: user.custom_permissions().is_some(),
        permissions: load_effective_permissions(user),
    }
}

#[utoipa::path(
    get,
    path = "/api/permissions/modules",
    tag = "RBAC",
    responses((status = 200, description = "Catálogo de módulos e ações", body = [ModuleCatalogEntry])),
    security(("api_jwt" = []))
)]
pub async fn list_modules(_user: AuthenticatedUser) -> Json<Vec<ModuleCatalogEntry>> {
    Json(module_catalog())
}

#[utoipa::path(
    get,
    path = "/api/permissions/check",
    tag = "RBAC",
    params(PermissionCheckQuery),
    responses((status = 200, description = "Decisão para o usuário logado", body = PermissionCheckResponse)),
    security(("api_jwt" = []))
)]
pub async fn check_permission(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<PermissionCheckQuery>,
) -> Json<PermissionCheckResponse> {
    let allowed = app_state
        .engine
        .is_allowed(Some(&user), &query.module, &query.action);

    Json(PermissionCheckResponse {
        module: query.module,
        action: query.action,
        allowed,
    })
}

#[utoipa::path(
    get,
    path = "/api/permissions/users/{user_id}",
    tag = "RBAC",
    params(("user_id" = String, Path, description = "ID do usuário")),
    responses((status = 200, description = "Permissões em vigor", body = EffectivePermissionsResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_user_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsRead>,
    tenant: TenantContext,
    Path(user_id): Path<String>,
) -> Result<Json<EffectivePermissionsResponse>, ApiError> {
    let user = app_state
        .user_service
        .get(&user_id, &tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(effective(&user)))
}

// Pré-visualização: não grava nada
#[utoipa::path(
    post,
    path = "/api/permissions/toggle",
    tag = "RBAC",
    request_body = TogglePermissionPayload,
    responses((status = 200, description = "Lista resultante", body = [PermissionGrant])),
    security(("api_jwt" = []))
)]
pub async fn toggle_permission(
    _perm: RequirePermission<PermSettingsUpdate>,
    Json(payload): Json<TogglePermissionPayload>,
) -> Json<Vec<PermissionGrant>> {
    Json(toggle_action(
        &payload.permissions,
        payload.module.as_str(),
        payload.action.as_str(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/permissions/users/{user_id}",
    tag = "RBAC",
    params(("user_id" = String, Path, description = "ID do usuário")),
    request_body = SavePermissionsPayload,
    responses(
        (status = 200, description = "Permissões salvas", body = EffectivePermissionsResponse),
        (status = 400, description = "Módulo ou ação fora do catálogo"),
        (status = 403, description = "Usuário de outra escola ou sem settings:update")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_user_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsUpdate>,
    tenant: TenantContext,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(user_id): Path<String>,
    Json(payload): Json<SavePermissionsPayload>,
) -> Result<Json<EffectivePermissionsResponse>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let target = app_state
        .user_service
        .get(&user_id, &tenant.0)
        .await
        .map_err(tr)?;
    let before = load_effective_permissions(&target);

    let saved = app_state
        .permission_admin
        .save(&target, payload.permissions, &tenant.0)
        .await
        .map_err(tr)?;

    // 1. Gravou; 2. audita (quem chama o save é quem registra)
    let entry = NewAuditEntry::by(&actor, "update_permissions", Module::Settings.as_str())
        .target(&target.id, "user")
        .changes(json!({ "before": before, "after": saved }));
    app_state.audit_service.record(entry).await;

    let updated = app_state
        .user_service
        .get(&user_id, &tenant.0)
        .await
        .map_err(tr)?;
    Ok(Json(effective(&updated)))
}

#[utoipa::path(
    delete,
    path = "/api/permissions/users/{user_id}",
    tag = "RBAC",
    params(("user_id" = String, Path, description = "ID do usuário")),
    responses((status = 200, description = "De volta ao padrão do perfil", body = EffectivePermissionsResponse)),
    security(("api_jwt" = []))
)]
pub async fn reset_user_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsUpdate>,
    tenant: TenantContext,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<EffectivePermissionsResponse>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let target = app_state
        .user_service
        .get(&user_id, &tenant.0)
        .await
        .map_err(tr)?;
    let before = load_effective_permissions(&target);

    app_state
        .permission_admin
        .reset(&target, &tenant.0)
        .await
        .map_err(tr)?;

    let updated = app_state
        .user_service
        .get(&user_id, &tenant.0)
        .await
        .map_err(tr)?;
    let after = effective(&updated);

    let entry = NewAuditEntry::by(&actor, "reset_permissions", Module::Settings.as_str())
        .target(&target.id, "user")
        .changes(json!({ "before": before, "after": after.permissions }));
    app_state.audit_service.record(entry).await;

    Ok(Json(after))
}
