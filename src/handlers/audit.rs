// src/handlers/audit.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermSettingsRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::audit::{AuditLogEntry, AuditQuery},
};

// GET /api/audit-logs
#[utoipa::path(
    get,
    path = "/api/audit-logs",
    tag = "Audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Trilha da escola, mais recentes primeiro", body = [AuditLogEntry]),
        (status = 403, description = "Sem permissão settings:read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsRead>,
    tenant: TenantContext,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = app_state
        .audit_service
        .list(&tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}
