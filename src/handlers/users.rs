// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSettingsRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::auth::{Identity, Role, SignUpPayload},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Filtra por perfil (tenant_admin, teacher, student, parent)
    pub role: Option<Role>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(ListUsersQuery),
    responses((status = 200, description = "Usuários da escola", body = [Identity])),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsRead>,
    tenant: TenantContext,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<Identity>>, ApiError> {
    let users = app_state
        .user_service
        .list(&tenant.0, query.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = Identity),
        (status = 403, description = "Usuário de outra escola"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsRead>,
    tenant: TenantContext,
    Path(user_id): Path<String>,
) -> Result<Json<Identity>, ApiError> {
    let user = app_state
        .user_service
        .get(&user_id, &tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

// A permissão depende do perfil criado; quem decide é o serviço
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Usuário cadastrado na escola", body = Identity),
        (status = 403, description = "Sem permissão para cadastrar este perfil"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn provision_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    let created = app_state
        .user_service
        .provision(&actor, &payload)
        .await
        .map_err(tr)?;

    Ok((StatusCode::CREATED, Json(created)))
}
