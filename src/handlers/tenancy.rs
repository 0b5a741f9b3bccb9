// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSettingsUpdate, RequirePermission},
        tenancy::TenantContext,
    },
    models::tenancy::{RegisterSchoolPayload, RegisterSchoolResponse, School, UpdateSchoolPayload},
};

#[utoipa::path(
    post,
    path = "/api/schools",
    tag = "Schools",
    request_body = RegisterSchoolPayload,
    responses(
        (status = 201, description = "Escola e administrador criados", body = RegisterSchoolResponse),
        (status = 409, description = "E-mail do administrador já cadastrado")
    )
)]
pub async fn register_school(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterSchoolPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    let response = app_state
        .tenancy_service
        .register_school(&payload)
        .await
        .map_err(tr)?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/schools/current",
    tag = "Schools",
    responses((status = 200, description = "Escola do usuário", body = School)),
    params(("x-tenant-id" = Option<String>, Header, description = "ID da Escola (opcional, deve ser a do usuário)")),
    security(("api_jwt" = []))
)]
pub async fn get_current_school(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Json<School>, ApiError> {
    let school = app_state
        .tenancy_service
        .get_school(&tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(school))
}

#[utoipa::path(
    patch,
    path = "/api/schools/current",
    tag = "Schools",
    request_body = UpdateSchoolPayload,
    responses(
        (status = 200, description = "Escola atualizada", body = School),
        (status = 403, description = "Sem permissão settings:update")
    ),
    params(("x-tenant-id" = Option<String>, Header, description = "ID da Escola (opcional, deve ser a do usuário)")),
    security(("api_jwt" = []))
)]
pub async fn update_current_school(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermSettingsUpdate>,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateSchoolPayload>,
) -> Result<Json<School>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    let school = app_state
        .tenancy_service
        .update_school(&user, &payload)
        .await
        .map_err(tr)?;

    Ok(Json(school))
}
