// src/handlers/records.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::document::{Document, JsonMap},
    models::rbac::Module,
    services::record_service::query_from_params,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreateRecordQuery {
    /// Id escolhido pelo cliente (nunca sobrescreve um registro existente)
    pub id: Option<String>,
}

fn parse_module(raw: &str) -> Result<Module, AppError> {
    raw.parse()
}

#[utoipa::path(
    post,
    path = "/api/records/{module}",
    tag = "Records",
    params(
        ("module" = String, Path, description = "students, teachers, parents, classes, assignments, grades, announcements, attendance"),
        CreateRecordQuery
    ),
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Registro criado", body = Document),
        (status = 403, description = "Sem permissão <module>:create"),
        (status = 409, description = "Id já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_record(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(module): Path<String>,
    Query(params): Query<CreateRecordQuery>,
    Json(data): Json<JsonMap>,
) -> Result<impl IntoResponse, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let module = parse_module(&module).map_err(tr)?;
    let created = app_state
        .record_service
        .create(&user, module, data, params.id.as_deref())
        .await
        .map_err(tr)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/records/{module}",
    tag = "Records",
    params(
        ("module" = String, Path, description = "Módulo"),
        ("orderBy" = Option<String>, Query, description = "Campo de ordenação"),
        ("direction" = Option<String>, Query, description = "asc | desc"),
        ("limit" = Option<usize>, Query, description = "Máximo de registros"),
    ),
    responses((status = 200, description = "Registros da escola (demais parâmetros filtram por igualdade)", body = [Document])),
    security(("api_jwt" = []))
)]
pub async fn list_records(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(module): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let module = parse_module(&module).map_err(tr)?;
    let query = query_from_params(&params).map_err(tr)?;
    let records = app_state
        .record_service
        .list(&user, module, query)
        .await
        .map_err(tr)?;

    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/records/{module}/{id}",
    tag = "Records",
    params(
        ("module" = String, Path, description = "Módulo"),
        ("id" = String, Path, description = "ID do registro")
    ),
    responses(
        (status = 200, description = "Registro", body = Document),
        (status = 403, description = "Registro de outra escola ou sem permissão"),
        (status = 404, description = "Registro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_record(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((module, id)): Path<(String, String)>,
) -> Result<Json<Document>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let module = parse_module(&module).map_err(tr)?;
    let record = app_state
        .record_service
        .get(&user, module, &id)
        .await
        .map_err(tr)?;

    Ok(Json(record))
}

#[utoipa::path(
    patch,
    path = "/api/records/{module}/{id}",
    tag = "Records",
    params(
        ("module" = String, Path, description = "Módulo"),
        ("id" = String, Path, description = "ID do registro")
    ),
    request_body = serde_json::Value,
    responses((status = 200, description = "Registro atualizado (tenantId e createdAt são ignorados)", body = Document)),
    security(("api_jwt" = []))
)]
pub async fn update_record(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((module, id)): Path<(String, String)>,
    Json(patch): Json<JsonMap>,
) -> Result<Json<Document>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let module = parse_module(&module).map_err(tr)?;
    let record = app_state
        .record_service
        .update(&user, module, &id, patch)
        .await
        .map_err(tr)?;

    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/api/records/{module}/{id}",
    tag = "Records",
    params(
        ("module" = String, Path, description = "Módulo"),
        ("id" = String, Path, description = "ID do registro")
    ),
    responses((status = 204, description = "Registro apagado")),
    security(("api_jwt" = []))
)]
pub async fn delete_record(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((module, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let module = parse_module(&module).map_err(tr)?;
    app_state
        .record_service
        .delete(&user, module, &id)
        .await
        .map_err(tr)?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Consultas dos painéis
// ---

#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/students",
    tag = "Records",
    params(("class_id" = String, Path, description = "ID da turma")),
    responses((status = 200, description = "Alunos da turma, por nome", body = [Document])),
    security(("api_jwt" = []))
)]
pub async fn students_by_class(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(class_id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let students = app_state
        .record_service
        .students_by_class(&user, &class_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/{student_id}/assignments",
    tag = "Records",
    params(("student_id" = String, Path, description = "ID do aluno")),
    responses((status = 200, description = "Tarefas do aluno, entrega mais distante primeiro", body = [Document])),
    security(("api_jwt" = []))
)]
pub async fn assignments_by_student(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let assignments = app_state
        .record_service
        .assignments_by_student(&user, &student_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(assignments))
}

#[utoipa::path(
    get,
    path = "/api/announcements/latest",
    tag = "Records",
    responses((status = 200, description = "Os 10 avisos mais recentes", body = [Document])),
    security(("api_jwt" = []))
)]
pub async fn latest_announcements(
    State(app_state): State<AppState>,
    locale: Locale,
    _tenant: TenantContext,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Document>>, ApiError> {
    let announcements = app_state
        .record_service
        .latest_announcements(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(announcements))
}
