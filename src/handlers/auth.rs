// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, BearerToken},
        i18n::Locale,
    },
    models::auth::{
        AuthResponse, Identity, PasswordResetConfirmPayload, PasswordResetRequestPayload, Role,
        SignInPayload, SignUpPayload, UpdateProfilePayload,
    },
    services::auth::NewAccount,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Conta criada", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    let tenant_id = payload
        .tenant_id
        .clone()
        .ok_or_else(|| tr(AppError::BadRequest("tenantId é obrigatório".into())))?;

    // Administrador só nasce com a escola ou pelas mãos de outro administrador
    if payload.role == Role::TenantAdmin {
        return Err(tr(AppError::BadRequest(
            "tenant_admin não pode se cadastrar sozinho".into(),
        )));
    }

    // A escola tem que existir
    app_state
        .tenancy_service
        .get_school(&tenant_id)
        .await
        .map_err(tr)?;

    let account = NewAccount {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        role: payload.role,
    };
    let response = app_state
        .auth_service
        .sign_up(&account, &tenant_id)
        .await
        .map_err(tr)?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Login efetuado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SignInPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    let response = app_state
        .auth_service
        .sign_in(&payload.email, &payload.password)
        .await
        .map_err(tr)?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 204, description = "Token revogado")),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, ApiError> {
    app_state
        .auth_service
        .sign_out(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    tag = "Auth",
    request_body = PasswordResetRequestPayload,
    responses((status = 202, description = "Pedido aceito (mesma resposta exista ou não o e-mail)"))
)]
pub async fn request_password_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PasswordResetRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    // O ticket não volta na resposta: só o canal de e-mail o entrega
    app_state
        .auth_service
        .request_password_reset(&payload.email)
        .await
        .map_err(tr)?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/confirm",
    tag = "Auth",
    request_body = PasswordResetConfirmPayload,
    responses(
        (status = 204, description = "Senha redefinida"),
        (status = 401, description = "Ticket inválido ou expirado")
    )
)]
pub async fn confirm_password_reset(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PasswordResetConfirmPayload>,
) -> Result<StatusCode, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    app_state
        .auth_service
        .confirm_password_reset(&payload.token, &payload.new_password)
        .await
        .map_err(tr)?;

    Ok(StatusCode::NO_CONTENT)
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Usuário autenticado", body = Identity)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<Identity> {
    Json(user)
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses((status = 200, description = "Perfil atualizado", body = Identity)),
    security(("api_jwt" = []))
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<Identity>, ApiError> {
    let tr = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    payload.validate().map_err(|e| tr(e.into()))?;

    let updated = app_state
        .user_service
        .update_profile(&user, &payload)
        .await
        .map_err(tr)?;

    Ok(Json(updated))
}
