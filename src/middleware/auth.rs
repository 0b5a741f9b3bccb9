// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Identity,
};

// Token cru da requisição (o logout precisa dele)
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Exige `Authorization: Bearer <jwt>` válido e não revogado.
/// Guarda a identidade (e o token) nos extensions da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return AppError::InvalidToken
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response();
    };
    let token = bearer.token().to_string();

    let identity = match app_state.auth_service.validate_token(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, "token rejeitado");
            // Usuário apagado ou de outra escola: para o cliente, o token não vale mais
            let e = match e {
                AppError::UserNotFound | AppError::AccessDenied { .. } => AppError::InvalidToken,
                other => other,
            };
            return e.to_api_error(&locale, &app_state.i18n_store).into_response();
        }
    };

    request.extensions_mut().insert(AuthenticatedUser(identity));
    request.extensions_mut().insert(BearerToken(token));
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
