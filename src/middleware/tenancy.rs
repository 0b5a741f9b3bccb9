// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser};

// Cabeçalho opcional: se vier, tem que bater com a escola do usuário
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// A escola da requisição. Sempre derivada da identidade autenticada,
// nunca escolhida livremente pelo cliente.
#[derive(Debug, Clone)]
pub struct TenantContext(pub String);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if let Some(value) = parts.headers.get(TENANT_ID_HEADER) {
            let requested = value
                .to_str()
                .map_err(|_| AppError::BadRequest("Cabeçalho X-Tenant-ID inválido.".into()))?;

            if requested != user.tenant_id {
                tracing::warn!(
                    user_id = %user.id,
                    user_tenant = %user.tenant_id,
                    requested_tenant = requested,
                    "X-Tenant-ID de outra escola"
                );
                return Err(AppError::AccessDenied {
                    collection: "schools".into(),
                    id: requested.to_string(),
                });
            }
        }

        Ok(TenantContext(user.tenant_id))
    }
}
