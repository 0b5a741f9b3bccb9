// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::{Action, Module},
};

/// 1. Uma permissão fixa de rota (módulo + ação)
pub trait PermissionDef: Send + Sync + 'static {
    fn module() -> Module;
    fn action() -> Action;
}

/// 2. O Extractor (Guardião): consulta o motor de permissões antes do handler
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        // A. Usuário (colocado pelo auth_guard)
        let user = parts.extensions.get::<AuthenticatedUser>();

        // B. Decisão
        let (module, action) = (T::module(), T::action());
        let allowed = app_state
            .engine
            .is_allowed(user.map(|u| &u.0), module.as_str(), action.as_str());

        if !allowed {
            let err = match user {
                None => AppError::InvalidToken,
                Some(_) => AppError::Forbidden {
                    module: module.to_string(),
                    action: action.to_string(),
                },
            };
            return Err(err.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermSettingsRead;
impl PermissionDef for PermSettingsRead {
    fn module() -> Module { Module::Settings }
    fn action() -> Action { Action::Read }
}

pub struct PermSettingsUpdate;
impl PermissionDef for PermSettingsUpdate {
    fn module() -> Module { Module::Settings }
    fn action() -> Action { Action::Update }
}
