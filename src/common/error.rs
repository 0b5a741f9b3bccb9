// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erro de domínio/infraestrutura. Tudo que sai dos repositórios e serviços é um AppError.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Negação do motor de permissões (módulo/ação)
    #[error("Permissão '{module}:{action}' negada")]
    Forbidden { module: String, action: String },

    // Documento pertence a outra escola. Nunca vira NotFound.
    #[error("Acesso negado: documento {collection}/{id} pertence a outra escola")]
    AccessDenied { collection: String, id: String },

    #[error("Documento não encontrado: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Documento já existe: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    // Módulo ou ação fora do catálogo fechado (tela de administração)
    #[error("Permissão inválida: {0}")]
    InvalidPermission(String),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Chave estável usada no catálogo de mensagens e no campo `code` da resposta.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::Forbidden { .. } => "forbidden",
            AppError::AccessDenied { .. } => "access_denied",
            AppError::NotFound { .. } => "not_found",
            AppError::AlreadyExists { .. } => "already_exists",
            AppError::InvalidPermission(_) => "invalid_permission",
            AppError::BadRequest(_) => "bad_request",
            _ => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidPermission(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::AlreadyExists { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden { .. } | AppError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro numa resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let error = store.translate(&locale.0, self.code());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .map(Value::String)
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            AppError::Forbidden { module, action } => {
                Some(json!({ "module": module, "action": action }))
            }
            AppError::AccessDenied { collection, id }
            | AppError::NotFound { collection, id }
            | AppError::AlreadyExists { collection, id } => {
                Some(json!({ "collection": collection, "id": id }))
            }
            AppError::InvalidPermission(msg) | AppError::BadRequest(msg) => {
                Some(json!({ "reason": msg }))
            }
            _ => None,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe real fica só no log, nunca na resposta.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        ApiError {
            status,
            code: self.code(),
            error,
            details,
        }
    }
}

// Erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "code": self.code, "error": self.error });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Handlers sem Locale (ex.: middlewares) respondem em inglês.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}
