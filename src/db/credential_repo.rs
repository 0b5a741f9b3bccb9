// src/db/credential_repo.rs

// Armazenamento do provedor de identidade: credenciais, tokens revogados e
// tickets de redefinição de senha. Não são dados de escola, por isso ficam
// fora do TenantGateway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::error::AppError;
use crate::db::document_store::DocumentStore;
use crate::models::auth::Credential;
use crate::models::document::to_json_map;

const CREDENTIALS: &str = "credentials";
const REVOKED_TOKENS: &str = "revoked_tokens";
const PASSWORD_RESETS: &str = "password_resets";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTicket {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CredentialRepository {
    store: Arc<dyn DocumentStore>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl CredentialRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AppError> {
        let Some(doc) = self.store.get(CREDENTIALS, &normalize_email(email)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(Value::Object(doc.data))?))
    }

    // O e-mail é a chave: a inserção atômica decide quem fica com ele.
    // Falha com EmailAlreadyExists se já está cadastrado.
    pub async fn create(&self, credential: &Credential) -> Result<(), AppError> {
        let key = normalize_email(&credential.email);
        if !self.store.insert(CREDENTIALS, &key, to_json_map(credential)?).await? {
            return Err(AppError::EmailAlreadyExists);
        }
        Ok(())
    }

    pub async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<(), AppError> {
        let mut patch = serde_json::Map::new();
        patch.insert("passwordHash".into(), Value::String(password_hash.to_string()));

        if !self.store.merge(CREDENTIALS, &normalize_email(email), patch, None).await? {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut data = serde_json::Map::new();
        data.insert("expiresAt".into(), serde_json::to_value(expires_at)?);
        self.store.set(REVOKED_TOKENS, jti, data).await
    }

    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool, AppError> {
        Ok(self.store.get(REVOKED_TOKENS, jti).await?.is_some())
    }

    pub async fn save_reset_ticket(&self, token: &str, ticket: &ResetTicket) -> Result<(), AppError> {
        self.store.set(PASSWORD_RESETS, token, to_json_map(ticket)?).await
    }

    /// Lê e apaga o ticket (uso único).
    pub async fn take_reset_ticket(&self, token: &str) -> Result<Option<ResetTicket>, AppError> {
        let Some(doc) = self.store.get(PASSWORD_RESETS, token).await? else {
            return Ok(None);
        };
        // Quem apaga é quem usa; um segundo uso concorrente fica sem ticket
        if !self.store.delete(PASSWORD_RESETS, token, None).await? {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(Value::Object(doc.data))?))
    }
}
