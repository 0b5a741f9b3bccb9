// src/models/auth.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::rbac::{Module, PermissionGrant};

// Perfis fixos. "school_admin" e "admin" são grafias antigas aceitas na leitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "school_admin", alias = "admin")]
    TenantAdmin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::TenantAdmin, Role::Teacher, Role::Student, Role::Parent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TenantAdmin => "tenant_admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// Módulo que governa a criação de contas deste perfil.
    pub fn provisioning_module(&self) -> Module {
        match self {
            Role::TenantAdmin => Module::Settings,
            Role::Teacher => Module::Teachers,
            Role::Student => Module::Students,
            Role::Parent => Module::Parents,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant_admin" | "school_admin" | "admin" => Ok(Role::TenantAdmin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            other => Err(AppError::BadRequest(format!("perfil desconhecido '{other}'"))),
        }
    }
}

// O usuário como guardado na coleção `users` (sempre com a escola)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub tenant_id: String,

    // Concessões personalizadas. Quando presentes e não vazias substituem o padrão do perfil.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionGrant>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn custom_permissions(&self) -> Option<&[PermissionGrant]> {
        self.permissions
            .as_deref()
            .filter(|grants| !grants.is_empty())
    }
}

// Credenciais do provedor de identidade (coleção `credentials`, chave = e-mail)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub email: String,
    pub password_hash: String,
    pub user_id: String,
    pub tenant_id: String,
}

// Dados para cadastro de um novo usuário
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "prof.ana@escola.com")]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Ana Souza")]
    pub name: String,

    pub role: Role,

    // Só no cadastro público (a escola em que a conta entra)
    #[serde(default)]
    #[schema(example = "school_3f2a9c1e0b7d4e2f8a6c5b4d3e2f1a0b")]
    pub tenant_id: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequestPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirmPayload {
    #[validate(length(min = 1, message = "required"))]
    pub token: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

// Edição do próprio perfil: só nome e foto
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(url(message = "URL inválida."))]
    pub photo_url: Option<String>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: Identity,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (ID do usuário)
    pub tenant: String, // Escola do usuário
    pub jti: String,    // ID do token (para logout)
    pub exp: usize,     // Expiration time (quando o token expira)
    pub iat: usize,     // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_admin_spellings_deserialize() {
        for raw in ["tenant_admin", "school_admin", "admin"] {
            let role: Role = serde_json::from_value(json!(raw)).unwrap();
            assert_eq!(role, Role::TenantAdmin);
        }
        assert_eq!(serde_json::to_value(Role::TenantAdmin).unwrap(), json!("tenant_admin"));
    }

    #[test]
    fn empty_custom_list_counts_as_absent() {
        let now = Utc::now();
        let mut identity = Identity {
            id: "u1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
            role: Role::Teacher,
            tenant_id: "school_1".into(),
            permissions: Some(vec![]),
            photo_url: None,
            created_at: now,
            updated_at: now,
        };
        assert!(identity.custom_permissions().is_none());

        identity.permissions = Some(vec![PermissionGrant::new("grades", ["read"])]);
        assert_eq!(identity.custom_permissions().map(|g| g.len()), Some(1));
    }
}
