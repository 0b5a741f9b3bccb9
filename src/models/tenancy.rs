// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::auth::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SchoolStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSettings {
    #[schema(example = "2026-02-01")]
    pub academic_year_start: String,
    #[schema(example = "2026-12-15")]
    pub academic_year_end: String,
    #[schema(example = "America/Sao_Paulo")]
    pub timezone: String,
}

// ---
// A escola é a própria partição (tenant). O id dela é o tenantId de todo o resto.
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct School {
    #[schema(example = "school_3f2a9c1e0b7d4e2f8a6c5b4d3e2f1a0b")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub principal_name: String,

    // Preenchido logo após o cadastro do primeiro administrador
    #[serde(default)]
    pub admin_user_id: Option<String>,

    pub status: SchoolStatus,
    pub settings: SchoolSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cadastro da escola + conta do primeiro administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchoolPayload {
    #[validate(length(min = 1, message = "O nome da escola é obrigatório."))]
    #[schema(example = "Colégio Estadual Central")]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub website: Option<String>,
    #[validate(length(min = 1, message = "O nome do diretor é obrigatório."))]
    pub principal_name: String,
    pub settings: SchoolSettings,

    #[validate(length(min = 1, message = "O nome do administrador é obrigatório."))]
    pub admin_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub admin_email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub admin_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterSchoolResponse {
    pub school: School,
    pub admin: Identity,
    pub token: String,
}

// Campos que o administrador pode alterar. Status e dono não passam por aqui.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchoolPayload {
    #[validate(length(min = 1, message = "O nome da escola é obrigatório."))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SchoolSettings>,
}
