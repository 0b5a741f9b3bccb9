// src/models/rbac.rs

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::error::AppError;

// ---
// Catálogo fechado de módulos e ações (validado na tela de administração)
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Students,
    Teachers,
    Parents,
    Classes,
    Assignments,
    Grades,
    Announcements,
    Attendance,
    Reports,
    Settings,
}

impl Module {
    pub const ALL: [Module; 10] = [
        Module::Students,
        Module::Teachers,
        Module::Parents,
        Module::Classes,
        Module::Assignments,
        Module::Grades,
        Module::Announcements,
        Module::Attendance,
        Module::Reports,
        Module::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Students => "students",
            Module::Teachers => "teachers",
            Module::Parents => "parents",
            Module::Classes => "classes",
            Module::Assignments => "assignments",
            Module::Grades => "grades",
            Module::Announcements => "announcements",
            Module::Attendance => "attendance",
            Module::Reports => "reports",
            Module::Settings => "settings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Module::Students => "Students",
            Module::Teachers => "Teachers",
            Module::Parents => "Parents",
            Module::Classes => "Classes",
            Module::Assignments => "Assignments",
            Module::Grades => "Grades",
            Module::Announcements => "Announcements",
            Module::Attendance => "Attendance",
            Module::Reports => "Reports",
            Module::Settings => "Settings",
        }
    }

    /// Ações que fazem sentido neste módulo (CRUD + extensões, ex.: `export` em relatórios).
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Module::Reports => &[
                Action::Create,
                Action::Read,
                Action::Update,
                Action::Delete,
                Action::Export,
            ],
            _ => &Action::CRUD,
        }
    }

    /// Módulos cujos registros vivem numa coleção própria de documentos.
    pub fn holds_records(&self) -> bool {
        !matches!(self, Module::Reports | Module::Settings)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AppError::InvalidPermission(format!("módulo desconhecido '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Export,
}

impl Action {
    pub const CRUD: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Export => "export",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "export" => Ok(Action::Export),
            other => Err(AppError::InvalidPermission(format!("ação desconhecida '{other}'"))),
        }
    }
}

// ---
// Concessão de permissão: (módulo, conjunto de ações)
// ---

// O motor compara tokens simples; o catálogo acima só é imposto ao salvar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    #[schema(example = "grades")]
    pub module: String,

    #[schema(example = json!(["read", "update"]))]
    pub actions: BTreeSet<String>,
}

impl PermissionGrant {
    pub fn new<I, S>(module: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module: module.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, action: &str) -> bool {
        self.actions.contains(action)
    }
}

/// Procura o módulo na lista; `None` se ele não aparece.
pub fn find_grant<'a>(grants: &'a [PermissionGrant], module: &str) -> Option<&'a PermissionGrant> {
    grants.iter().find(|g| g.module == module)
}

// Uma linha do catálogo exibido na tela de permissões (módulo × ações)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCatalogEntry {
    pub id: Module,
    pub name: &'static str,
    pub actions: Vec<Action>,
}

// Payload para salvar as permissões de um usuário
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavePermissionsPayload {
    pub permissions: Vec<PermissionGrant>,
}

// Payload para marcar/desmarcar uma célula da tabela (pré-visualização)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TogglePermissionPayload {
    pub permissions: Vec<PermissionGrant>,
    pub module: Module,
    pub action: Action,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissionsResponse {
    pub user_id: String,
    /// `true` quando a lista vem de concessões personalizadas, `false` quando é o padrão do perfil.
    pub custom: bool,
    pub permissions: Vec<PermissionGrant>,
}

// Consulta "posso?" do usuário logado (a interface esconde o que não pode)
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionCheckQuery {
    pub module: String,
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub module: String,
    pub action: String,
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_and_action_parse_from_tokens() {
        assert_eq!("grades".parse::<Module>().unwrap(), Module::Grades);
        assert_eq!("export".parse::<Action>().unwrap(), Action::Export);
        assert!("library".parse::<Module>().is_err());
        assert!("approve".parse::<Action>().is_err());
    }

    #[test]
    fn only_reports_offer_export() {
        assert!(Module::Reports.actions().contains(&Action::Export));
        assert!(!Module::Grades.actions().contains(&Action::Export));
    }

    #[test]
    fn grant_actions_are_a_set() {
        let grant = PermissionGrant::new("grades", ["read", "update", "read"]);
        assert_eq!(grant.actions.len(), 2);
        assert!(grant.allows("update"));
        assert!(!grant.allows("delete"));
    }
}
