// src/services/permission_model.rs

use crate::models::auth::Role;
use crate::models::rbac::{Module, ModuleCatalogEntry, PermissionGrant};

type GrantRow = (&'static str, &'static [&'static str]);

const CRUD: &[&str] = &["create", "read", "update", "delete"];

// ---
// Permissões padrão por perfil (quando o usuário não tem concessões personalizadas)
// ---
const ROLE_DEFAULTS: &[(Role, &[GrantRow])] = &[
    (Role::TenantAdmin, &[
        ("students", CRUD),
        ("teachers", CRUD),
        ("parents", CRUD),
        ("classes", CRUD),
        ("assignments", CRUD),
        ("grades", CRUD),
        ("announcements", CRUD),
        ("attendance", CRUD),
        ("reports", &["create", "read", "update", "delete", "export"]),
        ("settings", CRUD),
    ]),
    (Role::Teacher, &[
        ("students", &["read"]),
        ("classes", &["read"]),
        ("assignments", CRUD),
        ("grades", &["create", "read", "update"]),
        ("announcements", &["create", "read"]),
        ("attendance", &["create", "read", "update"]),
        ("reports", &["read"]),
    ]),
    (Role::Student, &[
        ("assignments", &["read"]),
        ("grades", &["read"]),
        ("announcements", &["read"]),
        ("attendance", &["read"]),
        ("classes", &["read"]),
    ]),
    (Role::Parent, &[
        // Na prática, só os próprios filhos
        ("students", &["read"]),
        ("assignments", &["read"]),
        ("grades", &["read"]),
        ("announcements", &["read"]),
        ("attendance", &["read"]),
        ("classes", &["read"]),
    ]),
];

fn default_rows(role: Role) -> &'static [GrantRow] {
    ROLE_DEFAULTS
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, rows)| *rows)
        .unwrap_or(&[])
}

/// Lista padrão do perfil, na ordem da tabela. Perfil fora da tabela recebe lista vazia.
pub fn default_permissions_for(role: Role) -> Vec<PermissionGrant> {
    default_rows(role)
        .iter()
        .map(|(module, actions)| PermissionGrant::new(*module, actions.iter().copied()))
        .collect()
}

/// Mesma consulta do padrão, sem alocar. Usada pelo motor de decisão.
pub fn role_default_allows(role: Role, module: &str, action: &str) -> bool {
    default_rows(role)
        .iter()
        .find(|(m, _)| *m == module)
        .is_some_and(|(_, actions)| actions.contains(&action))
}

/// Catálogo fechado (módulo × ações) para a tela de administração.
pub fn module_catalog() -> Vec<ModuleCatalogEntry> {
    Module::ALL
        .into_iter()
        .map(|module| ModuleCatalogEntry {
            id: module,
            name: module.label(),
            actions: module.actions().to_vec(),
        })
        .collect()
}
