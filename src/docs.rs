// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::request_password_reset,
        handlers::auth::confirm_password_reset,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::update_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::provision_user,

        // --- Schools ---
        handlers::tenancy::register_school,
        handlers::tenancy::get_current_school,
        handlers::tenancy::update_current_school,

        // --- RBAC ---
        handlers::rbac::list_modules,
        handlers::rbac::check_permission,
        handlers::rbac::get_user_permissions,
        handlers::rbac::toggle_permission,
        handlers::rbac::save_user_permissions,
        handlers::rbac::reset_user_permissions,

        // --- Audit ---
        handlers::audit::list_audit_logs,

        // --- Records ---
        handlers::records::create_record,
        handlers::records::list_records,
        handlers::records::get_record,
        handlers::records::update_record,
        handlers::records::delete_record,
        handlers::records::students_by_class,
        handlers::records::assignments_by_student,
        handlers::records::latest_announcements,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,

            // --- Auth ---
            models::auth::Role,
            models::auth::Identity,
            models::auth::SignUpPayload,
            models::auth::SignInPayload,
            models::auth::PasswordResetRequestPayload,
            models::auth::PasswordResetConfirmPayload,
            models::auth::UpdateProfilePayload,
            models::auth::AuthResponse,

            // --- Schools ---
            models::tenancy::SchoolStatus,
            models::tenancy::SchoolSettings,
            models::tenancy::School,
            models::tenancy::RegisterSchoolPayload,
            models::tenancy::RegisterSchoolResponse,
            models::tenancy::UpdateSchoolPayload,

            // --- RBAC ---
            models::rbac::Module,
            models::rbac::Action,
            models::rbac::PermissionGrant,
            models::rbac::ModuleCatalogEntry,
            models::rbac::SavePermissionsPayload,
            models::rbac::TogglePermissionPayload,
            models::rbac::EffectivePermissionsResponse,
            models::rbac::PermissionCheckResponse,

            // --- Audit ---
            models::audit::AuditLogEntry,

            // --- Records ---
            models::document::Document,
        )
    ),
    tags(
        (name = "Health", description = "Estado do servidor"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários da escola e perfil"),
        (name = "Schools", description = "Cadastro e configurações da escola"),
        (name = "RBAC", description = "Controle de Acesso (Módulos, Ações e Permissões)"),
        (name = "Audit", description = "Trilha de auditoria"),
        (name = "Records", description = "Registros dos módulos (alunos, turmas, notas...)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
