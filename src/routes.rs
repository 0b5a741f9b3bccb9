// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/password-reset", post(handlers::auth::request_password_reset))
        .route("/password-reset/confirm", post(handlers::auth::confirm_password_reset));

    // Daqui para baixo tudo exige token (auth_guard)
    let protected = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Usuários
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::provision_user),
        )
        .route(
            "/api/users/me",
            get(handlers::auth::get_me).patch(handlers::auth::update_me),
        )
        .route("/api/users/{user_id}", get(handlers::users::get_user))
        // Escola
        .route(
            "/api/schools/current",
            get(handlers::tenancy::get_current_school).patch(handlers::tenancy::update_current_school),
        )
        // Permissões
        .route("/api/permissions/modules", get(handlers::rbac::list_modules))
        .route("/api/permissions/check", get(handlers::rbac::check_permission))
        .route("/api/permissions/toggle", post(handlers::rbac::toggle_permission))
        .route(
            "/api/permissions/users/{user_id}",
            get(handlers::rbac::get_user_permissions)
                .put(handlers::rbac::save_user_permissions)
                .delete(handlers::rbac::reset_user_permissions),
        )
        // Auditoria
        .route("/api/audit-logs", get(handlers::audit::list_audit_logs))
        // Registros dos módulos
        .route(
            "/api/records/{module}",
            get(handlers::records::list_records).post(handlers::records::create_record),
        )
        .route(
            "/api/records/{module}/{id}",
            get(handlers::records::get_record)
                .patch(handlers::records::update_record)
                .delete(handlers::records::delete_record),
        )
        .route("/api/classes/{class_id}/students", get(handlers::records::students_by_class))
        .route(
            "/api/students/{student_id}/assignments",
            get(handlers::records::assignments_by_student),
        )
        .route("/api/announcements/latest", get(handlers::records::latest_announcements))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health))
        .route("/api/schools", post(handlers::tenancy::register_school))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state)
}
