pub mod audit_service;
pub mod auth;
pub mod permission_admin;
pub mod permission_model;
pub mod rbac_service;
pub mod record_service;
pub mod tenancy_service;
pub mod user_service;

pub use audit_service::AuditService;
pub use auth::AuthService;
pub use permission_admin::PermissionAdminService;
pub use rbac_service::PermissionEngine;
pub use record_service::RecordService;
pub use tenancy_service::TenancyService;
pub use user_service::UserService;
