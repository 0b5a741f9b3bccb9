pub mod audit;
pub mod auth;
pub mod document;
pub mod rbac;
pub mod tenancy;
