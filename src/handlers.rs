pub mod audit;
pub mod auth;
pub mod health;
pub mod rbac;
pub mod records;
pub mod tenancy;
pub mod users;
