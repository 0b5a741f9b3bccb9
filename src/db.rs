pub mod document_store;
pub use document_store::{Direction, DocumentStore, Filter, FilterOp, Query};
pub mod memory_store;
pub use memory_store::MemoryDocumentStore;
pub mod pg_store;
pub use pg_store::PgDocumentStore;
pub mod tenant_gateway;
pub use tenant_gateway::TenantGateway;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod credential_repo;
pub use credential_repo::CredentialRepository;
