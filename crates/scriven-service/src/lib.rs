//! # scriven-service
//!
//! Service facade for the knowledge base and synthesis engine: wires
//! storage, extraction, indexing, synthesis, and the generated-document
//! lifecycle into per-tenant [`KnowledgeService`] instances.

pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod service;
pub mod tenants;

pub use config::ServiceConfig;
pub use logging::init_logging;
pub use lifecycle::{CreateDocumentRequest, DocumentFilter, LifecycleManager};
pub use service::{BulkReport, KnowledgeService, UploadItem, UploadReport};
pub use tenants::TenantRegistry;
