//! Tenant registry.
//!
//! Each tenant key maps to its own [`KnowledgeService`] with a private
//! content store, repositories, and index. Nothing is shared between
//! tenants; quota and search state are fully independent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use scriven_core::{GenerationBackend, NoOpActivitySink};
use scriven_store::{MemoryContentStore, MemoryDocumentRepository, MemoryGeneratedRepository};

use crate::config::ServiceConfig;
use crate::service::KnowledgeService;

/// Lazily materializes one isolated service per tenant key.
#[derive(Clone)]
pub struct TenantRegistry {
    config: ServiceConfig,
    backend: Arc<dyn GenerationBackend>,
    model: String,
    tenants: Arc<RwLock<HashMap<String, KnowledgeService>>>,
}

impl TenantRegistry {
    /// All tenants created through [`Self::get_or_create`] share this
    /// config and generation backend, but nothing else.
    pub fn new(
        config: ServiceConfig,
        backend: Arc<dyn GenerationBackend>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            config,
            backend,
            model: model.into(),
            tenants: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up an existing tenant's service.
    pub async fn get(&self, tenant: &str) -> Option<KnowledgeService> {
        self.tenants.read().await.get(tenant).cloned()
    }

    /// Fetch the tenant's service, creating a memory-backed one on
    /// first use.
    pub async fn get_or_create(&self, tenant: &str) -> KnowledgeService {
        if let Some(service) = self.get(tenant).await {
            return service;
        }
        let mut tenants = self.tenants.write().await;
        // Lost the race between read and write; take the winner's.
        if let Some(service) = tenants.get(tenant) {
            return service.clone();
        }
        info!(tenant, "provisioning tenant service");
        let service = KnowledgeService::new(
            self.config.clone(),
            Arc::new(MemoryContentStore::new(self.config.quota_bytes)),
            Arc::new(MemoryDocumentRepository::new()),
            Arc::new(MemoryGeneratedRepository::new()),
            Arc::new(NoOpActivitySink),
            self.backend.clone(),
            self.model.clone(),
        );
        tenants.insert(tenant.to_string(), service.clone());
        service
    }

    /// Install a custom-wired service for a tenant (persistent store,
    /// real activity sink). Replaces any existing instance.
    pub async fn register(&self, tenant: &str, service: KnowledgeService) {
        self.tenants
            .write()
            .await
            .insert(tenant.to_string(), service);
    }

    /// Drop a tenant's service. Returns whether it existed.
    pub async fn remove(&self, tenant: &str) -> bool {
        self.tenants.write().await.remove(tenant).is_some()
    }

    pub async fn tenant_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.tenants.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
