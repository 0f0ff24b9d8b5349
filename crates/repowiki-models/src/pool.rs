use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use repowiki_types::{ChatBackend, CredentialStore, ModelCredential, ModelError};

/// Factory that instantiates a chat backend from a credential record.
///
/// The actual provider transport lives behind this seam; the pool only
/// caches what the factory returns.
pub trait BackendFactory: Send + Sync {
    fn create(&self, credential: &ModelCredential) -> Result<Arc<dyn ChatBackend>>;
}

/// An instantiated backend together with the credential it was built from
#[derive(Clone)]
pub struct ModelHandle {
    pub backend: Arc<dyn ChatBackend>,
    pub credential_name: String,
    pub credential_id: u64,
    pub model: String,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("credential_name", &self.credential_name)
            .field("credential_id", &self.credential_id)
            .field("model", &self.model)
            .finish()
    }
}

/// Read-through cache of instantiated chat backends keyed by credential name
pub struct ModelPool {
    store: Arc<dyn CredentialStore>,
    factory: Arc<dyn BackendFactory>,
    default_backend: Arc<dyn ChatBackend>,
    cache: RwLock<HashMap<String, Arc<ModelHandle>>>,
}

impl ModelPool {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        factory: Arc<dyn BackendFactory>,
        default_backend: Arc<dyn ChatBackend>,
    ) -> Self {
        Self { store, factory, default_backend, cache: RwLock::new(HashMap::new()) }
    }

    /// The statically configured fallback backend
    pub fn default_backend(&self) -> Arc<dyn ChatBackend> {
        Arc::clone(&self.default_backend)
    }

    /// Resolve one named backend.
    ///
    /// An empty name returns the default backend without consulting the
    /// credential store.
    pub async fn get_model(&self, name: &str) -> Result<Arc<dyn ChatBackend>> {
        if name.is_empty() {
            tracing::debug!("empty model name, using default backend");
            return Ok(self.default_backend());
        }

        if let Some(handle) = self.cache.read().get(name) {
            return Ok(Arc::clone(&handle.backend));
        }

        let credential = self
            .store
            .get_by_name(name)
            .await?
            .ok_or_else(|| ModelError::ApiKeyNotFound(name.to_string()))?;

        if !credential.is_available() {
            tracing::warn!(
                model = name,
                cooldown_until = ?credential.cooldown_until,
                "credential is not available"
            );
            return Err(ModelError::ModelUnavailable(name.to_string()).into());
        }

        let handle = self.instantiate(&credential)?;
        self.cache.write().insert(name.to_string(), Arc::clone(&handle));
        Ok(Arc::clone(&handle.backend))
    }

    /// Ordered pool of available backends for the given credential names.
    ///
    /// Unavailable or unresolvable entries are skipped silently; input order
    /// is preserved. An empty name list resolves every stored credential.
    /// Only a store-level failure propagates.
    pub async fn get_model_pool(&self, names: &[String]) -> Result<Vec<Arc<ModelHandle>>> {
        let credentials = if names.is_empty() {
            self.store.list_all().await?
        } else {
            self.store.list_by_names(names).await?
        };

        let mut models = Vec::with_capacity(credentials.len());
        for credential in &credentials {
            if !credential.is_available() {
                tracing::debug!(model = %credential.name, "skipping unavailable credential");
                continue;
            }

            if let Some(handle) = self.cache.read().get(&credential.name) {
                models.push(Arc::clone(handle));
                continue;
            }

            match self.instantiate(credential) {
                Ok(handle) => {
                    self.cache.write().insert(credential.name.clone(), Arc::clone(&handle));
                    models.push(handle);
                }
                Err(e) => {
                    tracing::error!(model = %credential.name, error = %e, "failed to instantiate backend");
                }
            }
        }

        tracing::debug!(requested = names.len(), available = models.len(), "resolved model pool");
        Ok(models)
    }

    /// Persist a cooldown for a credential and drop its cached instance
    pub async fn mark_model_unavailable(&self, name: &str, reset_at: DateTime<Utc>) -> Result<()> {
        let credential = self
            .store
            .get_by_name(name)
            .await?
            .ok_or_else(|| ModelError::ApiKeyNotFound(name.to_string()))?;

        self.store.mark_unavailable(credential.id, reset_at).await?;
        self.cache.write().remove(name);

        tracing::warn!(model = name, reset_at = %reset_at, "marked model unavailable");
        Ok(())
    }

    /// The pool entry following `current`; the first entry when `current` is
    /// not in the pool; `NoAvailableModel` when `current` is last.
    pub async fn get_next_model(
        &self,
        current: &str,
        pool_names: &[String],
    ) -> Result<Arc<ModelHandle>> {
        let models = self.get_model_pool(pool_names).await?;
        if models.is_empty() {
            return Err(ModelError::NoAvailableModel.into());
        }

        let current_index = models.iter().position(|m| m.credential_name == current);
        match current_index {
            None => Ok(Arc::clone(&models[0])),
            Some(i) if i + 1 < models.len() => Ok(Arc::clone(&models[i + 1])),
            Some(_) => Err(ModelError::NoAvailableModel.into()),
        }
    }

    /// Report a completed request against a credential; store failures are
    /// logged, never propagated
    pub async fn record_request(&self, credential_id: u64, success: bool) {
        if credential_id == 0 {
            return;
        }
        if let Err(e) = self.store.record_request(credential_id, success).await {
            tracing::warn!(credential_id, error = %e, "failed to record request");
        }
    }

    fn instantiate(&self, credential: &ModelCredential) -> Result<Arc<ModelHandle>> {
        let backend = self.factory.create(credential)?;
        Ok(Arc::new(ModelHandle {
            backend,
            credential_name: credential.name.clone(),
            credential_id: credential.id,
            model: credential.model.clone(),
        }))
    }
}
