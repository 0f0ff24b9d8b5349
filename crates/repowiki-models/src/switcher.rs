use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use repowiki_types::ModelError;

use crate::pool::{ModelHandle, ModelPool};
use crate::rate_limit::{is_rate_limit_error, RateLimiter};

const MAX_RETRIES: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Bounded-retry execution against a pool of credentialed backends.
///
/// Each attempt re-queries the available pool and takes its first entry, so
/// a credential marked unavailable by a previous attempt is excluded from
/// the next one.
pub struct ModelSwitcher {
    pool: Arc<ModelPool>,
    limiter: RateLimiter,
    max_retries: u32,
}

impl ModelSwitcher {
    pub fn new(pool: Arc<ModelPool>) -> Self {
        let limiter = RateLimiter::new(Arc::clone(&pool));
        Self { pool, limiter, max_retries: MAX_RETRIES }
    }

    /// Run `call` against the first available backend, failing over on
    /// rate-limit errors.
    ///
    /// Rate-limit errors mark the credential and retry with the refreshed
    /// pool; any other error propagates immediately. An empty pool fails
    /// with `NoAvailableModel`, exhausted retries with
    /// `AllModelsUnavailable`.
    pub async fn call_with_retry<T, F, Fut>(&self, pool_names: &[String], call: F) -> Result<T>
    where
        F: Fn(Arc<ModelHandle>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for attempt in 0..self.max_retries {
            tracing::debug!(attempt = attempt + 1, max = self.max_retries, "selecting model");

            let models = self.pool.get_model_pool(pool_names).await?;
            let Some(current) = models.first().cloned() else {
                tracing::error!("no available models in pool");
                return Err(ModelError::NoAvailableModel.into());
            };

            tracing::debug!(model = %current.credential_name, "executing request");
            match call(Arc::clone(&current)).await {
                Ok(result) => {
                    self.pool.record_request(current.credential_id, true).await;
                    return Ok(result);
                }
                Err(e) if is_rate_limit_error(&e) => {
                    self.limiter.handle_rate_limit(&current.credential_name, &e).await;

                    if attempt + 1 < self.max_retries {
                        tracing::info!(model = %current.credential_name, "retrying with next model");
                        tokio::time::sleep(RETRY_PAUSE).await;
                        continue;
                    }
                    return Err(ModelError::AllModelsUnavailable.into());
                }
                Err(e) => return Err(e),
            }
        }

        Err(ModelError::MaxRetriesExceeded.into())
    }
}
