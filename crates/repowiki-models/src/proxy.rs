use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use repowiki_types::{
    ChatBackend, ChatMessage, ChatResponse, MessageStream, ModelError, ToolDefinition, UsageSink,
};

use crate::pool::{ModelHandle, ModelPool};
use crate::rate_limit::{is_rate_limit_error, RateLimiter};
use crate::task::current_task_id;

/// Routing proxy implementing the chat-backend contract over a credential
/// pool.
///
/// Every call re-queries the available pool and executes against its first
/// entry. A rate-limited backend is marked unavailable and the error is
/// returned to the caller, whose next call sees the shrunken pool; the
/// retry loop therefore lives outside, bounded only by the pool emptying.
/// With no configured names an empty pool falls back to the static default
/// backend instead of failing.
pub struct ProxyChatModel {
    name: String,
    pool: Arc<ModelPool>,
    limiter: RateLimiter,
    model_names: Vec<String>,
    tools: RwLock<Vec<ToolDefinition>>,
    usage_sink: Option<Arc<dyn UsageSink>>,
}

impl ProxyChatModel {
    pub fn new(pool: Arc<ModelPool>, model_names: Vec<String>) -> Self {
        let name = if model_names.is_empty() {
            "proxy(default)".to_string()
        } else {
            format!("proxy({})", model_names.join(","))
        };
        let limiter = RateLimiter::new(Arc::clone(&pool));
        Self { name, pool, limiter, model_names, tools: RwLock::new(Vec::new()), usage_sink: None }
    }

    pub fn with_usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage_sink = Some(sink);
        self
    }

    /// Select the backend for this call, or fall back to the default when
    /// allowed
    async fn select(&self) -> Result<Selection> {
        let models = self.pool.get_model_pool(&self.model_names).await?;
        if let Some(current) = models.first().cloned() {
            tracing::debug!(model = %current.credential_name, "proxy selected pool model");
            return Ok(Selection::Pooled(current));
        }

        if self.model_names.is_empty() {
            tracing::warn!("no pool models available, falling back to default backend");
            return Ok(Selection::Fallback(self.pool.default_backend()));
        }

        Err(ModelError::NoAvailableModel.into())
    }

    fn bind_to(&self, backend: &dyn ChatBackend) {
        let tools = self.tools.read().clone();
        if tools.is_empty() {
            return;
        }
        if let Err(e) = backend.bind_tools(tools) {
            tracing::warn!(backend = backend.name(), error = %e, "failed to bind tools");
        }
    }

    async fn after_failure(&self, handle: &ModelHandle, err: &anyhow::Error) {
        if is_rate_limit_error(err) {
            self.limiter.handle_rate_limit(&handle.credential_name, err).await;
        }
    }

    async fn after_success(&self, handle: &ModelHandle, usage: Option<&repowiki_types::TokenUsage>) {
        if let Some(usage) = usage {
            match (current_task_id(), &self.usage_sink) {
                (Some(task_id), Some(sink)) => {
                    if let Err(e) = sink.record_usage(task_id, &handle.model, usage).await {
                        tracing::warn!(task_id, model = %handle.model, error = %e, "failed to record usage");
                    }
                }
                (None, Some(_)) => {
                    tracing::debug!("no task id on the call context, skipping usage record");
                }
                _ => {}
            }
        }
        self.pool.record_request(handle.credential_id, true).await;
    }
}

enum Selection {
    Pooled(Arc<ModelHandle>),
    Fallback(Arc<dyn ChatBackend>),
}

#[async_trait]
impl ChatBackend for ProxyChatModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        match self.select().await? {
            Selection::Fallback(backend) => {
                self.bind_to(&*backend);
                backend.generate(messages).await
            }
            Selection::Pooled(current) => {
                self.bind_to(&*current.backend);
                match current.backend.generate(messages).await {
                    Ok(response) => {
                        self.after_success(&current, response.usage.as_ref()).await;
                        Ok(response)
                    }
                    Err(e) => {
                        self.after_failure(&current, &e).await;
                        Err(e)
                    }
                }
            }
        }
    }

    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<MessageStream> {
        match self.select().await? {
            Selection::Fallback(backend) => {
                self.bind_to(&*backend);
                backend.stream(messages).await
            }
            Selection::Pooled(current) => {
                self.bind_to(&*current.backend);
                match current.backend.stream(messages).await {
                    Ok(stream) => {
                        self.pool.record_request(current.credential_id, true).await;
                        Ok(stream)
                    }
                    Err(e) => {
                        self.after_failure(&current, &e).await;
                        Err(e)
                    }
                }
            }
        }
    }

    fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Result<()> {
        *self.tools.write() = tools;
        Ok(())
    }
}
