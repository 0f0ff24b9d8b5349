use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use repowiki_models::BackendFactory;
use repowiki_types::{
    ChatBackend, ChatMessage, ChatResponse, CredentialStatus, CredentialStore, ModelCredential,
    TokenUsage, ToolDefinition, UsageSink,
};

pub fn credential(id: u64, name: &str) -> ModelCredential {
    ModelCredential {
        id,
        name: name.to_string(),
        provider: "openai".to_string(),
        base_url: "https://api.example.com/v1".to_string(),
        api_key: format!("sk-{name}-0123456789"),
        model: format!("{name}-model"),
        priority: 0,
        status: CredentialStatus::Enabled,
        cooldown_until: None,
    }
}

/// In-memory credential store.
///
/// `apply_marks` controls whether `mark_unavailable` actually sets the
/// cooldown on the stored record; with it off the store behaves like one
/// whose cooldown has already lapsed, which keeps the pool non-empty for
/// retry-exhaustion tests.
pub struct MockStore {
    pub credentials: Mutex<Vec<ModelCredential>>,
    pub marks: Mutex<Vec<(u64, DateTime<Utc>)>>,
    pub requests: Mutex<Vec<(u64, bool)>>,
    pub lookups: AtomicUsize,
    pub apply_marks: bool,
}

impl MockStore {
    pub fn new(credentials: Vec<ModelCredential>) -> Self {
        Self {
            credentials: Mutex::new(credentials),
            marks: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            apply_marks: true,
        }
    }

    pub fn without_applied_marks(mut self) -> Self {
        self.apply_marks = false;
        self
    }
}

#[async_trait]
impl CredentialStore for MockStore {
    async fn get_by_name(&self, name: &str) -> Result<Option<ModelCredential>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.credentials.lock().iter().find(|c| c.name == name).cloned())
    }

    async fn list_by_names(&self, names: &[String]) -> Result<Vec<ModelCredential>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let credentials = self.credentials.lock();
        Ok(names
            .iter()
            .filter_map(|name| credentials.iter().find(|c| &c.name == name).cloned())
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ModelCredential>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.credentials.lock().clone())
    }

    async fn mark_unavailable(&self, id: u64, reset_at: DateTime<Utc>) -> Result<()> {
        self.marks.lock().push((id, reset_at));
        if self.apply_marks {
            let mut credentials = self.credentials.lock();
            if let Some(c) = credentials.iter_mut().find(|c| c.id == id) {
                c.status = CredentialStatus::Unavailable;
                c.cooldown_until = Some(reset_at);
            }
        }
        Ok(())
    }

    async fn record_request(&self, id: u64, success: bool) -> Result<()> {
        self.requests.lock().push((id, success));
        Ok(())
    }
}

/// Backend with canned behavior, recording what gets bound to it
pub struct StaticBackend {
    name: String,
    pub fail_with: Option<String>,
    pub bound_tools: Mutex<Vec<ToolDefinition>>,
    pub calls: AtomicUsize,
}

impl StaticBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail_with: None,
            bound_tools: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        let mut backend = Self::new(name);
        backend.fail_with = Some(message.to_string());
        backend
    }
}

#[async_trait]
impl ChatBackend for StaticBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(anyhow::anyhow!("{message}"));
        }
        Ok(ChatResponse {
            message: ChatMessage::assistant(format!("{}-reply", self.name)),
            usage: Some(TokenUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }),
        })
    }

    fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Result<()> {
        *self.bound_tools.lock() = tools;
        Ok(())
    }
}

/// Factory that hands out `StaticBackend`s and keeps them inspectable
pub struct MockFactory {
    pub fail_generate_with: Option<String>,
    pub created: Mutex<Vec<Arc<StaticBackend>>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self { fail_generate_with: None, created: Mutex::new(Vec::new()) }
    }

    pub fn rate_limited(message: &str) -> Self {
        Self { fail_generate_with: Some(message.to_string()), created: Mutex::new(Vec::new()) }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl BackendFactory for MockFactory {
    fn create(&self, credential: &ModelCredential) -> Result<Arc<dyn ChatBackend>> {
        let backend = Arc::new(match &self.fail_generate_with {
            Some(message) => StaticBackend::failing(&credential.name, message),
            None => StaticBackend::new(&credential.name),
        });
        self.created.lock().push(Arc::clone(&backend));
        Ok(backend)
    }
}

/// Usage sink recording every forwarded record
#[derive(Default)]
pub struct MockSink {
    pub records: Mutex<Vec<(u64, String, u32)>>,
}

#[async_trait]
impl UsageSink for MockSink {
    async fn record_usage(&self, task_id: u64, model: &str, usage: &TokenUsage) -> Result<()> {
        self.records.lock().push((task_id, model.to_string(), usage.total_tokens));
        Ok(())
    }
}
