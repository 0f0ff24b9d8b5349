use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::TokenUsage;

/// Lifecycle status of a model credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Enabled,
    Disabled,
    Unavailable,
}

/// A named, credentialed model backend definition.
///
/// Owned by the external credential store; the pool only caches instances
/// built from these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCredential {
    pub id: u64,
    pub name: String,
    pub provider: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub priority: i32,
    pub status: CredentialStatus,
    #[serde(default)]
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl ModelCredential {
    /// A credential is usable when enabled and any cooldown has passed.
    ///
    /// Availability is derived lazily: the stored status is not flipped back
    /// when the cooldown expires, the check here is what matters.
    pub fn is_available(&self) -> bool {
        if self.status == CredentialStatus::Disabled {
            return false;
        }
        match self.cooldown_until {
            Some(until) => until <= Utc::now(),
            None => self.status == CredentialStatus::Enabled,
        }
    }

    /// Masked key for display (first 3 and last 4 characters only)
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 7 {
            return "***".to_string();
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}***{tail}")
    }
}

/// External credential store over [`ModelCredential`]-shaped records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up one credential by name
    async fn get_by_name(&self, name: &str) -> Result<Option<ModelCredential>>;

    /// Look up credentials by name, preserving input order; unknown names are skipped
    async fn list_by_names(&self, names: &[String]) -> Result<Vec<ModelCredential>>;

    /// All stored credentials, in the store's priority order
    async fn list_all(&self) -> Result<Vec<ModelCredential>>;

    /// Persist a cooldown window for a credential
    async fn mark_unavailable(&self, id: u64, reset_at: DateTime<Utc>) -> Result<()>;

    /// Report a completed request against a credential
    async fn record_request(&self, id: u64, success: bool) -> Result<()>;
}

/// External sink for per-task token usage records
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record_usage(&self, task_id: u64, model: &str, usage: &TokenUsage) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(status: CredentialStatus, cooldown_until: Option<DateTime<Utc>>) -> ModelCredential {
        ModelCredential {
            id: 1,
            name: "primary".to_string(),
            provider: "openai".to_string(),
            base_url: "https://api.example.com/v1".to_string(),
            api_key: "sk-abcdef123456wxyz".to_string(),
            model: "gpt-4o".to_string(),
            priority: 0,
            status,
            cooldown_until,
        }
    }

    #[test]
    fn test_availability_lazy_rederivation() {
        let past = Utc::now() - Duration::minutes(5);
        let future = Utc::now() + Duration::minutes(5);

        assert!(credential(CredentialStatus::Enabled, None).is_available());
        assert!(!credential(CredentialStatus::Disabled, None).is_available());
        assert!(!credential(CredentialStatus::Unavailable, Some(future)).is_available());
        // Expired cooldown makes the credential usable again even though the
        // stored status still says unavailable.
        assert!(credential(CredentialStatus::Unavailable, Some(past)).is_available());
    }

    #[test]
    fn test_masked_key() {
        assert_eq!(credential(CredentialStatus::Enabled, None).masked_key(), "sk-***wxyz");

        let mut short = credential(CredentialStatus::Enabled, None);
        short.api_key = "sk-1234".to_string();
        assert_eq!(short.masked_key(), "***");
    }

    #[test]
    fn test_masked_key_multibyte() {
        let mut cred = credential(CredentialStatus::Enabled, None);
        cred.api_key = "sk-密钥密钥密钥wxyz".to_string();
        assert_eq!(cred.masked_key(), "sk-***wxyz");

        // byte length over the threshold, char length under it
        cred.api_key = "密钥密".to_string();
        assert_eq!(cred.masked_key(), "***");
    }
}
