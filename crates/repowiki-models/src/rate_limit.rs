use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use regex::Regex;

use crate::pool::ModelPool;

/// Default cooldown applied when a rate-limit error carries no parsable
/// reset time. One policy for every call site.
pub const DEFAULT_COOLDOWN_SECS: i64 = 120;

const RATE_LIMIT_KEYWORDS: &[&str] = &[
    "429",
    "rate limit",
    "quota exceeded",
    "too many requests",
    "rate-limited",
    "request rate exceeded",
    "请求次数超过限制",
    "超过限制",
    "每分钟请求次数",
];

/// Heuristic classification of an error as a rate-limit error.
///
/// Substring matching over the error text can misfire (a "429" appearing as
/// an unrelated number); the occasional false positive only costs one
/// needless cooldown.
pub fn is_rate_limit_error(err: &anyhow::Error) -> bool {
    is_rate_limit_message(&err.to_string())
}

pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Extract a reset instant from an error message.
///
/// Relative forms ("Try again in 60s", "Retry after 2m") win over absolute
/// timestamps ("Reset at 2026-02-04 12:00:00", RFC3339-style). Returns
/// `None` when nothing matches.
pub fn parse_reset_time(err: &anyhow::Error) -> Option<DateTime<Utc>> {
    parse_reset_message(&err.to_string())
}

pub fn parse_reset_message(message: &str) -> Option<DateTime<Utc>> {
    let relative = Regex::new(r"(?:Try again in|Retry after) (\d+)([smh])").ok()?;
    if let Some(caps) = relative.captures(message) {
        let magnitude: i64 = caps[1].parse().ok()?;
        let duration = match &caps[2] {
            "s" => Duration::seconds(magnitude),
            "m" => Duration::minutes(magnitude),
            _ => Duration::hours(magnitude),
        };
        return Some(Utc::now() + duration);
    }

    let absolute = Regex::new(r"Reset at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})").ok()?;
    if let Some(caps) = absolute.captures(message) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S") {
            return Some(naive.and_utc());
        }
    }

    let rfc3339ish = Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})").ok()?;
    if let Some(caps) = rfc3339ish.captures(message) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%dT%H:%M:%S") {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Applies cooldowns to rate-limited credentials through the pool
pub struct RateLimiter {
    pool: Arc<ModelPool>,
    default_cooldown: Duration,
}

impl RateLimiter {
    pub fn new(pool: Arc<ModelPool>) -> Self {
        Self { pool, default_cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECS) }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.default_cooldown = cooldown;
        self
    }

    /// Compute a reset instant for the error and mark the credential
    /// unavailable until then. The caller keeps the original error and
    /// decides how to proceed; a failure to persist the mark is logged only.
    pub async fn handle_rate_limit(&self, model_name: &str, err: &anyhow::Error) {
        tracing::warn!(model = model_name, error = %err, "rate limit hit");

        let reset_at =
            parse_reset_time(err).unwrap_or_else(|| Utc::now() + self.default_cooldown);

        if let Err(mark_err) = self.pool.mark_model_unavailable(model_name, reset_at).await {
            tracing::error!(model = model_name, error = %mark_err, "failed to mark model unavailable");
        }
    }
}
