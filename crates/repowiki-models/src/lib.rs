//! Credential resolution and resilient multi-model routing
//!
//! [`ModelPool`] resolves named credentials from the external store into
//! cached chat-backend instances. [`RateLimiter`] classifies throttling
//! errors and computes cooldown windows. [`ModelSwitcher`] and
//! [`ProxyChatModel`] execute chat requests against the first available
//! credential and fail over when a backend gets rate-limited.

pub mod pool;
pub mod proxy;
pub mod rate_limit;
pub mod switcher;
pub mod task;

pub use pool::{BackendFactory, ModelHandle, ModelPool};
pub use proxy::ProxyChatModel;
pub use rate_limit::{is_rate_limit_error, parse_reset_time, RateLimiter, DEFAULT_COOLDOWN_SECS};
pub use switcher::ModelSwitcher;
pub use task::{current_task_id, with_task_id};
