//! Resource lifecycle provider
//!
//! Binds the on-event handler and the completion poller to one backend and
//! declares what deployment tooling needs to host them: invocation limits
//! and the privilege set. Unset limits fall back to fixed defaults; there is
//! no other logic here.

use crate::aws::OperationBackend;
use crate::error::ProviderError;
use crate::policy::PolicyDocument;
use crate::{handler, poller};
use garde::Validate;
use lifecycle_common::defaults::{
    DEFAULT_LOG_RETENTION_DAYS, DEFAULT_MEMORY_MB, DEFAULT_QUERY_INTERVAL, DEFAULT_TIMEOUT,
    DEFAULT_TOTAL_TIMEOUT,
};
use lifecycle_common::{HandlerResult, LifecycleEvent, OperationKind, PollResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest invocation Lambda allows
const MAX_HANDLER_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Invocation settings; `None` means "use the default"
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProviderConfig {
    /// Per-invocation timeout for both handlers
    #[garde(custom(within_handler_limit))]
    pub timeout: Option<Duration>,

    /// Memory for both handlers, in MiB
    #[garde(range(min = 128, max = 10240))]
    pub memory_mb: Option<u32>,

    /// How often the engine should call the poller
    #[garde(skip)]
    pub query_interval: Option<Duration>,

    /// How long the engine should keep polling before giving up
    #[garde(skip)]
    pub total_timeout: Option<Duration>,

    #[garde(range(min = 1))]
    pub log_retention_days: Option<u32>,
}

fn within_handler_limit(value: &Option<Duration>, _ctx: &()) -> garde::Result {
    match value {
        Some(t) if t.is_zero() => Err(garde::Error::new("timeout must be positive")),
        Some(t) if *t > MAX_HANDLER_TIMEOUT => Err(garde::Error::new(format!(
            "timeout must not exceed {}s",
            MAX_HANDLER_TIMEOUT.as_secs()
        ))),
        _ => Ok(()),
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn memory_mb(&self) -> u32 {
        self.memory_mb.unwrap_or(DEFAULT_MEMORY_MB)
    }

    pub fn query_interval(&self) -> Duration {
        self.query_interval.unwrap_or(DEFAULT_QUERY_INTERVAL)
    }

    pub fn total_timeout(&self) -> Duration {
        self.total_timeout.unwrap_or(DEFAULT_TOTAL_TIMEOUT)
    }

    pub fn log_retention_days(&self) -> u32 {
        self.log_retention_days.unwrap_or(DEFAULT_LOG_RETENTION_DAYS)
    }
}

/// Limits for one handler function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HandlerLimits {
    pub timeout_secs: u64,
    pub memory_mb: u32,
}

/// Everything deployment tooling needs to host a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderManifest {
    pub kind: OperationKind,
    pub on_event: HandlerLimits,
    pub is_complete: HandlerLimits,
    pub query_interval_secs: u64,
    pub total_timeout_secs: u64,
    pub log_retention_days: u32,
    pub policy: PolicyDocument,
}

impl ProviderManifest {
    pub fn new(kind: OperationKind, config: &ProviderConfig) -> Self {
        let limits = HandlerLimits {
            timeout_secs: config.timeout().as_secs(),
            memory_mb: config.memory_mb(),
        };
        Self {
            kind,
            on_event: limits.clone(),
            is_complete: limits,
            query_interval_secs: config.query_interval().as_secs(),
            total_timeout_secs: config.total_timeout().as_secs(),
            log_retention_days: config.log_retention_days(),
            policy: PolicyDocument::for_kind(kind),
        }
    }
}

/// A handler/poller pair bound to one backend
#[derive(Debug)]
pub struct ResourceLifecycleProvider<B> {
    backend: B,
    config: ProviderConfig,
}

impl<B: OperationBackend> ResourceLifecycleProvider<B> {
    pub fn new(backend: B, config: ProviderConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub async fn on_event(&self, event: &LifecycleEvent) -> Result<HandlerResult, ProviderError> {
        handler::on_event(&self.backend, event).await
    }

    pub async fn is_complete(&self, event: &LifecycleEvent) -> Result<PollResult, ProviderError> {
        poller::is_complete(&self.backend, event).await
    }

    pub fn manifest(&self) -> ProviderManifest {
        ProviderManifest::new(self.backend.kind(), &self.config)
    }
}
