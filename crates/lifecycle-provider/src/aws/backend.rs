//! Operation backend contract
//!
//! The handler and poller only ever see this narrow start/query contract.
//! Each implementation translates it to one external asynchronous-job API and
//! normalizes what comes back into an [`OperationSnapshot`].

use crate::aws::agent::AgentBackend;
use crate::aws::codebuild::CodeBuildBackend;
use crate::aws::context::{AwsContext, FromAwsContext};
use crate::error::ProviderError;
use lifecycle_common::{OperationHandle, OperationKind, OperationSnapshot, StartRequest};
use tokio_util::sync::CancellationToken;

/// Trait for operation backends that can be mocked in tests.
///
/// Implementations hold no state between calls: one request in, one handle
/// or snapshot out. No batching, no internal retries.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait OperationBackend: Send + Sync {
    /// Kind of start request this backend accepts
    fn kind(&self) -> OperationKind;

    /// Begin exactly one external operation.
    ///
    /// Rejections surface as [`ProviderError::StartFailure`].
    async fn start_operation(&self, request: &StartRequest)
    -> Result<OperationHandle, ProviderError>;

    /// Snapshot the current state of an operation.
    ///
    /// Idempotent and side-effect free; safe to call any number of times for
    /// the same handle.
    async fn query_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationSnapshot, ProviderError>;
}

/// The backend selected by configuration
pub enum Backend {
    Build(CodeBuildBackend),
    Agent(AgentBackend),
}

impl Backend {
    /// Build the backend for `kind`. `cancel` aborts start-side waits.
    pub fn for_kind(kind: OperationKind, ctx: &AwsContext, cancel: CancellationToken) -> Self {
        match kind {
            OperationKind::Build => Backend::Build(CodeBuildBackend::from_context(ctx)),
            OperationKind::Agent => {
                Backend::Agent(AgentBackend::from_context(ctx).with_cancellation(cancel))
            }
        }
    }
}

impl OperationBackend for Backend {
    fn kind(&self) -> OperationKind {
        match self {
            Backend::Build(b) => b.kind(),
            Backend::Agent(b) => b.kind(),
        }
    }

    async fn start_operation(
        &self,
        request: &StartRequest,
    ) -> Result<OperationHandle, ProviderError> {
        match self {
            Backend::Build(b) => b.start_operation(request).await,
            Backend::Agent(b) => b.start_operation(request).await,
        }
    }

    async fn query_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationSnapshot, ProviderError> {
        match self {
            Backend::Build(b) => b.query_operation(handle).await,
            Backend::Agent(b) => b.query_operation(handle).await,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Backend").field(&self.kind()).finish()
    }
}
