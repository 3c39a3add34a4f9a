//! Provider error taxonomy
//!
//! Every failure path of the handler and poller ends in one of these
//! variants. None of them is recovered locally: retry cadence, backoff and
//! giving up belong to the calling engine.

use crate::aws::error::AwsError;
use lifecycle_common::{OperationKind, PropertiesError};
use thiserror::Error;

/// Errors surfaced to the calling engine
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Resource properties failed schema validation
    #[error(transparent)]
    InvalidProperties(#[from] PropertiesError),

    /// Start request built for a different backend
    #[error("{backend} backend cannot start operation of kind {requested}")]
    KindMismatch {
        backend: OperationKind,
        requested: OperationKind,
    },

    /// Backend rejected the start request
    #[error("failed to start operation for '{identifier}': {source}")]
    StartFailure {
        identifier: String,
        #[source]
        source: AwsError,
    },

    /// Poll invoked without a usable handle in the continuation data
    #[error("malformed continuation token: {reason}")]
    MalformedContinuationToken { reason: String },

    /// Backend has no record of the handle
    #[error("operation '{handle}' not found")]
    OperationNotFound { handle: String },

    /// Backend reports terminal failure; message holds aggregated diagnostics
    #[error("{message}")]
    OperationFailed { message: String },

    /// Status query failed in transport or at the API
    #[error("backend unavailable while querying '{handle}': {source}")]
    BackendUnavailable {
        handle: String,
        #[source]
        source: AwsError,
    },
}

impl ProviderError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedContinuationToken {
            reason: reason.into(),
        }
    }

    pub fn start_failure(identifier: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::StartFailure {
            identifier: identifier.into(),
            source: crate::aws::error::classify_anyhow_error(error),
        }
    }

    pub fn backend_unavailable(handle: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::BackendUnavailable {
            handle: handle.into(),
            source: crate::aws::error::classify_anyhow_error(error),
        }
    }

    /// Whether the engine may reasonably try the same call again later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::BackendUnavailable { source, .. } | Self::StartFailure { source, .. } => {
                source.is_retryable()
            }
            _ => false,
        }
    }

    /// User-facing hint for resolving the error, if one is known
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::BackendUnavailable { source, .. } | Self::StartFailure { source, .. } => {
                source.suggestion()
            }
            _ => None,
        }
    }
}
