//! Completion poller
//!
//! Each call makes at most one status query and answers immediately. The
//! engine owns the cadence: it keeps calling with the same continuation data
//! until this reports completion, raises, or its own total timeout expires.

use crate::aws::OperationBackend;
use crate::error::ProviderError;
use lifecycle_common::{
    LifecycleEvent, OperationHandle, OperationSnapshot, OperationStatus, PollResult, RequestType,
    StageRecord,
};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Message used when a failed operation carries nothing to point at
pub const NO_DIAGNOSTIC_MESSAGE: &str = "operation failed without diagnostic detail";

/// Decide whether the operation behind `event` has finished
pub async fn is_complete<B: OperationBackend>(
    backend: &B,
    event: &LifecycleEvent,
) -> Result<PollResult, ProviderError> {
    if event.request_type == RequestType::Delete {
        debug!("Delete is complete immediately");
        return Ok(PollResult::complete());
    }

    let handle = continuation_handle(event)?;
    let snapshot = backend.query_operation(&handle).await?;

    match snapshot.status {
        OperationStatus::Pending | OperationStatus::InProgress => {
            debug!(handle = %handle, status = %snapshot.status, "Operation not finished");
            Ok(PollResult::incomplete())
        }
        OperationStatus::Succeeded => {
            info!(handle = %handle, "Operation succeeded");
            Ok(PollResult::complete_with(snapshot.outputs))
        }
        OperationStatus::Failed => {
            let message = failure_message(&snapshot);
            warn!(handle = %handle, error = %message, "Operation failed");
            Err(ProviderError::OperationFailed { message })
        }
    }
}

/// Extract the handle the on-event handler stored in the continuation data
fn continuation_handle(event: &LifecycleEvent) -> Result<OperationHandle, ProviderError> {
    match event.continuation_value() {
        None => Err(ProviderError::malformed("continuation data has no handle")),
        Some(Value::String(s)) => OperationHandle::new(s.as_str())
            .map_err(|_| ProviderError::malformed("continuation handle is empty")),
        Some(other) => Err(ProviderError::malformed(format!(
            "continuation handle must be a string, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Diagnostic for a failed operation.
///
/// The first stage that did not succeed is blamed, even when later stages
/// failed too.
pub fn failure_message(snapshot: &OperationSnapshot) -> String {
    match first_failed_stage(&snapshot.stages) {
        Some(stage) if !stage.messages.is_empty() => stage.messages.join("\n"),
        Some(stage) => format!("stage {} ended with status {}", stage.name, stage.status),
        None => NO_DIAGNOSTIC_MESSAGE.to_string(),
    }
}

fn first_failed_stage(stages: &[StageRecord]) -> Option<&StageRecord> {
    stages.iter().find(|stage| !stage.status.is_succeeded())
}
