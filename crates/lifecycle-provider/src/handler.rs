//! On-event handler
//!
//! Create and Update start exactly one external operation and hand its
//! identifier back to the engine as continuation data. Delete does nothing:
//! operations already in flight are left to run to completion.

use crate::aws::OperationBackend;
use crate::error::ProviderError;
use lifecycle_common::{HandlerResult, LifecycleEvent, RequestType, StartRequest};
use tracing::info;

/// Handle one lifecycle event
pub async fn on_event<B: OperationBackend>(
    backend: &B,
    event: &LifecycleEvent,
) -> Result<HandlerResult, ProviderError> {
    match event.request_type {
        RequestType::Delete => {
            info!(
                logical_id = ?event.logical_resource_id,
                physical_id = ?event.physical_resource_id,
                "Delete requested, nothing to start"
            );
            Ok(HandlerResult::empty())
        }
        RequestType::Create | RequestType::Update => {
            let request = StartRequest::from_properties(backend.kind(), &event.resource_properties)?;

            info!(
                request_type = %event.request_type,
                kind = %request.kind(),
                identifier = %request.identifier(),
                "Starting operation"
            );

            let handle = backend.start_operation(&request).await?;

            info!(handle = %handle, "Operation started");
            Ok(HandlerResult::started(&handle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::backend::MockOperationBackend;
    use crate::aws::error::AwsError;
    use lifecycle_common::{OperationHandle, OperationKind};
    use serde_json::{Map, Value, json};

    fn props(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("properties must be an object"),
        }
    }

    fn build_backend() -> MockOperationBackend {
        let mut backend = MockOperationBackend::new();
        backend.expect_kind().return_const(OperationKind::Build);
        backend
    }

    #[tokio::test]
    async fn test_delete_returns_empty_without_backend_calls() {
        let mut backend = MockOperationBackend::new();
        backend.expect_kind().never();
        backend.expect_start_operation().never();
        backend.expect_query_operation().never();

        let event = LifecycleEvent::new(RequestType::Delete, props(json!({"ProjectName": "proj-1"})));
        let result = on_event(&backend, &event).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_create_returns_handle() {
        let mut backend = build_backend();
        backend
            .expect_start_operation()
            .times(1)
            .withf(|request| request.identifier() == "proj-1")
            .returning(|_| Ok(OperationHandle::new("build-42").unwrap()));

        let event = LifecycleEvent::new(RequestType::Create, props(json!({"ProjectName": "proj-1"})));
        let result = on_event(&backend, &event).await.unwrap();

        assert_eq!(result.handle(), Some("build-42"));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"Data": {"handle": "build-42"}})
        );
    }

    #[tokio::test]
    async fn test_update_starts_a_new_operation() {
        let mut backend = build_backend();
        backend
            .expect_start_operation()
            .times(1)
            .returning(|_| Ok(OperationHandle::new("proj-1:build-43").unwrap()));

        let event = LifecycleEvent::new(
            RequestType::Update,
            props(json!({"ProjectName": "proj-1", "SourceVersion": "refs/heads/main"})),
        );
        let result = on_event(&backend, &event).await.unwrap();
        assert_eq!(result.handle(), Some("proj-1:build-43"));
    }

    #[tokio::test]
    async fn test_invalid_properties_never_reach_backend() {
        let mut backend = build_backend();
        backend.expect_start_operation().never();

        let event = LifecycleEvent::new(RequestType::Create, props(json!({"Project": "proj-1"})));
        let err = on_event(&backend, &event).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidProperties(_)));
    }

    #[tokio::test]
    async fn test_start_failure_propagates() {
        let mut backend = build_backend();
        backend.expect_start_operation().times(1).returning(|_| {
            Err(ProviderError::StartFailure {
                identifier: "proj-1".to_string(),
                source: AwsError::NotFound {
                    message: "Project cannot be found".to_string(),
                },
            })
        });

        let event = LifecycleEvent::new(RequestType::Create, props(json!({"ProjectName": "proj-1"})));
        let err = on_event(&backend, &event).await.unwrap_err();
        assert!(matches!(err, ProviderError::StartFailure { .. }));
    }
}
