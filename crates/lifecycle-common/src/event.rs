//! Lifecycle events and handler results
//!
//! The calling engine (CloudFormation's provider framework, or anything that
//! speaks the same contract) sends a [`LifecycleEvent`] to the on-event
//! handler once, then re-sends it together with the handler's continuation
//! data to the completion poller until the poller reports completion.
//!
//! Keys use CloudFormation's PascalCase on the wire:
//!
//! ```json
//! {
//!   "RequestType": "Create",
//!   "ResourceProperties": { "ProjectName": "proj-1" },
//!   "Data": { "handle": "proj-1:build-42" }
//! }
//! ```

use crate::defaults::CONTINUATION_KEY;
use crate::handle::OperationHandle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the engine wants done to the resource
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A resource lifecycle notification from the calling engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,

    /// Declared properties of the resource
    #[serde(default)]
    pub resource_properties: Map<String, Value>,

    /// Continuation data returned by the on-event handler (poll calls only)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl LifecycleEvent {
    pub fn new(request_type: RequestType, resource_properties: Map<String, Value>) -> Self {
        Self {
            request_type,
            resource_properties,
            data: Map::new(),
            request_id: None,
            stack_id: None,
            logical_resource_id: None,
            physical_resource_id: None,
            resource_type: None,
        }
    }

    /// Attach the continuation data returned by the on-event handler.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Raw continuation handle value, if the engine passed one back.
    pub fn continuation_value(&self) -> Option<&Value> {
        self.data.get(CONTINUATION_KEY)
    }
}

/// Result of the on-event handler
///
/// Serializes to `{}` for deletions and `{"Data": {"handle": ...}}` when an
/// operation was started.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HandlerResult {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl HandlerResult {
    /// Result for a request that needs no external operation
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result carrying the continuation token for a started operation
    pub fn started(handle: &OperationHandle) -> Self {
        let mut data = Map::new();
        data.insert(
            CONTINUATION_KEY.to_string(),
            Value::String(handle.to_string()),
        );
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Handle stored in the continuation data, if any.
    pub fn handle(&self) -> Option<&str> {
        self.data.get(CONTINUATION_KEY).and_then(Value::as_str)
    }
}

/// Result of one completion poll
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PollResult {
    pub is_complete: bool,

    /// Success attributes, only present once complete
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl PollResult {
    pub fn incomplete() -> Self {
        Self::default()
    }

    pub fn complete() -> Self {
        Self {
            is_complete: true,
            data: Map::new(),
        }
    }

    pub fn complete_with(data: Map<String, Value>) -> Self {
        Self {
            is_complete: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cloudformation_event() {
        let event: LifecycleEvent = serde_json::from_value(json!({
            "RequestType": "Update",
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:provider",
            "RequestId": "req-1",
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/demo/abc",
            "LogicalResourceId": "FrontendBuild",
            "ResourceType": "Custom::BuildRunner",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:provider",
                "ProjectName": "proj-1"
            }
        }))
        .unwrap();

        assert_eq!(event.request_type, RequestType::Update);
        assert_eq!(event.resource_properties["ProjectName"], "proj-1");
        assert_eq!(event.logical_resource_id.as_deref(), Some("FrontendBuild"));
        assert!(event.data.is_empty());
        assert!(event.continuation_value().is_none());
    }

    #[test]
    fn test_unknown_request_type_rejected() {
        let err = serde_json::from_value::<LifecycleEvent>(json!({
            "RequestType": "Rollback",
            "ResourceProperties": {}
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_handler_result_serializes_to_empty_object() {
        assert_eq!(serde_json::to_value(HandlerResult::empty()).unwrap(), json!({}));
    }

    #[test]
    fn test_started_handler_result_shape() {
        let handle = OperationHandle::new("build-42").unwrap();
        let result = HandlerResult::started(&handle);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "Data": { "handle": "build-42" } })
        );
        assert_eq!(result.handle(), Some("build-42"));
    }

    #[test]
    fn test_poll_result_shape() {
        assert_eq!(
            serde_json::to_value(PollResult::incomplete()).unwrap(),
            json!({ "IsComplete": false })
        );
        assert_eq!(
            serde_json::to_value(PollResult::complete()).unwrap(),
            json!({ "IsComplete": true })
        );
    }
}
