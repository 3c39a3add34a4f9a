//! Lifecycle event fixtures
//!
//! Builders for the events the calling engine sends, shaped the way
//! CloudFormation's provider framework sends them.

use lifecycle_common::defaults::CONTINUATION_KEY;
use lifecycle_common::{LifecycleEvent, RequestType};
use serde_json::{Map, Value};

/// Convert a `json!({...})` literal into a property map.
///
/// Panics if `value` is not an object.
pub fn properties(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("properties must be a JSON object, got {}", other),
    }
}

/// An event with the envelope fields CloudFormation always sets
pub fn event(request_type: RequestType, props: Value) -> LifecycleEvent {
    let mut event = LifecycleEvent::new(request_type, properties(props));
    event.request_id = Some("00000000-0000-0000-0000-000000000000".to_string());
    event.stack_id =
        Some("arn:aws:cloudformation:us-east-1:123456789012:stack/test/00000000".to_string());
    event.logical_resource_id = Some("TestResource".to_string());
    event.resource_type = Some("Custom::Lifecycle".to_string());
    event
}

pub fn create_event(props: Value) -> LifecycleEvent {
    event(RequestType::Create, props)
}

pub fn delete_event(props: Value) -> LifecycleEvent {
    event(RequestType::Delete, props)
}

/// A poll event carrying `handle` as continuation data
pub fn poll_event(request_type: RequestType, handle: &str) -> LifecycleEvent {
    let mut data = Map::new();
    data.insert(CONTINUATION_KEY.to_string(), Value::String(handle.to_string()));
    event(request_type, Value::Object(Map::new())).with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_poll_event_carries_handle() {
        let event = poll_event(RequestType::Create, "build-42");
        assert_eq!(event.continuation_value(), Some(&json!("build-42")));
    }

    #[test]
    fn test_create_event_properties() {
        let event = create_event(json!({"ProjectName": "proj-1"}));
        assert_eq!(event.request_type, RequestType::Create);
        assert_eq!(event.resource_properties["ProjectName"], "proj-1");
        assert!(event.data.is_empty());
    }
}
