//! Opaque operation handle

use serde::{Deserialize, Serialize};

/// Strongly-typed handle identifying one in-flight external operation
/// (a CodeBuild build id, a Bedrock agent id).
///
/// The newtype keeps handles from being mixed up with other identifiers and
/// guarantees the wrapped value is non-empty.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
)]
#[serde(try_from = "String", into = "String")]
pub struct OperationHandle(String);

/// Returned when an empty string is used as a handle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operation handle cannot be empty")]
pub struct EmptyHandle;

impl OperationHandle {
    /// Wrap a backend identifier, rejecting empty values.
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyHandle> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EmptyHandle);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OperationHandle {
    type Error = EmptyHandle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OperationHandle> for String {
    fn from(handle: OperationHandle) -> Self {
        handle.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert_eq!(OperationHandle::new(""), Err(EmptyHandle));
        assert_eq!(OperationHandle::new("   "), Err(EmptyHandle));
    }

    #[test]
    fn test_display_and_deref() {
        let handle = OperationHandle::new("proj-1:build-42").unwrap();
        assert_eq!(handle.to_string(), "proj-1:build-42");
        assert!(handle.starts_with("proj-1"));
    }

    #[test]
    fn test_serde_rejects_empty_string() {
        let err = serde_json::from_str::<OperationHandle>("\"\"");
        assert!(err.is_err());

        let handle: OperationHandle = serde_json::from_str("\"build-42\"").unwrap();
        assert_eq!(handle.as_str(), "build-42");
    }
}
