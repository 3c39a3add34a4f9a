//! Stage records and backend status snapshots

use crate::status::{OperationStatus, StageStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named sub-step of an operation with its own status and diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    /// Diagnostic messages, one per failed step within the stage
    #[serde(default)]
    pub messages: Vec<String>,
}

impl StageRecord {
    pub fn new(name: impl Into<String>, status: StageStatus) -> Self {
        Self {
            name: name.into(),
            status,
            messages: Vec::new(),
        }
    }

    /// Attach diagnostic messages, dropping blank ones.
    pub fn with_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages.extend(
            messages
                .into_iter()
                .map(Into::into)
                .filter(|m| !m.trim().is_empty()),
        );
        self
    }
}

/// Point-in-time view of an operation as reported by its backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationSnapshot {
    pub status: OperationStatus,
    /// Ordered stage records; only consulted when `status` is `Failed`
    #[serde(default)]
    pub stages: Vec<StageRecord>,
    /// Normalized success attributes returned to the calling engine
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub outputs: Map<String, Value>,
}

impl OperationSnapshot {
    pub fn new(status: OperationStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_stages(mut self, stages: Vec<StageRecord>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_messages_dropped() {
        let stage = StageRecord::new("BUILD", StageStatus::Failed).with_messages([
            "",
            "COMMAND_EXECUTION_ERROR: exit status 1",
            "  ",
        ]);
        assert_eq!(stage.messages, vec!["COMMAND_EXECUTION_ERROR: exit status 1"]);
    }

    #[test]
    fn test_snapshot_outputs_omitted_when_empty() {
        let json = serde_json::to_value(OperationSnapshot::new(OperationStatus::InProgress)).unwrap();
        assert!(json.get("outputs").is_none());

        let json = serde_json::to_value(
            OperationSnapshot::new(OperationStatus::Succeeded).with_output("BuildId", "b-1"),
        )
        .unwrap();
        assert_eq!(json["outputs"]["BuildId"], "b-1");
    }
}
