//! Canonical status codes for external operations and their stages
//!
//! Backends report status as loosely-typed strings (`IN_PROGRESS`,
//! `SUCCEEDED`, `TIMED_OUT`, ...). These enums normalize them so the
//! completion poller can classify a snapshot without string matching.

use serde::{Deserialize, Serialize};

/// Normalized status of one external operation
///
/// Derived from the backend's snapshot on every poll and never cached.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationStatus {
    /// Accepted by the backend but not yet running
    #[default]
    Pending,
    /// Currently running
    InProgress,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
}

/// Status of a single stage within an operation
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
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive, serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Fault,
    TimedOut,
    Stopped,
    InProgress,
    /// Anything the backend reports that we do not recognize
    Unknown,
}

impl StageStatus {
    /// Parse a backend status string; unrecognized values become `Unknown`.
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }

    pub fn is_succeeded(self) -> bool {
        self == Self::Succeeded
    }
}
