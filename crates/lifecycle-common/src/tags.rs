//! AWS resource tag constants
//!
//! Supporting resources the provider creates on the side (the Bedrock agent
//! execution role) are tagged so they can be traced back to the resource
//! they were created for.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `resource-lifecycle:tool` | Static identifier ("resource-lifecycle") |
//! | `resource-lifecycle:owner` | Identifier of the resource the supporting resource serves |
//! | `resource-lifecycle:created-at` | RFC 3339 creation timestamp |

/// Tag key for tool identification
pub const TAG_TOOL: &str = "resource-lifecycle:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "resource-lifecycle";

/// Tag key for the identifier of the resource this one was created for
pub const TAG_OWNER: &str = "resource-lifecycle:owner";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "resource-lifecycle:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Standard tag set for a supporting resource created on behalf of `owner`
pub fn standard_tags(owner: &str, now: chrono::DateTime<chrono::Utc>) -> Vec<(&'static str, String)> {
    vec![
        (TAG_TOOL, TAG_TOOL_VALUE.to_string()),
        (TAG_OWNER, owner.to_string()),
        (TAG_CREATED_AT, format_created_at(now)),
    ]
}
