//! AWS test utilities
//!
//! Region detection and unique names for tests that touch real AWS.

use chrono::Utc;
use lifecycle_common::defaults::DEFAULT_REGION;

/// Get the AWS region for tests.
///
/// Checks `AWS_REGION`, then `AWS_DEFAULT_REGION`, then falls back to the
/// provider's default region.
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| DEFAULT_REGION.to_string())
}

/// Generate a unique run ID for test resources.
///
/// Format: `test-{timestamp_ms}-{counter}`, unique even when tests start
/// simultaneously.
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

/// Unique name for a resource created by a test, e.g. an agent name.
///
/// ```
/// use lifecycle_test_utils::aws::test_resource_name;
///
/// let name = test_resource_name("agent");
/// assert!(name.starts_with("lifecycle-agent-test-"));
/// ```
pub fn test_resource_name(prefix: &str) -> String {
    format!("lifecycle-{}-{}", prefix, test_run_id())
}
