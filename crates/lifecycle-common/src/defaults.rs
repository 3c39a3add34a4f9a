//! Default configuration values shared by the handler, poller and construct
//!
//! These constants keep the wire contract and invocation limits consistent
//! across every component.

use std::time::Duration;

/// Key under which the operation handle is stored in the continuation data
pub const CONTINUATION_KEY: &str = "handle";

/// Default handler timeout (15 minutes, the Lambda ceiling)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default handler memory in MiB
pub const DEFAULT_MEMORY_MB: u32 = 1024;

/// Default interval between completion polls, used by the calling engine
pub const DEFAULT_QUERY_INTERVAL: Duration = Duration::from_secs(5);

/// Default total time the calling engine keeps polling before giving up
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default log retention for handler logs, in days
pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 7;

/// Default AWS region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default Bedrock agent idle session TTL in seconds
pub const DEFAULT_IDLE_SESSION_TTL_SECS: u32 = 1800;

/// Prefix for the execution role created for a Bedrock agent
pub const AGENT_ROLE_PREFIX: &str = "BedrockExecutionRoleForAgents_";

// Serde default functions for struct field defaults

/// Returns the default idle session TTL
pub fn default_idle_session_ttl() -> u32 {
    DEFAULT_IDLE_SESSION_TTL_SECS
}
