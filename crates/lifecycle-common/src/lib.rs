//! lifecycle-common - Shared types for the resource lifecycle provider
//!
//! This crate holds the wire and data model used by the event handler, the
//! completion poller and the backend adapters, without any AWS SDK
//! dependencies so it stays lightweight and easy to test.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values and fixed wire keys
//! - [`event`]: Lifecycle events and handler/poller results
//! - [`handle`]: Opaque operation handle carried in the continuation token
//! - [`properties`]: Schema-validated resource properties per operation kind
//! - [`stage`]: Stage records and backend status snapshots
//! - [`status`]: Operation and stage status codes
//! - [`tags`]: AWS resource tag constants for provisioned supporting resources

pub mod defaults;
pub mod event;
pub mod handle;
pub mod properties;
pub mod stage;
pub mod status;
pub mod tags;

// Re-export commonly used types
pub use event::{HandlerResult, LifecycleEvent, PollResult, RequestType};
pub use handle::OperationHandle;
pub use properties::{
    AgentProperties, BuildProperties, OperationKind, PropertiesError, StartRequest,
};
pub use stage::{OperationSnapshot, StageRecord};
pub use status::{OperationStatus, StageStatus};
