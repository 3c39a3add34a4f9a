//! lifecycle-provider - asynchronous custom resource provider
//!
//! An on-event handler starts one long-running external operation (a
//! CodeBuild build or a Bedrock agent deployment) and returns its handle as
//! continuation data. A completion poller is then invoked repeatedly with
//! that data until the operation succeeds or fails. Both are stateless: all
//! state lives in the event the calling engine passes back.

pub mod aws;
pub mod config;
pub mod construct;
pub mod error;
pub mod handler;
pub mod policy;
pub mod poller;
pub mod wait;

pub use construct::{ProviderConfig, ProviderManifest, ResourceLifecycleProvider};
pub use error::ProviderError;
