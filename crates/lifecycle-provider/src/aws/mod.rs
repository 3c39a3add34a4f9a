//! AWS backends and the clients they are built from
//!
//! - CodeBuild: project builds
//! - Bedrock agent: agent deployment, with IAM for the execution role and
//!   SSM for publishing the agent id

pub mod agent;
pub mod backend;
pub mod codebuild;
pub mod context;
pub mod error;
pub mod iam;
pub mod ssm;

pub use agent::{AgentBackend, BedrockAgentClient};
pub use backend::{Backend, OperationBackend};
pub use codebuild::{CodeBuildBackend, CodeBuildClient};
pub use context::{AwsContext, FromAwsContext};
pub use iam::IamClient;
pub use ssm::ParameterStoreClient;

pub use error::{AwsError, classify_anyhow_error, classify_aws_error};
