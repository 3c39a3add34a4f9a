//! Runtime configuration for one provider invocation

use crate::construct::ProviderConfig;
use lifecycle_common::OperationKind;

/// AWS connection settings
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// AWS region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

/// Configuration for a provider invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Backend the provider drives
    pub kind: OperationKind,
    pub aws: AwsConfig,
    pub provider: ProviderConfig,
}

impl RunConfig {
    pub fn region(&self) -> &str {
        &self.aws.region
    }

    pub fn aws_profile(&self) -> Option<&str> {
        self.aws.aws_profile.as_deref()
    }
}
