//! SSM Parameter Store publishing

use crate::aws::context::{AwsContext, FromAwsContext};
use anyhow::{Context, Result};
use aws_sdk_ssm::Client;
use aws_sdk_ssm::types::ParameterType;
use tracing::info;

/// Parameter Store client used to publish identifiers of created resources
pub struct ParameterStoreClient {
    client: Client,
}

impl FromAwsContext for ParameterStoreClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ssm_client(),
        }
    }
}

impl ParameterStoreClient {
    /// Write (or overwrite) a plain string parameter
    pub async fn put_string(&self, name: &str, value: &str) -> Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .with_context(|| format!("Failed to write SSM parameter '{}'", name))?;

        info!(parameter = %name, "SSM parameter written");
        Ok(())
    }
}
