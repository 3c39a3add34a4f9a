//! IAM execution role management for Bedrock agents

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::wait::{WaitConfig, wait_for_resource};
use anyhow::{Context, Result};
use aws_sdk_iam::Client;
use aws_sdk_iam::error::SdkError;
use aws_sdk_iam::operation::get_role_policy::{GetRolePolicyError, GetRolePolicyOutput};
use aws_sdk_iam::types::Tag;
use chrono::Utc;
use lifecycle_common::tags;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Name of the inline policy attached to agent execution roles
const AGENT_POLICY_NAME: &str = "bedrock-agent-model-access";

/// The trust policy allowing Bedrock to assume the role
const BEDROCK_ASSUME_ROLE_POLICY: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Effect": "Allow",
            "Principal": {
                "Service": "bedrock.amazonaws.com"
            },
            "Action": "sts:AssumeRole"
        }
    ]
}"#;

/// Generate the inline policy for an agent execution role
///
/// The agent needs:
/// - Model invocation for foundation models and inference profiles
/// - Agent self-management for preparation and collaborator association
fn generate_agent_policy(region: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "BedrockAgentFoundationModelAccess",
                "Effect": "Allow",
                "Action": ["bedrock:InvokeModel", "bedrock:InvokeModelWithResponseStream"],
                "Resource": [
                    format!("arn:aws:bedrock:{}::foundation-model/*", region),
                    format!("arn:aws:bedrock:{}:*:inference-profile/*", region)
                ]
            },
            {
                "Sid": "BedrockAgentSelfManagement",
                "Effect": "Allow",
                "Action": [
                    "bedrock:GetAgentAlias",
                    "bedrock:InvokeAgent",
                    "bedrock:AssociateAgentCollaborator",
                    "bedrock:DisassociateAgentCollaborator",
                    "bedrock:ListAgentCollaborators",
                    "bedrock:PrepareAgent"
                ],
                "Resource": "*"
            }
        ]
    })
    .to_string()
}

/// IAM client for agent execution roles
pub struct IamClient {
    client: Client,
    region: String,
}

impl FromAwsContext for IamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
            region: ctx.region().to_string(),
        }
    }
}

/// `NoSuchEntity` means not propagated yet; any other error is fatal
fn policy_visible(
    result: Result<GetRolePolicyOutput, SdkError<GetRolePolicyError>>,
) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e)
            if e.as_service_error()
                .is_some_and(|se| se.is_no_such_entity_exception()) =>
        {
            Ok(false)
        }
        Err(e) => Err(e).context("Failed to read agent role policy"),
    }
}

impl IamClient {
    /// Look up a role's ARN, `None` if the role does not exist
    pub async fn role_arn(&self, role_name: &str) -> Result<Option<String>> {
        match self.client.get_role().role_name(role_name).send().await {
            Ok(resp) => Ok(resp.role().map(|r| r.arn().to_string())),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to get IAM role"),
        }
    }

    /// Make sure the execution role exists with the model-access policy
    /// attached, creating it if needed. Returns the role ARN.
    ///
    /// The optional `cancel` token allows cancelling the wait for IAM
    /// propagation.
    pub async fn ensure_agent_role(
        &self,
        role_name: &str,
        owner: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<String> {
        let arn = match self.role_arn(role_name).await? {
            Some(arn) => {
                info!(role_name = %role_name, "Reusing existing agent execution role");
                arn
            }
            None => self.create_agent_role(role_name, owner).await?,
        };

        // Inline policy is overwritten in place, so this is safe on reuse
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(AGENT_POLICY_NAME)
            .policy_document(generate_agent_policy(&self.region))
            .send()
            .await
            .context("Failed to attach inline policy to agent role")?;

        debug!(role_name = %role_name, "Inline policy attached");

        let client = self.client.clone();
        let name = role_name.to_string();
        wait_for_resource(
            WaitConfig {
                initial_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(5),
                timeout: Duration::from_secs(60),
                jitter: true,
            },
            cancel,
            || {
                let c = client.clone();
                let n = name.clone();
                async move {
                    policy_visible(
                        c.get_role_policy()
                            .role_name(&n)
                            .policy_name(AGENT_POLICY_NAME)
                            .send()
                            .await,
                    )
                }
            },
            "IAM agent role",
        )
        .await
        .context("Waiting for agent role policy to become visible")?;

        Ok(arn)
    }

    async fn create_agent_role(&self, role_name: &str, owner: &str) -> Result<String> {
        info!(role_name = %role_name, "Creating agent execution role");

        let mut request = self
            .client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(BEDROCK_ASSUME_ROLE_POLICY)
            .description("Execution role for a Bedrock agent managed by resource-lifecycle");

        for (key, value) in tags::standard_tags(owner, Utc::now()) {
            request = request.tags(
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| anyhow::anyhow!("Failed to build IAM tag: {}", e))?,
            );
        }

        let response = request
            .send()
            .await
            .context("Failed to create IAM role")?;

        let arn = response
            .role()
            .map(|r| r.arn().to_string())
            .context("CreateRole returned no role")?;

        info!(role_name = %role_name, role_arn = %arn, "Agent execution role created");
        Ok(arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_policy_names_bedrock() {
        let policy: serde_json::Value = serde_json::from_str(BEDROCK_ASSUME_ROLE_POLICY).unwrap();
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            "bedrock.amazonaws.com"
        );
    }

    #[test]
    fn test_agent_policy_scoped_to_region() {
        let policy: serde_json::Value =
            serde_json::from_str(&generate_agent_policy("us-west-2")).unwrap();
        let resources = policy["Statement"][0]["Resource"].as_array().unwrap();
        assert!(
            resources
                .iter()
                .all(|r| r.as_str().unwrap().starts_with("arn:aws:bedrock:us-west-2:"))
        );
        let actions = policy["Statement"][1]["Action"].as_array().unwrap();
        assert!(actions.iter().any(|a| a == "bedrock:PrepareAgent"));
    }

    #[test]
    fn test_readable_policy_is_visible() {
        let output = GetRolePolicyOutput::builder()
            .role_name("BedrockExecutionRoleForAgents_support-bot")
            .policy_name(AGENT_POLICY_NAME)
            .policy_document("{}")
            .build()
            .unwrap();
        assert!(policy_visible(Ok(output)).unwrap());
    }

    #[test]
    fn test_policy_read_failure_is_not_swallowed() {
        let err = policy_visible(Err(SdkError::construction_failure("credentials expired")))
            .unwrap_err();
        assert!(
            err.to_string().contains("Failed to read agent role policy"),
            "got: {err}"
        );
    }
}
