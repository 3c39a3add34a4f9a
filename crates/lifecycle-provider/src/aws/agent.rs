//! Bedrock agent deployment backend

use crate::aws::backend::OperationBackend;
use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::iam::IamClient;
use crate::aws::ssm::ParameterStoreClient;
use crate::error::ProviderError;
use crate::wait::{WaitConfig, wait_for_resource};
use anyhow::{Context, Result};
use aws_sdk_bedrockagent::Client;
use aws_sdk_bedrockagent::types::{Agent, AgentCollaboration};
use lifecycle_common::{
    AgentProperties, OperationHandle, OperationKind, OperationSnapshot, OperationStatus,
    StageRecord, StageStatus, StartRequest,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Name of the single stage reported for a failed agent
const AGENT_STAGE: &str = "agent";

/// Page size when looking up an agent by name
const LIST_PAGE_SIZE: i32 = 100;

/// Bedrock agent control-plane client
pub struct BedrockAgentClient {
    client: Client,
}

impl FromAwsContext for BedrockAgentClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.bedrock_agent_client(),
        }
    }
}

impl BedrockAgentClient {
    /// Create the agent, or update it in place if one with the same name
    /// already exists. Returns the agent id.
    pub async fn create_or_update_agent(
        &self,
        props: &AgentProperties,
        role_arn: &str,
    ) -> Result<String> {
        info!(
            agent_name = %props.agent_name,
            foundation_model = %props.foundation_model,
            "Creating Bedrock agent"
        );

        let result = self
            .client
            .create_agent()
            .agent_name(&props.agent_name)
            .agent_resource_role_arn(role_arn)
            .foundation_model(&props.foundation_model)
            .instruction(&props.instruction)
            .set_description(props.description.clone())
            .idle_session_ttl_in_seconds(idle_session_ttl(props))
            .set_agent_collaboration(collaboration(props))
            .send()
            .await;

        match result {
            Ok(resp) => {
                let agent = resp.agent().context("CreateAgent returned no agent")?;
                info!(agent_id = %agent.agent_id(), "Bedrock agent created");
                Ok(agent.agent_id().to_string())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conflict_exception()) =>
            {
                warn!(
                    agent_name = %props.agent_name,
                    "Agent already exists, updating in place"
                );
                let agent_id = self
                    .find_agent_id(&props.agent_name)
                    .await?
                    .with_context(|| {
                        format!(
                            "Agent '{}' reported as existing but not found by name",
                            props.agent_name
                        )
                    })?;
                self.update_agent(&agent_id, props, role_arn).await?;
                Ok(agent_id)
            }
            Err(e) => Err(e).context("Failed to create Bedrock agent"),
        }
    }

    async fn update_agent(
        &self,
        agent_id: &str,
        props: &AgentProperties,
        role_arn: &str,
    ) -> Result<()> {
        self.client
            .update_agent()
            .agent_id(agent_id)
            .agent_name(&props.agent_name)
            .agent_resource_role_arn(role_arn)
            .foundation_model(&props.foundation_model)
            .instruction(&props.instruction)
            .set_description(props.description.clone())
            .idle_session_ttl_in_seconds(idle_session_ttl(props))
            .set_agent_collaboration(collaboration(props))
            .send()
            .await
            .context("Failed to update Bedrock agent")?;

        info!(agent_id = %agent_id, "Bedrock agent updated");
        Ok(())
    }

    /// Find an agent's id by exact name, paging through all agents
    pub async fn find_agent_id(&self, agent_name: &str) -> Result<Option<String>> {
        let mut next_token: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_agents()
                .max_results(LIST_PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .context("Failed to list Bedrock agents")?;

            if let Some(summary) = resp
                .agent_summaries()
                .iter()
                .find(|s| s.agent_name() == agent_name)
            {
                return Ok(Some(summary.agent_id().to_string()));
            }

            match resp.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(None),
            }
        }
    }

    /// Start preparing the agent's DRAFT version for invocation
    pub async fn prepare_agent(&self, agent_id: &str) -> Result<()> {
        let resp = self
            .client
            .prepare_agent()
            .agent_id(agent_id)
            .send()
            .await
            .context("Failed to prepare Bedrock agent")?;

        info!(
            agent_id = %agent_id,
            agent_status = %resp.agent_status().as_str(),
            "Bedrock agent preparation started"
        );
        Ok(())
    }

    /// Fetch an agent by id; `None` if Bedrock does not know it
    pub async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        match self.client.get_agent().agent_id(agent_id).send().await {
            Ok(resp) => Ok(resp.agent().cloned()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to get Bedrock agent"),
        }
    }
}

fn idle_session_ttl(props: &AgentProperties) -> i32 {
    // Validated to 60..=3600, always fits
    i32::try_from(props.idle_session_ttl_seconds).unwrap_or(i32::MAX)
}

fn collaboration(props: &AgentProperties) -> Option<AgentCollaboration> {
    props
        .agent_collaboration
        .map(|c| AgentCollaboration::from(c.as_ref()))
}

/// Map an agent status onto an operation status
///
/// Only `PREPARED` is usable. `NOT_PREPARED` is the state between create
/// and the end of preparation, unless preparation left failure reasons.
fn operation_status(agent: &Agent) -> OperationStatus {
    match agent.agent_status().as_str() {
        "CREATING" | "PREPARING" | "UPDATING" | "VERSIONING" => OperationStatus::InProgress,
        "NOT_PREPARED" if !agent.failure_reasons().is_empty() => OperationStatus::Failed,
        "NOT_PREPARED" => OperationStatus::InProgress,
        "PREPARED" => OperationStatus::Succeeded,
        "FAILED" | "DELETING" | "DELETED" => OperationStatus::Failed,
        _ => OperationStatus::Pending,
    }
}

/// Whether a freshly created or updated agent accepts PrepareAgent.
///
/// Errors if the agent ended up somewhere preparation cannot recover from.
fn ready_to_prepare(agent: &Agent) -> Result<bool> {
    match agent.agent_status().as_str() {
        "CREATING" | "UPDATING" | "PREPARING" | "VERSIONING" => Ok(false),
        "FAILED" | "DELETING" | "DELETED" => anyhow::bail!(
            "agent {} is {}: {}",
            agent.agent_id(),
            agent.agent_status().as_str(),
            agent.failure_reasons().join("; ")
        ),
        _ => Ok(true),
    }
}

/// Normalize a Bedrock agent into a snapshot
pub fn snapshot_from_agent(agent: &Agent) -> OperationSnapshot {
    let status = operation_status(agent);
    let snapshot = OperationSnapshot::new(status);

    match status {
        OperationStatus::Succeeded => snapshot
            .with_output("AgentId", agent.agent_id())
            .with_output("AgentArn", agent.agent_arn()),
        OperationStatus::Failed => {
            let messages = agent
                .failure_reasons()
                .iter()
                .chain(agent.recommended_actions())
                .map(String::as_str);
            snapshot.with_stages(vec![
                StageRecord::new(
                    AGENT_STAGE,
                    StageStatus::parse(agent.agent_status().as_str()),
                )
                .with_messages(messages),
            ])
        }
        _ => snapshot,
    }
}

/// Operation backend that deploys Bedrock agents
pub struct AgentBackend {
    agents: BedrockAgentClient,
    iam: IamClient,
    ssm: ParameterStoreClient,
    cancel: Option<CancellationToken>,
}

impl AgentBackend {
    pub fn new(agents: BedrockAgentClient, iam: IamClient, ssm: ParameterStoreClient) -> Self {
        Self {
            agents,
            iam,
            ssm,
            cancel: None,
        }
    }

    /// Cancel the IAM propagation and agent creation waits when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    async fn deploy(&self, props: &AgentProperties) -> Result<String> {
        let role_arn = self
            .iam
            .ensure_agent_role(&props.role_name(), &props.agent_name, self.cancel.as_ref())
            .await?;

        let agent_id = self.agents.create_or_update_agent(props, &role_arn).await?;

        let agents = &self.agents;
        let id = agent_id.as_str();
        wait_for_resource(
            WaitConfig {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(5),
                timeout: Duration::from_secs(120),
                jitter: true,
            },
            self.cancel.as_ref(),
            move || async move {
                match agents.get_agent(id).await? {
                    Some(agent) => ready_to_prepare(&agent),
                    None => Ok(false),
                }
            },
            "Bedrock agent",
        )
        .await
        .context("Waiting for Bedrock agent to leave CREATING/UPDATING")?;

        self.agents.prepare_agent(&agent_id).await?;

        if let Some(parameter) = &props.parameter_name {
            self.ssm.put_string(parameter, &agent_id).await?;
        }

        Ok(agent_id)
    }
}

impl FromAwsContext for AgentBackend {
    fn from_context(ctx: &AwsContext) -> Self {
        Self::new(
            BedrockAgentClient::from_context(ctx),
            IamClient::from_context(ctx),
            ParameterStoreClient::from_context(ctx),
        )
    }
}

impl OperationBackend for AgentBackend {
    fn kind(&self) -> OperationKind {
        OperationKind::Agent
    }

    async fn start_operation(
        &self,
        request: &StartRequest,
    ) -> Result<OperationHandle, ProviderError> {
        let StartRequest::Agent(props) = request else {
            return Err(ProviderError::KindMismatch {
                backend: self.kind(),
                requested: request.kind(),
            });
        };

        let agent_id = self
            .deploy(props)
            .await
            .map_err(|e| ProviderError::start_failure(&props.agent_name, &e))?;

        OperationHandle::new(agent_id).map_err(|e| {
            ProviderError::start_failure(&props.agent_name, &anyhow::Error::new(e))
        })
    }

    async fn query_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationSnapshot, ProviderError> {
        let agent = self
            .agents
            .get_agent(handle)
            .await
            .map_err(|e| ProviderError::backend_unavailable(handle.as_str(), &e))?
            .ok_or_else(|| ProviderError::OperationNotFound {
                handle: handle.to_string(),
            })?;

        let snapshot = snapshot_from_agent(&agent);
        debug!(
            agent_id = %handle,
            agent_status = %agent.agent_status().as_str(),
            status = %snapshot.status,
            "Queried Bedrock agent"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_bedrockagent::primitives::DateTime;
    use aws_sdk_bedrockagent::types::AgentStatus;

    fn agent(status: AgentStatus) -> aws_sdk_bedrockagent::types::builders::AgentBuilder {
        Agent::builder()
            .agent_id("AGENT123")
            .agent_name("support-bot")
            .agent_arn("arn:aws:bedrock:us-east-1:123456789012:agent/AGENT123")
            .agent_version("DRAFT")
            .agent_status(status)
            .agent_resource_role_arn("arn:aws:iam::123456789012:role/BedrockExecutionRoleForAgents_support-bot")
            .idle_session_ttl_in_seconds(1800)
            .created_at(DateTime::from_secs(0))
            .updated_at(DateTime::from_secs(0))
    }

    #[test]
    fn test_status_mapping() {
        let status = |s: AgentStatus| operation_status(&agent(s).build().unwrap());
        for s in [
            AgentStatus::Creating,
            AgentStatus::Preparing,
            AgentStatus::Updating,
            AgentStatus::Versioning,
            AgentStatus::NotPrepared,
        ] {
            assert_eq!(status(s), OperationStatus::InProgress);
        }
        assert_eq!(status(AgentStatus::Prepared), OperationStatus::Succeeded);
        assert_eq!(status(AgentStatus::Failed), OperationStatus::Failed);
        assert_eq!(status(AgentStatus::Deleting), OperationStatus::Failed);
    }

    #[test]
    fn test_prepared_agent_outputs() {
        let agent = agent(AgentStatus::Prepared).build().unwrap();
        let snapshot = snapshot_from_agent(&agent);
        assert_eq!(snapshot.status, OperationStatus::Succeeded);
        assert_eq!(snapshot.outputs["AgentId"], "AGENT123");
        assert!(snapshot.stages.is_empty());
    }

    #[test]
    fn test_unprepared_agent_is_not_done() {
        let agent = agent(AgentStatus::NotPrepared).build().unwrap();
        let snapshot = snapshot_from_agent(&agent);
        assert_eq!(snapshot.status, OperationStatus::InProgress);
        assert!(snapshot.outputs.is_empty());
    }

    #[test]
    fn test_failed_preparation_reports_reasons() {
        let agent = agent(AgentStatus::NotPrepared)
            .failure_reasons("Instruction is too short")
            .build()
            .unwrap();
        let snapshot = snapshot_from_agent(&agent);
        assert_eq!(snapshot.status, OperationStatus::Failed);
        assert_eq!(snapshot.stages[0].status, StageStatus::Unknown);
        assert_eq!(snapshot.stages[0].messages, vec!["Instruction is too short"]);
    }

    #[test]
    fn test_ready_to_prepare() {
        let ready = |s: AgentStatus| ready_to_prepare(&agent(s).build().unwrap());
        assert!(!ready(AgentStatus::Creating).unwrap());
        assert!(!ready(AgentStatus::Updating).unwrap());
        assert!(ready(AgentStatus::NotPrepared).unwrap());
        assert!(ready(AgentStatus::Prepared).unwrap());

        let failed = agent(AgentStatus::Failed)
            .failure_reasons("Role cannot be assumed")
            .build()
            .unwrap();
        let err = ready_to_prepare(&failed).unwrap_err();
        assert!(err.to_string().contains("Role cannot be assumed"), "got: {err}");
    }

    #[test]
    fn test_failed_agent_reasons_then_actions() {
        let agent = agent(AgentStatus::Failed)
            .failure_reasons("Model access denied for anthropic.claude-v2")
            .recommended_actions("Request model access in the Bedrock console")
            .build()
            .unwrap();

        let snapshot = snapshot_from_agent(&agent);
        assert_eq!(snapshot.status, OperationStatus::Failed);
        assert_eq!(snapshot.stages.len(), 1);
        assert_eq!(snapshot.stages[0].name, AGENT_STAGE);
        assert_eq!(snapshot.stages[0].status, StageStatus::Failed);
        assert_eq!(
            snapshot.stages[0].messages,
            vec![
                "Model access denied for anthropic.claude-v2",
                "Request model access in the Bedrock console"
            ]
        );
        assert!(snapshot.outputs.is_empty());
    }

    #[test]
    fn test_creating_agent_has_no_stages() {
        let agent = agent(AgentStatus::Creating).build().unwrap();
        let snapshot = snapshot_from_agent(&agent);
        assert_eq!(snapshot.status, OperationStatus::InProgress);
        assert!(snapshot.stages.is_empty());
    }
}
