//! CodeBuild build backend

use crate::aws::backend::OperationBackend;
use crate::aws::context::{AwsContext, FromAwsContext};
use crate::error::ProviderError;
use anyhow::{Context, Result};
use aws_sdk_codebuild::Client;
use aws_sdk_codebuild::operation::start_build::StartBuildOutput;
use aws_sdk_codebuild::types::{Build, BuildPhase, StatusType};
use lifecycle_common::{
    BuildProperties, OperationHandle, OperationKind, OperationSnapshot, OperationStatus,
    StageRecord, StageStatus, StartRequest,
};
use tracing::{debug, info};

/// CodeBuild client for starting and inspecting builds
pub struct CodeBuildClient {
    client: Client,
}

impl FromAwsContext for CodeBuildClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.codebuild_client(),
        }
    }
}

impl CodeBuildClient {
    /// Start a build of the given project, returning the build id
    pub async fn start_build(&self, props: &BuildProperties) -> Result<String> {
        info!(
            project = %props.project_name,
            source_version = ?props.source_version,
            "Starting CodeBuild build"
        );

        let response = self
            .client
            .start_build()
            .project_name(&props.project_name)
            .set_source_version(props.source_version.clone())
            .send()
            .await
            .context("Failed to start CodeBuild build")?;

        let build_id = started_build_id(&response).context("StartBuild returned no build id")?;

        debug!(build_id = %build_id, "Build started");
        Ok(build_id.to_string())
    }

    /// Fetch a single build by id; `None` if CodeBuild does not know it
    pub async fn get_build(&self, build_id: &str) -> Result<Option<Build>> {
        let response = self
            .client
            .batch_get_builds()
            .ids(build_id)
            .send()
            .await
            .context("Failed to query CodeBuild build")?;

        Ok(response.builds().first().cloned())
    }
}

fn started_build_id(output: &StartBuildOutput) -> Option<&str> {
    output.build_value().and_then(|b| b.id())
}

/// Map CodeBuild's overall build status onto an operation status
fn operation_status(status: Option<&StatusType>) -> OperationStatus {
    match status.map(|s| s.as_str()) {
        None => OperationStatus::Pending,
        Some("IN_PROGRESS") => OperationStatus::InProgress,
        Some("SUCCEEDED") => OperationStatus::Succeeded,
        // FAILED, FAULT, TIMED_OUT, STOPPED and anything newer
        Some(_) => OperationStatus::Failed,
    }
}

/// Phases without a status carry no diagnosis (e.g. the trailing COMPLETED)
fn stage_record(phase: &BuildPhase) -> Option<StageRecord> {
    let status = phase.phase_status()?;
    let name = phase
        .phase_type()
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let messages = phase
        .contexts()
        .iter()
        .filter_map(|ctx| ctx.message().or(ctx.status_code()));

    Some(StageRecord::new(name, StageStatus::parse(status.as_str())).with_messages(messages))
}

/// Normalize a CodeBuild build into a snapshot
pub fn snapshot_from_build(build: &Build) -> OperationSnapshot {
    let status = operation_status(build.build_status());
    let stages = build.phases().iter().filter_map(stage_record).collect();

    let mut snapshot = OperationSnapshot::new(status).with_stages(stages);
    if status == OperationStatus::Succeeded {
        if let Some(id) = build.id() {
            snapshot = snapshot.with_output("BuildId", id);
        }
        if let Some(arn) = build.arn() {
            snapshot = snapshot.with_output("BuildArn", arn);
        }
        if let Some(number) = build.build_number() {
            snapshot = snapshot.with_output("BuildNumber", number);
        }
    }
    snapshot
}

/// Operation backend that runs CodeBuild projects
pub struct CodeBuildBackend {
    client: CodeBuildClient,
}

impl CodeBuildBackend {
    pub fn new(client: CodeBuildClient) -> Self {
        Self { client }
    }
}

impl FromAwsContext for CodeBuildBackend {
    fn from_context(ctx: &AwsContext) -> Self {
        Self::new(CodeBuildClient::from_context(ctx))
    }
}

impl OperationBackend for CodeBuildBackend {
    fn kind(&self) -> OperationKind {
        OperationKind::Build
    }

    async fn start_operation(
        &self,
        request: &StartRequest,
    ) -> Result<OperationHandle, ProviderError> {
        let StartRequest::Build(props) = request else {
            return Err(ProviderError::KindMismatch {
                backend: self.kind(),
                requested: request.kind(),
            });
        };

        let build_id = self
            .client
            .start_build(props)
            .await
            .map_err(|e| ProviderError::start_failure(&props.project_name, &e))?;

        OperationHandle::new(build_id).map_err(|e| {
            ProviderError::start_failure(&props.project_name, &anyhow::Error::new(e))
        })
    }

    async fn query_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationSnapshot, ProviderError> {
        let build = self
            .client
            .get_build(handle)
            .await
            .map_err(|e| ProviderError::backend_unavailable(handle.as_str(), &e))?
            .ok_or_else(|| ProviderError::OperationNotFound {
                handle: handle.to_string(),
            })?;

        let snapshot = snapshot_from_build(&build);
        debug!(
            build_id = %handle,
            status = %snapshot.status,
            current_phase = ?build.current_phase(),
            "Queried CodeBuild build"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_codebuild::types::{BuildPhaseType, PhaseContext};

    fn phase(kind: BuildPhaseType, status: Option<StatusType>, messages: &[&str]) -> BuildPhase {
        let mut builder = BuildPhase::builder()
            .phase_type(kind)
            .set_phase_status(status);
        for message in messages {
            builder = builder.contexts(
                PhaseContext::builder()
                    .status_code("COMMAND_EXECUTION_ERROR")
                    .message(*message)
                    .build(),
            );
        }
        builder.build()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(operation_status(None), OperationStatus::Pending);
        assert_eq!(
            operation_status(Some(&StatusType::InProgress)),
            OperationStatus::InProgress
        );
        assert_eq!(
            operation_status(Some(&StatusType::Succeeded)),
            OperationStatus::Succeeded
        );
        for failed in [
            StatusType::Failed,
            StatusType::Fault,
            StatusType::TimedOut,
            StatusType::Stopped,
        ] {
            assert_eq!(operation_status(Some(&failed)), OperationStatus::Failed);
        }
    }

    #[test]
    fn test_failed_build_phases_become_stages() {
        let build = Build::builder()
            .id("proj-1:build-42")
            .build_status(StatusType::Failed)
            .phases(phase(BuildPhaseType::Submitted, Some(StatusType::Succeeded), &[]))
            .phases(phase(
                BuildPhaseType::Build,
                Some(StatusType::Failed),
                &["Error while executing command: npm run build. Reason: exit status 1"],
            ))
            .phases(phase(BuildPhaseType::PostBuild, Some(StatusType::Failed), &[""]))
            .phases(phase(BuildPhaseType::Completed, None, &[]))
            .build();

        let snapshot = snapshot_from_build(&build);
        assert_eq!(snapshot.status, OperationStatus::Failed);
        assert_eq!(snapshot.stages.len(), 3, "COMPLETED has no status and is dropped");
        assert_eq!(snapshot.stages[1].name, "BUILD");
        assert_eq!(snapshot.stages[1].status, StageStatus::Failed);
        assert_eq!(
            snapshot.stages[1].messages,
            vec!["Error while executing command: npm run build. Reason: exit status 1"]
        );
        assert!(snapshot.stages[2].messages.is_empty());
        assert!(snapshot.outputs.is_empty());
    }

    #[test]
    fn test_succeeded_build_outputs() {
        let build = Build::builder()
            .id("proj-1:build-42")
            .arn("arn:aws:codebuild:us-east-1:123456789012:build/proj-1:build-42")
            .build_number(42)
            .build_status(StatusType::Succeeded)
            .build();

        let snapshot = snapshot_from_build(&build);
        assert_eq!(snapshot.status, OperationStatus::Succeeded);
        assert_eq!(snapshot.outputs["BuildId"], "proj-1:build-42");
        assert_eq!(snapshot.outputs["BuildNumber"], 42);
    }

    #[test]
    fn test_started_build_id() {
        let output = StartBuildOutput::builder()
            .set_build(Some(Build::builder().id("proj-1:build-42").build()))
            .build();
        assert_eq!(started_build_id(&output), Some("proj-1:build-42"));

        let empty = StartBuildOutput::builder().build();
        assert_eq!(started_build_id(&empty), None);
    }

    #[test]
    fn test_timed_out_phase_status() {
        let build = Build::builder()
            .build_status(StatusType::TimedOut)
            .phases(phase(BuildPhaseType::Build, Some(StatusType::TimedOut), &[]))
            .build();
        let snapshot = snapshot_from_build(&build);
        assert_eq!(snapshot.stages[0].status, StageStatus::TimedOut);
    }
}
