//! Schema-validated resource properties
//!
//! The engine delivers `ResourceProperties` as an open string-keyed map
//! (CloudFormation even stringifies numbers). Each operation kind declares
//! the keys it needs; the on-event handler parses and validates the map at
//! its boundary so a missing identifier is reported as a caller error before
//! any backend call is made.

use crate::defaults::{AGENT_ROLE_PREFIX, default_idle_session_ttl};
use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Which external backend a provider drives
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A CodeBuild project build
    Build,
    /// A Bedrock agent deployment
    Agent,
}

/// Properties for starting a CodeBuild build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct BuildProperties {
    /// CodeBuild project to start
    #[serde(alias = "projectName")]
    #[garde(length(min = 1, max = 255))]
    pub project_name: String,

    /// Commit, branch or tag to build instead of the project default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1))]
    pub source_version: Option<String>,
}

/// Collaboration mode of a Bedrock agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentCollaboration {
    Disabled,
    Supervisor,
    SupervisorRouter,
}

/// Properties for deploying a Bedrock agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct AgentProperties {
    #[garde(length(min = 1, max = 100))]
    pub agent_name: String,

    /// Foundation model id or inference profile
    #[garde(length(min = 1))]
    pub foundation_model: String,

    /// Bedrock requires at least 40 characters of instruction
    #[garde(length(min = 40))]
    pub instruction: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(max = 200))]
    pub description: Option<String>,

    #[serde(
        default = "default_idle_session_ttl",
        deserialize_with = "u32_from_number_or_string"
    )]
    #[garde(range(min = 60, max = 3600))]
    pub idle_session_ttl_seconds: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub agent_collaboration: Option<AgentCollaboration>,

    /// Execution role to use or create (defaults to a name derived from the agent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1, max = 64))]
    pub role_name: Option<String>,

    /// SSM parameter that receives the agent id once the agent is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1, max = 2048))]
    pub parameter_name: Option<String>,
}

impl AgentProperties {
    /// Execution role name, explicit or derived from the agent name
    pub fn role_name(&self) -> String {
        self.role_name
            .clone()
            .unwrap_or_else(|| format!("{}{}", AGENT_ROLE_PREFIX, self.agent_name))
    }
}

/// Typed start request for one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartRequest {
    Build(BuildProperties),
    Agent(AgentProperties),
}

impl StartRequest {
    /// Parse and validate an open property map for the given kind.
    pub fn from_properties(
        kind: OperationKind,
        properties: &Map<String, Value>,
    ) -> Result<Self, PropertiesError> {
        let value = Value::Object(properties.clone());
        match kind {
            OperationKind::Build => {
                let props: BuildProperties = parse(kind, value)?;
                validate(kind, &props)?;
                Ok(Self::Build(props))
            }
            OperationKind::Agent => {
                let props: AgentProperties = parse(kind, value)?;
                validate(kind, &props)?;
                Ok(Self::Agent(props))
            }
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Build(_) => OperationKind::Build,
            Self::Agent(_) => OperationKind::Agent,
        }
    }

    /// The name the backend knows the resource by
    pub fn identifier(&self) -> &str {
        match self {
            Self::Build(p) => &p.project_name,
            Self::Agent(p) => &p.agent_name,
        }
    }
}

/// Property bag rejected at the handler boundary
#[derive(Debug, Error)]
pub enum PropertiesError {
    /// Required key missing or wrong type
    #[error("invalid {kind} resource properties: {source}")]
    Parse {
        kind: OperationKind,
        #[source]
        source: serde_json::Error,
    },

    /// Keys present but values out of bounds
    #[error("invalid {kind} resource properties: {details}")]
    Invalid { kind: OperationKind, details: String },
}

fn parse<T: serde::de::DeserializeOwned>(
    kind: OperationKind,
    value: Value,
) -> Result<T, PropertiesError> {
    serde_json::from_value(value).map_err(|source| PropertiesError::Parse { kind, source })
}

fn validate<T: Validate<Context = ()>>(kind: OperationKind, props: &T) -> Result<(), PropertiesError> {
    props.validate().map_err(|report| PropertiesError::Invalid {
        kind,
        details: report.to_string().trim().to_string(),
    })
}

/// CloudFormation passes every scalar property as a string.
fn u32_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
