//! Privilege declaration for the provider's handlers
//!
//! The provider never enforces these itself; deployment tooling attaches the
//! rendered document to the handler's execution role.

use lifecycle_common::OperationKind;
use serde::{Deserialize, Serialize};

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// An IAM policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

/// One allow statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub sid: String,
    pub effect: String,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

impl PolicyStatement {
    pub fn allow(sid: &str, actions: &[&str]) -> Self {
        Self {
            sid: sid.to_string(),
            effect: "Allow".to_string(),
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource: vec!["*".to_string()],
        }
    }
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    /// Minimal privileges the handlers need for `kind`
    pub fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Build => Self::new(vec![PolicyStatement::allow(
                "StartAndQueryBuilds",
                &["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
            )]),
            OperationKind::Agent => Self::new(vec![
                PolicyStatement::allow(
                    "ManageAgents",
                    &[
                        "bedrock:CreateAgent",
                        "bedrock:UpdateAgent",
                        "bedrock:GetAgent",
                        "bedrock:ListAgents",
                        "bedrock:DeleteAgent",
                        "bedrock:PrepareAgent",
                        "bedrock:TagResource",
                    ],
                ),
                PolicyStatement::allow(
                    "ManageAgentRole",
                    &[
                        "iam:CreateRole",
                        "iam:GetRole",
                        "iam:PutRolePolicy",
                        "iam:GetRolePolicy",
                        "iam:DeleteRolePolicy",
                        "iam:DeleteRole",
                        "iam:TagRole",
                        "iam:PassRole",
                    ],
                ),
                PolicyStatement::allow(
                    "PublishAgentId",
                    &["ssm:PutParameter", "ssm:GetParameter", "ssm:DeleteParameter"],
                ),
            ]),
        }
    }

    /// Every action across all statements
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.statement
            .iter()
            .flat_map(|s| s.action.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_policy_is_start_and_query_only() {
        let policy = PolicyDocument::for_kind(OperationKind::Build);
        let actions: Vec<_> = policy.actions().collect();
        assert_eq!(actions, vec!["codebuild:StartBuild", "codebuild:BatchGetBuilds"]);
    }

    #[test]
    fn test_agent_policy_covers_role_and_parameter() {
        let policy = PolicyDocument::for_kind(OperationKind::Agent);
        let actions: Vec<_> = policy.actions().collect();
        for needed in [
            "bedrock:CreateAgent",
            "bedrock:GetAgent",
            "iam:CreateRole",
            "iam:GetRolePolicy",
            "iam:PassRole",
            "ssm:PutParameter",
        ] {
            assert!(actions.contains(&needed), "missing {}", needed);
        }
        assert!(!actions.iter().any(|a| a.starts_with("codebuild:")));
    }

    #[test]
    fn test_policy_wire_format() {
        let value = serde_json::to_value(PolicyDocument::for_kind(OperationKind::Build)).unwrap();
        assert_eq!(
            value,
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "StartAndQueryBuilds",
                    "Effect": "Allow",
                    "Action": ["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
                    "Resource": ["*"]
                }]
            })
        );
    }
}
