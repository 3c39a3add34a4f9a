//! AWS error classification
//!
//! Provides typed errors for AWS SDK operations using the error code exposed
//! through `ProvideErrorMetadata` instead of string matching on Debug output.

use thiserror::Error;

/// AWS error categories for retry and diagnosis
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Resource already exists (or conflicts with one that does)
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Caller lacks permission for the action
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            AwsError::Throttled => true,
            AwsError::Sdk { code: Some(c), .. } => TRANSIENT_CODES.contains(&c.as_str()),
            AwsError::Sdk { code: None, .. } => true,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::Throttled => suggestion_for_code("ThrottlingException"),
            AwsError::AccessDenied { .. } => suggestion_for_code("AccessDeniedException"),
            AwsError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchEntity",
    "NoSuchEntityException",
    "ResourceNotFoundException",
    "ParameterNotFound",
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "EntityAlreadyExists",
    "EntityAlreadyExistsException",
    "ConflictException",
    "ResourceAlreadyExistsException",
    "ParameterAlreadyExists",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "AccountLimitExceededException",
];

/// Known AWS error codes for missing permissions
const ACCESS_DENIED_CODES: &[&str] = &["AccessDenied", "AccessDeniedException"];

/// Service-side codes that are worth retrying later
const TRANSIENT_CODES: &[&str] = &[
    "InternalServerException",
    "InternalFailure",
    "ServiceUnavailable",
    "ServiceUnavailableException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Downcast one cause to a concrete `SdkError` and classify it by code.
macro_rules! try_classify {
    ($cause:expr, $($err:ty),+ $(,)?) => {
        $(
            if let Some(e) = $cause.downcast_ref::<$err>() {
                let meta = aws_sdk_iam::error::ProvideErrorMetadata::meta(e);
                return classify_aws_error(meta.code(), meta.message());
            }
        )+
    };
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain looking for the SDK errors our clients produce and
/// extracts `.code()` / `.message()` through `ProvideErrorMetadata`. Falls
/// back to string matching on the Debug representation if no typed error is
/// found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_bedrockagent::operation as bedrock;
    use aws_sdk_codebuild::operation as codebuild;
    use aws_sdk_iam::operation as iam;
    use aws_sdk_ssm::operation as ssm;

    for cause in error.chain() {
        try_classify!(
            cause,
            aws_sdk_codebuild::error::SdkError<codebuild::start_build::StartBuildError>,
            aws_sdk_codebuild::error::SdkError<codebuild::batch_get_builds::BatchGetBuildsError>,
            aws_sdk_bedrockagent::error::SdkError<bedrock::create_agent::CreateAgentError>,
            aws_sdk_bedrockagent::error::SdkError<bedrock::update_agent::UpdateAgentError>,
            aws_sdk_bedrockagent::error::SdkError<bedrock::get_agent::GetAgentError>,
            aws_sdk_bedrockagent::error::SdkError<bedrock::list_agents::ListAgentsError>,
            aws_sdk_bedrockagent::error::SdkError<bedrock::prepare_agent::PrepareAgentError>,
            aws_sdk_iam::error::SdkError<iam::get_role::GetRoleError>,
            aws_sdk_iam::error::SdkError<iam::create_role::CreateRoleError>,
            aws_sdk_iam::error::SdkError<iam::put_role_policy::PutRolePolicyError>,
            aws_sdk_iam::error::SdkError<iam::get_role_policy::GetRolePolicyError>,
            aws_sdk_ssm::error::SdkError<ssm::put_parameter::PutParameterError>,
        );
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&error.to_string()));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    let known = NOT_FOUND_CODES
        .iter()
        .chain(ALREADY_EXISTS_CODES)
        .chain(THROTTLING_CODES)
        .chain(ACCESS_DENIED_CODES);

    // Longest first so "ThrottlingException" wins over "Throttling"
    let mut matches: Vec<&str> = known.copied().filter(|c| debug_str.contains(c)).collect();
    matches.sort_by_key(|c| std::cmp::Reverse(c.len()));
    if let Some(code) = matches.first() {
        return Some((*code).to_string());
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "ThrottlingException",
        "AWS API rate limit hit. The calling engine will poll again on its next interval.",
    ),
    (
        "AccessDeniedException",
        "Check the provider's privilege declaration; the handler role is missing an action.",
    ),
    (
        "ValidationException",
        "The backend rejected a resource property. Check the declared ResourceProperties.",
    ),
    (
        "AccountLimitExceededException",
        "Too many concurrent builds for this account. Request a CodeBuild limit increase.",
    ),
    (
        "ServiceQuotaExceededException",
        "Service quota reached. Request an increase via the Service Quotas console.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
