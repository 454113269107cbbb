//! Error taxonomy shared by the auth layer, the API client, and the MCP server.
//!
//! Every failure is reported synchronously to the caller of the operation that
//! produced it. Nothing is retried and nothing is persisted.

use rmcp::ErrorData as McpError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::redact_secrets;

/// Failure while acquiring an OAuth2 access token.
///
/// Variants carry the cause only. The client secret and the access token are
/// never part of the rendered message.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport failure talking to the token endpoint.
    #[error("token request failed: {0}")]
    Http(String),

    /// The token endpoint answered with a non-2xx status.
    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be parsed or lacks a required field.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// `token_type` was present and not `Bearer`.
    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),
}

/// Normalized shape of every non-2xx answer from the Upwind API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteApiError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for RemoteApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Upwind API error ({}): {}", self.status_code, self.message)
    }
}

impl std::error::Error for RemoteApiError {}

/// Top-level error for Upwind operations.
#[derive(Debug, Error)]
pub enum UpwindError {
    #[error("Failed to authenticate with Upwind: {0}")]
    Authentication(#[from] AuthError),

    /// A required identifier is missing after all fallbacks were tried.
    #[error("{0}")]
    InvalidParameters(String),

    #[error(transparent)]
    RemoteApi(#[from] RemoteApiError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UpwindError>;

impl From<UpwindError> for McpError {
    fn from(err: UpwindError) -> Self {
        match err {
            UpwindError::InvalidParameters(msg) => McpError::invalid_params(msg, None),
            UpwindError::RemoteApi(remote) => {
                McpError::internal_error(redact_secrets(&remote.to_string()), None)
            }
            other => McpError::internal_error(
                redact_secrets(&format!("Unexpected error: {other}")),
                None,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn remote_api_error_renders_status_and_message() {
        let e = RemoteApiError {
            error: "forbidden".into(),
            message: "no access".into(),
            status_code: 403,
        };
        assert_eq!(e.to_string(), "Upwind API error (403): no access");
    }

    #[test]
    fn remote_api_error_serializes_camel_case() {
        let e = RemoteApiError {
            error: "not_found".into(),
            message: "missing".into(),
            status_code: 404,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["statusCode"], 404);
        assert_eq!(v["error"], "not_found");
    }

    #[test]
    fn invalid_parameters_maps_to_invalid_params() {
        let mcp: McpError = UpwindError::InvalidParameters("detectionId is required".into()).into();
        assert_eq!(mcp.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(mcp.message, "detectionId is required");
    }

    #[test]
    fn remote_api_maps_to_internal_error_with_status() {
        let mcp: McpError = UpwindError::RemoteApi(RemoteApiError {
            error: "forbidden".into(),
            message: "no access".into(),
            status_code: 403,
        })
        .into();
        assert_eq!(mcp.code, ErrorCode::INTERNAL_ERROR);
        assert!(mcp.message.contains("403"));
        assert!(mcp.message.contains("no access"));
    }

    #[test]
    fn authentication_maps_to_unexpected_internal_error() {
        let mcp: McpError =
            UpwindError::Authentication(AuthError::InvalidResponse("missing expires_in".into()))
                .into();
        assert_eq!(mcp.code, ErrorCode::INTERNAL_ERROR);
        assert!(mcp.message.starts_with("Unexpected error: Failed to authenticate"));
    }

    #[test]
    fn bearer_tokens_are_redacted_from_error_text() {
        let mcp: McpError = UpwindError::Authentication(AuthError::Http(
            "header Bearer eyJhbGciOiJIUzI1NiJ9.eyJvcmdfaWQiOiJhYmMifQ.sig rejected".into(),
        ))
        .into();
        assert!(!mcp.message.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert!(mcp.message.contains("***REDACTED***"));
    }
}
