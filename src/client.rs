//! Upwind REST API client.
//!
//! One method per remote operation. Every request carries a bearer token from
//! the shared [`TokenManager`], and every non-2xx answer is normalized into a
//! [`RemoteApiError`] before it reaches the caller. No retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{Credentials, TokenManager};
use crate::config::UpwindConfig;
use crate::error::{RemoteApiError, Result};
use crate::types::{
    EventList, EventRequest, ListThreatDetectionsParams, ListThreatPoliciesParams,
    ListVulnerabilityFindingsParams, ThreatDetection, ThreatDetectionUpdateRequest, ThreatPolicy,
    ThreatPolicyUpdateRequest, VulnerabilityFinding,
};

/// Typed façade over `/v1/organizations/{orgId}/...`.
#[derive(Debug, Clone)]
pub struct UpwindClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenManager>,
}

impl UpwindClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<TokenManager>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// Build the HTTP transport, the token manager, and the client from config.
    pub fn from_config(config: &UpwindConfig) -> std::result::Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("upwind-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let credentials = Credentials {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_endpoint: config.auth_url.clone(),
        };
        let tokens = Arc::new(TokenManager::new(http.clone(), credentials));
        Ok(Self::new(http, config.base_url.clone(), tokens))
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// See [`TokenManager::discover_organization_id`].
    pub async fn discover_organization_id(&self) -> Option<String> {
        self.tokens.discover_organization_id().await
    }

    // -- Threat detections ---------------------------------------------------

    pub async fn list_threat_detections(
        &self,
        organization_id: &str,
        params: &ListThreatDetectionsParams,
    ) -> Result<Vec<ThreatDetection>> {
        let url = self.org_url(organization_id, &["threat-detections"]);
        self.send(self.request(Method::GET, &url).query(params)).await
    }

    pub async fn get_threat_detection(
        &self,
        organization_id: &str,
        detection_id: &str,
    ) -> Result<ThreatDetection> {
        let url = self.org_url(organization_id, &["threat-detections", detection_id]);
        self.send(self.request(Method::GET, &url)).await
    }

    pub async fn update_threat_detection(
        &self,
        organization_id: &str,
        detection_id: &str,
        update: &ThreatDetectionUpdateRequest,
    ) -> Result<ThreatDetection> {
        let url = self.org_url(organization_id, &["threat-detections", detection_id]);
        self.send_json(Method::PATCH, &url, update).await
    }

    // -- Threat policies -----------------------------------------------------

    pub async fn list_threat_policies(
        &self,
        organization_id: &str,
        params: &ListThreatPoliciesParams,
    ) -> Result<Vec<ThreatPolicy>> {
        let url = self.org_url(organization_id, &["threat-policies"]);
        self.send(self.request(Method::GET, &url).query(params)).await
    }

    pub async fn update_threat_policy(
        &self,
        organization_id: &str,
        policy_id: &str,
        update: &ThreatPolicyUpdateRequest,
    ) -> Result<ThreatPolicy> {
        let url = self.org_url(organization_id, &["threat-policies", policy_id]);
        self.send_json(Method::PATCH, &url, update).await
    }

    // -- Vulnerability findings ----------------------------------------------

    pub async fn list_vulnerability_findings(
        &self,
        organization_id: &str,
        params: &ListVulnerabilityFindingsParams,
    ) -> Result<Vec<VulnerabilityFinding>> {
        let url = self.org_url(organization_id, &["vulnerability-findings"]);
        self.send(self.request(Method::GET, &url).query(params)).await
    }

    pub async fn get_vulnerability_finding(
        &self,
        organization_id: &str,
        finding_id: &str,
    ) -> Result<VulnerabilityFinding> {
        let url = self.org_url(organization_id, &["vulnerability-findings", finding_id]);
        self.send(self.request(Method::GET, &url)).await
    }

    // -- Events --------------------------------------------------------------

    pub async fn create_event(
        &self,
        organization_id: &str,
        event: &EventRequest,
    ) -> Result<Vec<EventList>> {
        let url = self.org_url(organization_id, &["events"]);
        self.send_json(Method::POST, &url, event).await
    }

    // -- Plumbing ------------------------------------------------------------

    /// `{base}/v1/organizations/{org}/{segments...}` with every caller-supplied
    /// segment percent-encoded.
    fn org_url(&self, organization_id: &str, segments: &[&str]) -> String {
        let mut url = format!(
            "{}/v1/organizations/{}",
            self.base_url,
            urlencoding::encode(organization_id)
        );
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url)
    }

    async fn send_json<B, T>(&self, method: Method, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let token = self.tokens.ensure_valid_token().await?;
        let request = builder.bearer_auth(token).build()?;
        tracing::debug!(method = %request.method(), path = request.url().path(), "Upwind API request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = remote_error(status, &bytes);
            tracing::warn!(status = err.status_code, error = %err.error, "Upwind API returned an error");
            return Err(err.into());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Normalize a non-2xx response into a [`RemoteApiError`].
///
/// `error` and `message` come from the JSON body when present; otherwise
/// `error` is `"Unknown error"` and `message` is the HTTP status text.
pub fn remote_error(status: StatusCode, body: &[u8]) -> RemoteApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    RemoteApiError {
        error: field("error").unwrap_or_else(|| "Unknown error".to_string()),
        message: field("message").unwrap_or_else(|| {
            format!(
                "Request failed with status code {}{}",
                status.as_u16(),
                status
                    .canonical_reason()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default()
            )
        }),
        status_code: status.as_u16(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> UpwindClient {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            Credentials::new("id", "secret", "https://auth.example"),
        ));
        UpwindClient::new(http, base, tokens)
    }

    #[test]
    fn org_url_joins_and_encodes_segments() {
        let c = client("https://api.upwind.io/");
        assert_eq!(
            c.org_url("org 1", &["threat-detections", "td/2"]),
            "https://api.upwind.io/v1/organizations/org%201/threat-detections/td%2F2"
        );
    }

    #[test]
    fn remote_error_reads_json_body() {
        let err = remote_error(
            StatusCode::FORBIDDEN,
            br#"{"error":"forbidden","message":"no access"}"#,
        );
        assert_eq!(
            err,
            RemoteApiError {
                error: "forbidden".into(),
                message: "no access".into(),
                status_code: 403,
            }
        );
    }

    #[test]
    fn remote_error_defaults_for_non_json_body() {
        let err = remote_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.error, "Unknown error");
        assert_eq!(
            err.message,
            "Request failed with status code 502 (Bad Gateway)"
        );
        assert_eq!(err.status_code, 502);
    }

    #[test]
    fn remote_error_partial_body() {
        let err = remote_error(StatusCode::NOT_FOUND, br#"{"message":"no such finding"}"#);
        assert_eq!(err.error, "Unknown error");
        assert_eq!(err.message, "no such finding");
    }
}
