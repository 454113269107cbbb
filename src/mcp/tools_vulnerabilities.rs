//! Vulnerability MCP tool handler implementations (2 tools).

use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use crate::client::UpwindClient;
use crate::types::ListVulnerabilityFindingsParams;

use super::server::{
    json_result, require_id, resolve_organization_id, FindingInput, ListVulnerabilityFindingsInput,
};

// upwind_list_vulnerability_findings
pub(crate) async fn handle_list_findings(
    client: &UpwindClient,
    p: ListVulnerabilityFindingsInput,
) -> Result<CallToolResult, McpError> {
    let org = resolve_organization_id(client, p.organization_id).await?;
    let params = ListVulnerabilityFindingsParams {
        per_page: p.per_page,
        page_token: p.page_token,
        cloud_account_id: p.cloud_account_id,
        cluster_id: p.cluster_id,
        namespace: p.namespace,
        ingress_active_communication: p.ingress_active_communication,
        in_use: p.in_use,
        exploitable: p.exploitable,
        fix_available: p.fix_available,
        severity: p.severity,
        image_name: p.image_name,
    };
    let findings = client.list_vulnerability_findings(&org, &params).await?;
    tracing::debug!(count = findings.len(), "listed vulnerability findings");
    json_result(&findings)
}

// upwind_get_vulnerability_finding
pub(crate) async fn handle_get_finding(
    client: &UpwindClient,
    p: FindingInput,
) -> Result<CallToolResult, McpError> {
    require_id(&p.finding_id, "findingId")?;
    let org = resolve_organization_id(client, p.organization_id).await?;
    let finding = client.get_vulnerability_finding(&org, &p.finding_id).await?;
    json_result(&finding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, TokenManager};
    use crate::types::Severity;
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn boolean_filters_use_kebab_case_query_names() {
        let mock = MockServer::start();
        mock.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "tok", "expires_in": 3600}));
        });
        let list = mock.mock(|when, then| {
            when.method(GET)
                .path("/v1/organizations/org-1/vulnerability-findings")
                .query_param("per-page", "25")
                .query_param("in-use", "true")
                .query_param("fix-available", "false")
                .query_param("severity", "CRITICAL")
                .query_param("image-name", "nginx:latest");
            then.status(200).json_body(serde_json::json!([
                {"id": "vf-1", "vulnerability": {"severity": "CRITICAL"}}
            ]));
        });

        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            Credentials::new("id", "secret", mock.base_url()),
        ));
        let client = UpwindClient::new(http, mock.base_url(), tokens);

        let result = handle_list_findings(
            &client,
            ListVulnerabilityFindingsInput {
                organization_id: Some("org-1".into()),
                per_page: Some(25),
                in_use: Some(true),
                fix_available: Some(false),
                severity: Some(Severity::Critical),
                image_name: Some("nginx:latest".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        list.assert();
        let v = serde_json::to_value(&result).unwrap();
        assert!(v["content"][0]["text"].as_str().unwrap().contains("vf-1"));
    }
}
