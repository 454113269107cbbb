//! Full end-to-end integration tests for Upwind MCP.
//!
//! These tests stand up a mock authorization server and a mock Upwind API,
//! build the client the same way the server binary does, and verify the
//! requests that reach the wire.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;

use upwind_mcp::auth::{Credentials, ManualClock, TokenManager};
use upwind_mcp::client::UpwindClient;
use upwind_mcp::config::UpwindConfig;
use upwind_mcp::error::UpwindError;
use upwind_mcp::types::{
    EventReporter, EventRequest, EventType, ListThreatDetectionsParams,
    ListThreatPoliciesParams, ListVulnerabilityFindingsParams, PolicyManager, Severity,
    ThreatPolicyUpdateRequest,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn jwt(claims: serde_json::Value) -> String {
    format!(
        "eyJhbGciOiJSUzI1NiJ9.{}.c2ln",
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

fn mock_token<'a>(server: &'a MockServer, token: &str, expires_in: u64) -> httpmock::Mock<'a> {
    let body = serde_json::json!({
        "access_token": token,
        "expires_in": expires_in,
        "token_type": "Bearer",
    });
    server.mock(|when, then| {
        when.method(POST).path("/oauth/token");
        then.status(200).json_body(body);
    })
}

/// Client wired through `UpwindConfig`, exactly as the binary builds it.
fn client_from_config(server: &MockServer) -> UpwindClient {
    let mut config = UpwindConfig::new("integration-id", "integration-secret");
    config.base_url = server.base_url();
    config.auth_url = server.base_url();
    UpwindClient::from_config(&config).unwrap()
}

// ===========================================================================
// 1. Query construction
// ===========================================================================

#[tokio::test]
async fn vulnerability_severity_filter_sends_exactly_one_request() {
    let server = MockServer::start();
    mock_token(&server, "tok", 3600);
    let findings = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/organizations/org-1/vulnerability-findings")
            .query_param("severity", "HIGH")
            .query_param_missing("per-page")
            .query_param_missing("page-token")
            .query_param_missing("in-use")
            .query_param_missing("exploitable")
            .query_param_missing("fix-available")
            .query_param_missing("image-name");
        then.status(200).json_body(serde_json::json!([]));
    });

    let client = client_from_config(&server);
    let params = ListVulnerabilityFindingsParams {
        severity: Some(Severity::High),
        ..Default::default()
    };
    let result = client
        .list_vulnerability_findings("org-1", &params)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(findings.calls(), 1);
}

#[tokio::test]
async fn detection_filters_reach_the_query_string() {
    let server = MockServer::start();
    mock_token(&server, "tok", 3600);
    let detections = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/organizations/org-1/threat-detections")
            .query_param("severity", "CRITICAL")
            .query_param("max-last-seen-time", "2024-06-01T00:00:00Z");
        then.status(200).json_body(serde_json::json!([
            {
                "id": "td-1",
                "type": "REVERSE_SHELL",
                "category": "PROCESS",
                "severity": "CRITICAL",
                "resource": {"name": "api-7c9", "type": "POD"},
                "triggers": [{"policy_id": "tp-1", "events": []}]
            }
        ]));
    });

    let client = client_from_config(&server);
    let params = ListThreatDetectionsParams {
        severity: Some(Severity::Critical),
        max_last_seen_time: Some("2024-06-01T00:00:00Z".into()),
        ..Default::default()
    };
    let result = client.list_threat_detections("org-1", &params).await.unwrap();

    detections.assert();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id(), Some("td-1"));
    assert_eq!(result[0].detection_type(), Some("REVERSE_SHELL"));
    assert_eq!(
        result[0].as_value()["triggers"][0]["policy_id"],
        serde_json::json!("tp-1")
    );
}

#[tokio::test]
async fn policies_filtered_by_manager() {
    let server = MockServer::start();
    mock_token(&server, "tok", 3600);
    let policies = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/organizations/org-1/threat-policies")
            .query_param("managed-by", "UPWIND");
        then.status(200).json_body(serde_json::json!([
            {"id": "tp-1", "display_name": "Crypto mining", "enabled": true}
        ]));
    });

    let client = client_from_config(&server);
    let result = client
        .list_threat_policies(
            "org-1",
            &ListThreatPoliciesParams {
                managed_by: Some(PolicyManager::Upwind),
            },
        )
        .await
        .unwrap();

    policies.assert();
    assert_eq!(result[0].display_name(), Some("Crypto mining"));
    assert_eq!(result[0].enabled(), Some(true));
}

// ===========================================================================
// 2. Error normalization
// ===========================================================================

#[tokio::test]
async fn forbidden_response_is_normalized() {
    let server = MockServer::start();
    mock_token(&server, "tok", 3600);
    server.mock(|when, then| {
        when.method(PATCH)
            .path("/v1/organizations/org-1/threat-policies/tp-1");
        then.status(403)
            .json_body(serde_json::json!({"error": "forbidden", "message": "no access"}));
    });

    let client = client_from_config(&server);
    let err = client
        .update_threat_policy("org-1", "tp-1", &ThreatPolicyUpdateRequest { enabled: true })
        .await
        .unwrap_err();

    match err {
        UpwindError::RemoteApi(remote) => {
            assert_eq!(remote.status_code, 403);
            assert_eq!(remote.error, "forbidden");
            assert_eq!(remote.message, "no access");
        }
        other => panic!("expected RemoteApi, got {other:?}"),
    }
}

#[tokio::test]
async fn token_failure_stops_before_resource_request() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth/token");
        then.status(401).json_body(serde_json::json!({"error": "invalid_client"}));
    });
    let resource = server.mock(|when, then| {
        when.path_includes("/v1/organizations/");
        then.status(200).json_body(serde_json::json!([]));
    });

    let client = client_from_config(&server);
    let err = client
        .get_threat_detection("org-1", "td-1")
        .await
        .unwrap_err();

    assert!(matches!(err, UpwindError::Authentication(_)), "got {err:?}");
    assert_eq!(resource.calls(), 0);
}

// ===========================================================================
// 3. Organization discovery
// ===========================================================================

#[tokio::test]
async fn discovery_reads_nested_organization_claim() {
    let server = MockServer::start();
    mock_token(
        &server,
        &jwt(serde_json::json!({"organization": {"id": "org-nested"}})),
        3600,
    );

    let client = client_from_config(&server);
    assert_eq!(
        client.discover_organization_id().await.as_deref(),
        Some("org-nested")
    );
}

#[tokio::test]
async fn discovery_without_claim_is_none() {
    let server = MockServer::start();
    mock_token(&server, &jwt(serde_json::json!({"sub": "svc", "exp": 1})), 3600);

    let client = client_from_config(&server);
    assert_eq!(client.discover_organization_id().await, None);
}

#[tokio::test]
async fn discovered_organization_addresses_the_request() {
    let server = MockServer::start();
    mock_token(&server, &jwt(serde_json::json!({"org_id": "abc"})), 3600);
    let finding = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/organizations/abc/vulnerability-findings/vf-1");
        then.status(200).json_body(serde_json::json!({
            "id": "vf-1",
            "vulnerability": {"name": "CVE-2024-0001", "severity": "HIGH"},
            "package": {"name": "openssl", "version": "3.0.1"}
        }));
    });

    let client = client_from_config(&server);
    let org = client.discover_organization_id().await.unwrap();
    let result = client.get_vulnerability_finding(&org, "vf-1").await.unwrap();

    finding.assert();
    assert_eq!(result.id(), Some("vf-1"));
}

// ===========================================================================
// 4. Session reuse across operations
// ===========================================================================

#[tokio::test]
async fn one_token_serves_many_operations() {
    let server = MockServer::start();
    let token = mock_token(&server, "shared-token", 3600);
    let any = server.mock(|when, then| {
        when.method(GET)
            .path_includes("/v1/organizations/org-1/")
            .header("authorization", "Bearer shared-token");
        then.status(200).json_body(serde_json::json!([]));
    });

    let client = client_from_config(&server);
    client
        .list_threat_policies("org-1", &ListThreatPoliciesParams::default())
        .await
        .unwrap();
    client
        .list_threat_detections("org-1", &ListThreatDetectionsParams::default())
        .await
        .unwrap();
    client
        .list_vulnerability_findings("org-1", &ListVulnerabilityFindingsParams::default())
        .await
        .unwrap();

    assert_eq!(token.calls(), 1);
    assert_eq!(any.calls(), 3);
}

#[tokio::test]
async fn expired_session_is_refreshed_transparently() {
    let server = MockServer::start();
    let token = mock_token(&server, "tok", 600);
    server.mock(|when, then| {
        when.method(GET).path("/v1/organizations/org-1/threat-policies");
        then.status(200).json_body(serde_json::json!([]));
    });

    let http = reqwest::Client::new();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let tokens = Arc::new(
        TokenManager::new(
            http.clone(),
            Credentials::new("id", "secret", server.base_url()),
        )
        .with_clock(clock.clone()),
    );
    let client = UpwindClient::new(http, server.base_url(), tokens);

    let params = ListThreatPoliciesParams::default();
    client.list_threat_policies("org-1", &params).await.unwrap();
    // 600s TTL minus the 300s margin: valid for 300s.
    clock.advance(299);
    client.list_threat_policies("org-1", &params).await.unwrap();
    assert_eq!(token.calls(), 1);

    clock.advance(1);
    client.list_threat_policies("org-1", &params).await.unwrap();
    assert_eq!(token.calls(), 2);
}

// ===========================================================================
// 5. Events
// ===========================================================================

#[tokio::test]
async fn deploy_event_round_trip() {
    let server = MockServer::start();
    mock_token(&server, "tok", 3600);
    let data = serde_json::json!({
        "resource_name": "api",
        "resource_namespace": "prod",
        "resource_kind": "Deployment",
        "cluster_id": "c-1",
        "start_time": "2024-06-01T12:00:00Z",
        "end_time": "2024-06-01T12:05:00Z",
        "initiator": "argo"
    });
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/organizations/org-1/events")
            .body_includes(r#""type":"IMAGE_DEPLOY""#)
            .body_includes(r#""reporter":"CUSTOM_CD""#);
        then.status(200).json_body(serde_json::json!([
            {"id": "ev-9", "type": "IMAGE_DEPLOY", "reporter": "CUSTOM_CD", "data": data.clone()}
        ]));
    });

    let client = client_from_config(&server);
    let serde_json::Value::Object(map) = data.clone() else {
        unreachable!()
    };
    let request = EventRequest {
        event_type: EventType::ImageDeploy,
        reporter: EventReporter::CustomCd,
        data: map,
    };

    let created = client.create_event("org-1", &request).await.unwrap();

    post.assert();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id(), Some("ev-9"));
    assert_eq!(created[0].get("data"), Some(&data));
}
