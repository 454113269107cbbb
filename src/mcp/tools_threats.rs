//! Threat MCP tool handler implementations (5 tools).
//!
//! Contains the business logic for: list_threat_detections,
//! get_threat_detection, update_threat_detection, list_threat_policies,
//! and update_threat_policy.

use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use crate::client::UpwindClient;
use crate::types::{
    ListThreatDetectionsParams, ListThreatPoliciesParams, ThreatDetectionUpdateRequest,
    ThreatPolicyUpdateRequest,
};

use super::server::{
    json_result, require_id, resolve_organization_id, DetectionInput, ListThreatDetectionsInput,
    ListThreatPoliciesInput, UpdateDetectionInput, UpdatePolicyInput,
};

// upwind_list_threat_detections
pub(crate) async fn handle_list_detections(
    client: &UpwindClient,
    p: ListThreatDetectionsInput,
) -> Result<CallToolResult, McpError> {
    let org = resolve_organization_id(client, p.organization_id).await?;
    let params = ListThreatDetectionsParams {
        severity: p.severity,
        detection_type: p.detection_type,
        category: p.category,
        min_first_seen_time: p.min_first_seen_time,
        max_first_seen_time: p.max_first_seen_time,
        min_last_seen_time: p.min_last_seen_time,
        max_last_seen_time: p.max_last_seen_time,
    };
    let detections = client.list_threat_detections(&org, &params).await?;
    tracing::debug!(count = detections.len(), "listed threat detections");
    json_result(&detections)
}

// upwind_get_threat_detection
pub(crate) async fn handle_get_detection(
    client: &UpwindClient,
    p: DetectionInput,
) -> Result<CallToolResult, McpError> {
    require_id(&p.detection_id, "detectionId")?;
    let org = resolve_organization_id(client, p.organization_id).await?;
    let detection = client.get_threat_detection(&org, &p.detection_id).await?;
    json_result(&detection)
}

// upwind_update_threat_detection
pub(crate) async fn handle_update_detection(
    client: &UpwindClient,
    p: UpdateDetectionInput,
) -> Result<CallToolResult, McpError> {
    require_id(&p.detection_id, "detectionId")?;
    let org = resolve_organization_id(client, p.organization_id).await?;
    let update = ThreatDetectionUpdateRequest { status: p.status };
    let detection = client
        .update_threat_detection(&org, &p.detection_id, &update)
        .await?;
    tracing::info!(detection_id = %p.detection_id, status = ?p.status, "updated threat detection");
    json_result(&detection)
}

// upwind_list_threat_policies
pub(crate) async fn handle_list_policies(
    client: &UpwindClient,
    p: ListThreatPoliciesInput,
) -> Result<CallToolResult, McpError> {
    let org = resolve_organization_id(client, p.organization_id).await?;
    let params = ListThreatPoliciesParams {
        managed_by: p.managed_by,
    };
    let policies = client.list_threat_policies(&org, &params).await?;
    json_result(&policies)
}

// upwind_update_threat_policy
pub(crate) async fn handle_update_policy(
    client: &UpwindClient,
    p: UpdatePolicyInput,
) -> Result<CallToolResult, McpError> {
    require_id(&p.policy_id, "policyId")?;
    let org = resolve_organization_id(client, p.organization_id).await?;
    let update = ThreatPolicyUpdateRequest { enabled: p.enabled };
    let policy = client
        .update_threat_policy(&org, &p.policy_id, &update)
        .await?;
    tracing::info!(policy_id = %p.policy_id, enabled = p.enabled, "updated threat policy");
    json_result(&policy)
}
