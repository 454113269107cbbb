//! MCP server implementation using rmcp over stdio transport.
//!
//! Exposes 8 Upwind tools that Claude (or any MCP client) can invoke to
//! inspect threat detections, toggle threat policies, query vulnerability
//! findings and report CI/CD events.

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};

use crate::client::UpwindClient;
use crate::config::UpwindConfig;
use crate::error::UpwindError;
use crate::types::{
    DetectionCategory, DetectionStatus, EventReporter, EventType, PolicyManager, Severity,
};

/// Returned when neither the caller nor the access token names an organization.
pub const MISSING_ORGANIZATION: &str =
    "Organization ID not provided and could not be determined from auth token";

// ---------------------------------------------------------------------------
// Server struct
// ---------------------------------------------------------------------------

/// Upwind MCP server.
///
/// Cheap to clone: every clone shares the same HTTP pool and token manager,
/// so the HTTP transport can hand one clone to each session.
#[derive(Debug, Clone)]
pub struct UpwindServer {
    client: UpwindClient,
    config: UpwindConfig,
}

impl UpwindServer {
    pub fn new(client: UpwindClient, config: UpwindConfig) -> Self {
        Self { client, config }
    }

    /// Build the API client from `config` and wrap it.
    pub fn from_config(config: UpwindConfig) -> Result<Self, reqwest::Error> {
        let client = UpwindClient::from_config(&config)?;
        Ok(Self::new(client, config))
    }

    pub fn client(&self) -> &UpwindClient {
        &self.client
    }

    pub fn config(&self) -> &UpwindConfig {
        &self.config
    }

    fn is_tool_enabled(&self, name: &str) -> bool {
        super::registry::enabled_tool_names(&self.config).contains(name)
    }

    /// Tools visible under the current preset and overrides.
    pub fn visible_tools(&self) -> Vec<Tool> {
        let enabled = super::registry::enabled_tool_names(&self.config);
        Self::tool_router()
            .list_all()
            .into_iter()
            .filter(|t| enabled.contains(t.name.as_ref()))
            .collect()
    }
}

/// Use `explicit` when it is a non-empty string, otherwise fall back to the
/// organization claim in the current access token.
pub(crate) async fn resolve_organization_id(
    client: &UpwindClient,
    explicit: Option<String>,
) -> Result<String, UpwindError> {
    if let Some(id) = explicit.filter(|s| !s.trim().is_empty()) {
        return Ok(id);
    }
    client
        .discover_organization_id()
        .await
        .ok_or_else(|| UpwindError::InvalidParameters(MISSING_ORGANIZATION.to_string()))
}

/// Reject an empty required identifier before any request is made.
pub(crate) fn require_id(value: &str, field: &str) -> Result<(), UpwindError> {
    if value.trim().is_empty() {
        return Err(UpwindError::InvalidParameters(format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helper: serialize to JSON text
// ---------------------------------------------------------------------------

pub(crate) fn json_text<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}

/// One text block holding the pretty-printed response.
pub(crate) fn json_result<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(json_text(data))]))
}

// ---------------------------------------------------------------------------
// Tool parameter structs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListThreatDetectionsInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "Filter by severity level")]
    pub severity: Option<Severity>,
    #[serde(rename = "type")]
    #[schemars(description = "Filter by detection type")]
    pub detection_type: Option<String>,
    #[schemars(description = "Filter by detection category")]
    pub category: Option<DetectionCategory>,
    #[schemars(description = "Filter by earliest first seen time (ISO8601 format)")]
    pub min_first_seen_time: Option<String>,
    #[schemars(description = "Filter by latest first seen time (ISO8601 format)")]
    pub max_first_seen_time: Option<String>,
    #[schemars(description = "Filter by earliest last seen time (ISO8601 format)")]
    pub min_last_seen_time: Option<String>,
    #[schemars(description = "Filter by latest last seen time (ISO8601 format)")]
    pub max_last_seen_time: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetectionInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "The unique identifier for the threat detection")]
    pub detection_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateDetectionInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "The unique identifier for the threat detection")]
    pub detection_id: String,
    #[schemars(description = "New status for the threat detection")]
    pub status: DetectionStatus,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListThreatPoliciesInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "Filter by policy management entity")]
    pub managed_by: Option<PolicyManager>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePolicyInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "The unique identifier for the threat policy")]
    pub policy_id: String,
    #[schemars(description = "Whether the policy should be enabled")]
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListVulnerabilityFindingsInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "Number of results per page (default: 100)")]
    pub per_page: Option<u32>,
    #[schemars(description = "Token for pagination")]
    pub page_token: Option<String>,
    #[schemars(description = "Filter by cloud account ID")]
    pub cloud_account_id: Option<String>,
    #[schemars(description = "Filter by cluster ID")]
    pub cluster_id: Option<String>,
    #[schemars(description = "Filter by namespace")]
    pub namespace: Option<String>,
    #[schemars(description = "Filter for resources with active internet ingress communication")]
    pub ingress_active_communication: Option<bool>,
    #[schemars(description = "Filter for packages currently in use")]
    pub in_use: Option<bool>,
    #[schemars(description = "Filter for packages with known exploits")]
    pub exploitable: Option<bool>,
    #[schemars(description = "Filter for packages with available fixes")]
    pub fix_available: Option<bool>,
    #[schemars(description = "Filter by severity level")]
    pub severity: Option<Severity>,
    #[schemars(description = "Filter by image name (e.g., nginx:latest)")]
    pub image_name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindingInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[schemars(description = "The unique identifier for the vulnerability finding")]
    pub finding_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateEventInput {
    #[schemars(description = "The unique identifier for the organization (optional - will use organization from auth token if not provided)")]
    pub organization_id: Option<String>,
    #[serde(rename = "type")]
    #[schemars(description = "Type of event")]
    pub event_type: EventType,
    #[schemars(description = "Entity creating the event")]
    pub reporter: EventReporter,
    #[schemars(description = "Event data (structure depends on event type)")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Tool implementations
// ---------------------------------------------------------------------------

#[tool_router]
impl UpwindServer {
    #[tool(
        name = "upwind_list_threat_detections",
        description = "List threat detections for an organization with optional filtering"
    )]
    async fn upwind_list_threat_detections(
        &self,
        Parameters(p): Parameters<ListThreatDetectionsInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_threats::handle_list_detections(&self.client, p).await
    }

    #[tool(
        name = "upwind_get_threat_detection",
        description = "Get detailed information about a specific threat detection"
    )]
    async fn upwind_get_threat_detection(
        &self,
        Parameters(p): Parameters<DetectionInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_threats::handle_get_detection(&self.client, p).await
    }

    #[tool(
        name = "upwind_update_threat_detection",
        description = "Update a threat detection status (e.g., archive)"
    )]
    async fn upwind_update_threat_detection(
        &self,
        Parameters(p): Parameters<UpdateDetectionInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_threats::handle_update_detection(&self.client, p).await
    }

    #[tool(
        name = "upwind_list_threat_policies",
        description = "List threat policies for an organization"
    )]
    async fn upwind_list_threat_policies(
        &self,
        Parameters(p): Parameters<ListThreatPoliciesInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_threats::handle_list_policies(&self.client, p).await
    }

    #[tool(
        name = "upwind_update_threat_policy",
        description = "Update a threat policy (e.g., enable/disable)"
    )]
    async fn upwind_update_threat_policy(
        &self,
        Parameters(p): Parameters<UpdatePolicyInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_threats::handle_update_policy(&self.client, p).await
    }

    #[tool(
        name = "upwind_list_vulnerability_findings",
        description = "List vulnerability findings for an organization with filtering options"
    )]
    async fn upwind_list_vulnerability_findings(
        &self,
        Parameters(p): Parameters<ListVulnerabilityFindingsInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_vulnerabilities::handle_list_findings(&self.client, p).await
    }

    #[tool(
        name = "upwind_get_vulnerability_finding",
        description = "Get detailed information about a specific vulnerability finding"
    )]
    async fn upwind_get_vulnerability_finding(
        &self,
        Parameters(p): Parameters<FindingInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_vulnerabilities::handle_get_finding(&self.client, p).await
    }

    #[tool(
        name = "upwind_create_event",
        description = "Create a new event (e.g., for CI/CD integration)"
    )]
    async fn upwind_create_event(
        &self,
        Parameters(p): Parameters<CreateEventInput>,
    ) -> Result<CallToolResult, McpError> {
        super::tools_events::handle_create_event(&self.client, p).await
    }
}

// ---------------------------------------------------------------------------
// ServerHandler impl: manual list_tools/call_tool for preset filtering
// ---------------------------------------------------------------------------

impl ServerHandler for UpwindServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Upwind security platform MCP server. Read tools: \
                 upwind_list_threat_detections, upwind_get_threat_detection, \
                 upwind_list_threat_policies, upwind_list_vulnerability_findings and \
                 upwind_get_vulnerability_finding. Under the full preset, \
                 upwind_update_threat_detection archives a detection, \
                 upwind_update_threat_policy enables or disables a policy, and \
                 upwind_create_event reports a CI/CD image build or deploy; the \
                 read-only preset hides these three. Results are the Upwind API's JSON \
                 as returned. organizationId is optional on every tool; when omitted it \
                 is read from the service account's access token."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "upwind-mcp-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: self.visible_tools(),
        }))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let known = super::registry::all_tool_metadata()
            .iter()
            .any(|t| t.name == request.name.as_ref());
        if known && !self.is_tool_enabled(request.name.as_ref()) {
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "Tool '{}' is disabled by the current configuration (preset: {}). \
                 Change the preset in .upwind-mcp.yaml or set UPWIND_PRESET=full to enable all tools.",
                request.name, self.config.preset
            ))]));
        }

        let tool_context =
            rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
        Self::tool_router().call(tool_context).await
    }
}

/// Serve `config` over stdio until the client disconnects.
pub async fn run_server(config: UpwindConfig) -> Result<(), Box<dyn std::error::Error>> {
    let server = UpwindServer::from_config(config)?;
    tracing::info!(
        preset = %server.config.preset,
        tools = server.visible_tools().len(),
        "Upwind MCP server running on stdio"
    );
    let transport = rmcp::transport::io::stdio();
    let running = server.serve(transport).await.inspect_err(|e| {
        tracing::error!("MCP server error: {}", e);
    })?;
    let _ = running.waiting().await;
    Ok(())
}
