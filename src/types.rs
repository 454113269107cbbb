//! Domain types for the Upwind API.
//!
//! Response records hold the vendor's JSON exactly as received: unknown keys,
//! nulls and numeric scores all survive a round trip, and nothing is filled
//! in for absent fields. Vocabularies that callers supply as tool inputs are
//! closed enums.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Input vocabularies
// ---------------------------------------------------------------------------

/// Severity filter shared by detections and vulnerability findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionCategory {
    Network,
    Process,
    CloudLogs,
}

impl DetectionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::Process => "PROCESS",
            Self::CloudLogs => "CLOUD_LOGS",
        }
    }
}

/// Status a detection can be moved to. The API only accepts archiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStatus {
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyManager {
    Upwind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ImageBuild,
    ImageDeploy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventReporter {
    GithubActions,
    CircleCi,
    CustomCi,
    CustomCd,
}

// ---------------------------------------------------------------------------
// List parameters (serialized straight into the query string)
// ---------------------------------------------------------------------------

/// Filters for `GET /threat-detections`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListThreatDetectionsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DetectionCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_first_seen_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_first_seen_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_last_seen_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_last_seen_time: Option<String>,
}

/// Filters for `GET /threat-policies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListThreatPoliciesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<PolicyManager>,
}

/// Filters for `GET /vulnerability-findings`.
///
/// Boolean filters are sent whenever present, `false` included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListVulnerabilityFindingsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_active_communication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_use: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exploitable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatDetectionUpdateRequest {
    pub status: DetectionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatPolicyUpdateRequest {
    pub enabled: bool,
}

/// CI/CD event submitted to `POST /events`.
///
/// `data` is the caller's object, forwarded without reshaping. Its expected
/// keys depend on the event type (image and commit details for builds,
/// workload and timing details for deploys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub reporter: EventReporter,
    pub data: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Response records
// ---------------------------------------------------------------------------

/// Declares a response record: the vendor's JSON object kept as received,
/// plus accessors for the fields this crate reads.
macro_rules! api_record {
    ($(#[$meta:meta])* $name:ident { $($accessor:ident => $key:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Value);

        impl $name {
            /// Raw value of a top-level field.
            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }

            pub fn as_value(&self) -> &Value {
                &self.0
            }

            pub fn into_value(self) -> Value {
                self.0
            }

            $(
                pub fn $accessor(&self) -> Option<&str> {
                    self.0.get($key).and_then(Value::as_str)
                }
            )*
        }

        impl From<Value> for $name {
            fn from(value: Value) -> Self {
                Self(value)
            }
        }
    };
}

api_record! {
    /// Runtime threat detection.
    ThreatDetection {
        id => "id",
        detection_type => "type",
        category => "category",
        severity => "severity",
        status => "status",
    }
}

api_record! {
    /// Threat policy. `enabled` is read with [`ThreatPolicy::enabled`].
    ThreatPolicy {
        id => "id",
        display_name => "display_name",
        severity => "severity",
        managed_by => "managed_by",
    }
}

impl ThreatPolicy {
    /// `None` when the vendor omitted the flag or sent a non-boolean.
    pub fn enabled(&self) -> Option<bool> {
        self.0.get("enabled").and_then(Value::as_bool)
    }
}

api_record! {
    /// Vulnerability finding on an image or workload.
    VulnerabilityFinding {
        id => "id",
        status => "status",
        source => "source",
    }
}

impl VulnerabilityFinding {
    pub fn cve_id(&self) -> Option<&str> {
        self.0
            .pointer("/vulnerability/nvd_cve_id")
            .and_then(Value::as_str)
    }
}

api_record! {
    /// One event as echoed back by `POST /events`.
    EventList {
        id => "id",
        event_type => "type",
        reporter => "reporter",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
