//! Configuration data structures for the Upwind MCP server.
//!
//! Defines the optional YAML file format: endpoint overrides, transport
//! timeout, tool preset, and per-tool / per-category toggles. Credentials are
//! never read from the file; they only come from the environment or the CLI.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Top-level file config
// ---------------------------------------------------------------------------

/// Contents of `.upwind-mcp.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Upwind REST API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Authorization server base URL (`/oauth/token` is appended).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Global connect + response timeout for outbound HTTP, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Active preset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<PresetName>,

    /// Per-tool and per-category overrides.
    #[serde(default)]
    pub tools: ToolsConfig,
}

// ---------------------------------------------------------------------------
// PresetName
// ---------------------------------------------------------------------------

/// Named presets that control which tools are exposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    /// All eight tools.
    #[default]
    Full,
    /// Query tools only; nothing that changes remote state.
    ReadOnly,
}

impl PresetName {
    /// Parse from a loose string (case-insensitive, underscores accepted).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "full" => Some(Self::Full),
            "read-only" | "read_only" | "readonly" => Some(Self::ReadOnly),
            _ => None,
        }
    }

    /// Canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::ReadOnly => "read-only",
        }
    }
}

impl std::fmt::Display for PresetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// Per-tool and per-category configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Individual tool overrides (enable/disable specific tools).
    #[serde(default)]
    pub overrides: HashMap<String, ToolOverride>,
    /// Category-level toggles (enable/disable entire groups).
    #[serde(default)]
    pub categories: HashMap<String, CategoryConfig>,
}

impl ToolsConfig {
    /// Explicit per-tool setting, if any.
    pub fn tool_override(&self, tool_name: &str) -> Option<bool> {
        self.overrides.get(tool_name).map(|o| o.enabled)
    }

    /// Whether a category is enabled (defaults to true).
    pub fn is_category_enabled(&self, category: &str) -> bool {
        self.categories
            .get(category)
            .map(|c| c.enabled)
            .unwrap_or(true)
    }
}

/// Override the enabled state of a single tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOverride {
    pub enabled: bool,
    /// Human-readable reason for the override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ToolOverride {
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            enabled: false,
            reason: Some(reason.into()),
        }
    }

    pub fn enabled() -> Self {
        Self {
            enabled: true,
            reason: None,
        }
    }
}

/// Enable or disable an entire tool category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// ToolMetadata (for filtering)
// ---------------------------------------------------------------------------

/// Lightweight metadata about a single MCP tool, used for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMetadata {
    /// Tool name as registered in the MCP server.
    pub name: &'static str,
    /// Category this tool belongs to.
    pub category: &'static str,
    /// Whether calling the tool changes remote state.
    pub mutating: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
