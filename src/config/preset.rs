//! Preset definitions: full and read-only.
//!
//! A preset decides which tools are visible before per-category and per-tool
//! overrides from the config file are applied.

use super::schema::{PresetName, ToolMetadata};

// ---------------------------------------------------------------------------
// Tool categories
// ---------------------------------------------------------------------------

pub const CATEGORY_THREATS: &str = "Threats";
pub const CATEGORY_VULNERABILITIES: &str = "Vulnerabilities";
pub const CATEGORY_EVENTS: &str = "Events";

/// All known category names, for iteration.
pub const ALL_CATEGORIES: &[&str] = &[CATEGORY_THREATS, CATEGORY_VULNERABILITIES, CATEGORY_EVENTS];

// ---------------------------------------------------------------------------
// PresetDefinition
// ---------------------------------------------------------------------------

/// Describes a single preset's characteristics.
#[derive(Debug, Clone)]
pub struct PresetDefinition {
    pub name: PresetName,
    pub description: &'static str,
    /// Whether tools that change remote state are exposed.
    pub allows_mutations: bool,
}

/// Get the preset definition for a given name.
pub fn get_preset(name: &PresetName) -> PresetDefinition {
    match name {
        PresetName::Full => full_preset(),
        PresetName::ReadOnly => read_only_preset(),
    }
}

/// Everything enabled, including archiving detections, toggling policies and
/// reporting CI/CD events.
pub fn full_preset() -> PresetDefinition {
    PresetDefinition {
        name: PresetName::Full,
        description: "All tools: query and modify detections, policies, and events",
        allows_mutations: true,
    }
}

/// Query tools only. Suited to agents that should observe but never change
/// the security posture.
pub fn read_only_preset() -> PresetDefinition {
    PresetDefinition {
        name: PresetName::ReadOnly,
        description: "Read-only: list and inspect detections, policies, and findings",
        allows_mutations: false,
    }
}

/// Whether `tool` is visible under `preset`, before any overrides.
pub fn preset_allows(preset: &PresetName, tool: &ToolMetadata) -> bool {
    !tool.mutating || get_preset(preset).allows_mutations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
