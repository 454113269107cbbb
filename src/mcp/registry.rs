//! Tool-to-category registry for preset-based filtering.
//!
//! Maps each of the 8 MCP tools to its category and marks the ones that
//! change remote state, so `filter_tools()` can decide which tools are
//! visible for a given config.

use std::collections::HashSet;

use crate::config::loader::filter_tools;
use crate::config::preset::*;
use crate::config::schema::ToolMetadata;
use crate::config::UpwindConfig;

/// Return metadata for all 8 MCP tools, in the order they are listed.
pub fn all_tool_metadata() -> Vec<ToolMetadata> {
    vec![
        // ── Threats (5) ──────────────────────────────────────────
        meta("upwind_list_threat_detections", CATEGORY_THREATS, false),
        meta("upwind_get_threat_detection", CATEGORY_THREATS, false),
        meta("upwind_update_threat_detection", CATEGORY_THREATS, true),
        meta("upwind_list_threat_policies", CATEGORY_THREATS, false),
        meta("upwind_update_threat_policy", CATEGORY_THREATS, true),
        // ── Vulnerabilities (2) ──────────────────────────────────
        meta("upwind_list_vulnerability_findings", CATEGORY_VULNERABILITIES, false),
        meta("upwind_get_vulnerability_finding", CATEGORY_VULNERABILITIES, false),
        // ── Events (1) ───────────────────────────────────────────
        meta("upwind_create_event", CATEGORY_EVENTS, true),
    ]
}

fn meta(name: &'static str, category: &'static str, mutating: bool) -> ToolMetadata {
    ToolMetadata {
        name,
        category,
        mutating,
    }
}

/// Return the set of tool names enabled for a given config.
pub fn enabled_tool_names(config: &UpwindConfig) -> HashSet<&'static str> {
    filter_tools(config, &all_tool_metadata())
        .into_iter()
        .map(|t| t.name)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
