//! Config resolution: CLI/env > YAML file > built-in defaults.
//!
//! Environment variables reach this module through clap (`env = ...` on the
//! CLI arguments), so [`ConfigOverrides`] already holds the merged CLI/env
//! layer. Credentials are required and only accepted from that layer.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;

use super::preset::preset_allows;
use super::schema::{FileConfig, PresetName, ToolMetadata, ToolsConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.upwind.io";
pub const DEFAULT_AUTH_URL: &str = "https://auth.upwind.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = ".upwind-mcp.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("UPWIND_CLIENT_ID and UPWIND_CLIENT_SECRET environment variables are required")]
    MissingCredentials,

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown preset '{0}' (expected 'full' or 'read-only')")]
    InvalidPreset(String),
}

/// Values supplied on the command line or through environment variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: Option<String>,
    pub auth_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub preset: Option<String>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct UpwindConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub base_url: String,
    pub auth_url: String,
    pub timeout_secs: u64,
    pub preset: PresetName,
    pub tools: ToolsConfig,
}

impl UpwindConfig {
    /// Config with the given credentials and every other setting defaulted.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            preset: PresetName::Full,
            tools: ToolsConfig::default(),
        }
    }

    /// Whether a tool is exposed: per-tool override, then category toggle,
    /// then the preset.
    pub fn is_tool_enabled(&self, tool: &ToolMetadata) -> bool {
        if let Some(enabled) = self.tools.tool_override(tool.name) {
            return enabled;
        }
        self.tools.is_category_enabled(tool.category) && preset_allows(&self.preset, tool)
    }
}

/// Read the YAML config file.
///
/// An explicit `path` must exist. Without one, `CONFIG_FILE_NAME` under
/// `project_root` is used if present, otherwise an empty config.
pub fn load_file_config(path: Option<&Path>, project_root: &Path) -> Result<FileConfig, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (project_root.join(CONFIG_FILE_NAME), false),
    };

    if !required && !path.exists() {
        return Ok(FileConfig::default());
    }

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Merge CLI/env overrides with the config file and defaults.
///
/// # Errors
///
/// Fails fast with [`ConfigError::MissingCredentials`] when the client id or
/// secret is absent or empty, before any file is read.
pub fn load_config(overrides: ConfigOverrides, project_root: &Path) -> Result<UpwindConfig, ConfigError> {
    let client_id = non_empty(overrides.client_id).ok_or(ConfigError::MissingCredentials)?;
    let client_secret = non_empty(overrides.client_secret).ok_or(ConfigError::MissingCredentials)?;

    let file = load_file_config(overrides.config_path.as_deref(), project_root)?;

    let preset = match non_empty(overrides.preset) {
        Some(s) => PresetName::from_str_loose(&s).ok_or(ConfigError::InvalidPreset(s))?,
        None => file.preset.unwrap_or_default(),
    };

    Ok(UpwindConfig {
        client_id,
        client_secret: SecretString::from(client_secret),
        base_url: non_empty(overrides.base_url)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        auth_url: non_empty(overrides.auth_url)
            .or(file.auth_url)
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
        timeout_secs: overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
        preset,
        tools: file.tools,
    })
}

/// Keep only the tools `config` exposes, preserving order.
pub fn filter_tools(config: &UpwindConfig, tools: &[ToolMetadata]) -> Vec<ToolMetadata> {
    tools
        .iter()
        .filter(|t| config.is_tool_enabled(t))
        .cloned()
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
