//! Structured logging and secret redaction.
//!
//! - [`init_logging`]: one-time `tracing` setup with `RUST_LOG` support
//! - [`redact_secrets`]: masks credentials and bearer tokens in text that
//!   leaves the process (tool errors, log lines built from upstream bodies)

use std::sync::LazyLock;

use regex::Regex;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `upwind_mcp=info` when `RUST_LOG` is not set. Output goes to
/// stderr: in stdio mode stdout carries JSON-RPC frames and must stay clean.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("upwind_mcp=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

static REDACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let patterns: &[(&str, &str)] = &[
        (
            r"(?i)Bearer\s+[a-zA-Z0-9_\-\.=]{20,}",
            "Bearer ***REDACTED***",
        ),
        (
            r#"(?i)(client_secret|access_token)["']?\s*[:=]\s*["']?[^\s"'&,}]{8,}["']?"#,
            "$1=***REDACTED***",
        ),
        (
            r"eyJ[a-zA-Z0-9_\-]{8,}\.[a-zA-Z0-9_\-]{8,}\.[a-zA-Z0-9_\-]*",
            "***REDACTED***",
        ),
        (
            r#"(?i)(secret|token|password)\s*[:=]\s*['"]?([a-zA-Z0-9_\-]{20,})['"]?"#,
            "$1=***REDACTED***",
        ),
    ];
    patterns
        .iter()
        .filter_map(|(p, r)| Regex::new(p).ok().map(|re| (re, *r)))
        .collect()
});

/// Redact potential secrets from text.
///
/// Replaces bearer tokens, JWT-shaped strings, and `client_secret` /
/// `access_token` assignments (form or JSON style) with `***REDACTED***`.
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for (re, replacement) in REDACTIONS.iter() {
        result = re.replace_all(&result, *replacement).to_string();
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
