//! MCP server: Model Context Protocol implementation over stdio and HTTP.
//!
//! Tool handler logic is split into modules by domain:
//! - [`tools_threats`]: 5 threat detection and policy tools
//! - [`tools_vulnerabilities`]: 2 vulnerability finding tools
//! - [`tools_events`]: 1 CI/CD event tool
//! - [`server`]: tool router, organization resolution, stdio entry point
//! - [`registry`]: tool categories for preset filtering
//! - [`http`]: HTTP transport (streamable HTTP via axum)

pub mod http;
pub mod registry;
pub mod server;
pub mod tools_events;
pub mod tools_threats;
pub mod tools_vulnerabilities;
