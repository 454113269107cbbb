//! Upwind MCP: Model Context Protocol server for the Upwind security platform.
//!
//! Authenticates with OAuth2 client credentials, discovers the organization
//! from the access token when callers omit it, and exposes threat, policy,
//! vulnerability and event operations as MCP tools.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod observability;
pub mod types;
