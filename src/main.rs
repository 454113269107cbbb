use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use upwind_mcp::config::preset::get_preset;
use upwind_mcp::config::{load_config, ConfigOverrides};
use upwind_mcp::mcp::{http, registry, server};
use upwind_mcp::observability;

#[derive(Parser, Debug)]
#[command(name = "upwind-mcp")]
#[command(about = "MCP server for the Upwind security platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a YAML config file (default: .upwind-mcp.yaml if present)
    #[arg(long, global = true, env = "UPWIND_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// OAuth2 client id of the Upwind service account
    #[arg(long, global = true, env = "UPWIND_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// OAuth2 client secret of the Upwind service account
    #[arg(long, global = true, env = "UPWIND_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Upwind REST API base URL
    #[arg(long, global = true, env = "UPWIND_BASE_URL")]
    base_url: Option<String>,

    /// Authorization server base URL
    #[arg(long, global = true, env = "UPWIND_AUTH_URL")]
    auth_url: Option<String>,

    /// Tool preset: full or read-only
    #[arg(long, global = true, env = "UPWIND_PRESET")]
    preset: Option<String>,

    /// Outbound HTTP timeout in seconds
    #[arg(long, global = true, env = "UPWIND_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (default)
    Serve(ServeArgs),
    /// Print every tool and whether the current config enables it
    Tools,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Serve streamable HTTP instead of stdio
    #[arg(long)]
    http: bool,

    /// Bind host for --http
    #[arg(long, env = "HOST", default_value = "localhost")]
    host: String,

    /// Bind port for --http
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            base_url: self.base_url.clone(),
            auth_url: self.auth_url.clone(),
            timeout_secs: self.timeout_secs,
            preset: self.preset.clone(),
            config_path: self.config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_logging();

    let cli = Cli::parse();
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(cli.overrides(), &project_root).inspect_err(|e| {
        tracing::error!("Failed to start server: {e}");
    })?;

    match cli.command {
        Some(Commands::Tools) => {
            let enabled = registry::enabled_tool_names(&config);
            println!(
                "preset: {} ({})",
                config.preset,
                get_preset(&config.preset).description
            );
            for tool in registry::all_tool_metadata() {
                let state = if enabled.contains(tool.name) { "on " } else { "off" };
                println!("  [{state}] {:<38} {}", tool.name, tool.category);
            }
            Ok(())
        }
        Some(Commands::Serve(args)) if args.http => {
            http::run_http_server(config, &format!("{}:{}", args.host, args.port)).await
        }
        Some(Commands::Serve(_)) | None => server::run_server(config).await,
    }
}
