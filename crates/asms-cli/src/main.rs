//! `asms`: the binary entry point. Wires Registry → Gateway → MCP
//! servers → Agent and exposes that as three subcommands.

mod commands;
mod stack;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "asms", version, about = "Agent/Model/Skill control plane")]
struct Cli {
    /// Path to a TOML config file. Falls back to built-in defaults if
    /// absent.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP, stdio MCP, and SSE MCP servers.
    Serve {
        /// Skip the stdio MCP transport even if the config enables it
        /// (useful when running detached, where stdio has no reader).
        #[arg(long)]
        no_stdio: bool,
    },
    /// Poll a running instance's `/api/v2/health`.
    Health {
        /// Base URL of a running instance, e.g. http://127.0.0.1:7700.
        #[arg(long, default_value = "http://127.0.0.1:7700")]
        base_url: String,
    },
    /// Run exactly one unit in-process, with no transport started.
    Execute {
        #[arg(long, value_enum)]
        r#type: commands::execute::RequestTypeArg,
        #[arg(long)]
        unit: String,
        /// JSON object literal, e.g. '{"message": "hi"}'.
        #[arg(long, default_value = "{}")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => asms_core::config::load_config(path)?,
        None => asms_core::AsmsConfig::default(),
    };

    match cli.command {
        Commands::Serve { no_stdio } => commands::serve::run(config, no_stdio).await,
        Commands::Health { base_url } => commands::health::run(base_url).await,
        Commands::Execute { r#type, unit, input } => commands::execute::run(config, r#type, unit, input).await,
    }
}
