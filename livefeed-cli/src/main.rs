//! Livefeed CLI
//!
//! Command-line interface for livefeed - tail live dashboard topics with
//! automatic reconnect and polling fallback.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use livefeed_core::{Topic, API_URL_ENV, DEFAULT_API_URL};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "livefeed")]
#[command(version, about = "Live dashboard updates with polling fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: platform data dir + /livefeed)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Dashboard API base URL
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow a topic until interrupted
    Tail {
        /// Topic (graph, metrics, interventions, alerts)
        topic: Topic,

        /// Print each message as a raw JSON frame
        #[arg(long)]
        json: bool,
    },

    /// Fetch a topic's resource once through the cache
    Fetch {
        /// Topic (graph, metrics, interventions, alerts)
        topic: Topic,
    },

    /// List topics and their URLs
    Topics,

    /// Inspect or clear cached responses
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached resources
    List,

    /// Show a cached resource
    Show {
        /// Cache key (e.g. graph_stats)
        key: String,
    },

    /// Remove cached resources
    Clear {
        /// Only remove this key
        key: Option<String>,
    },
}

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "livefeed_core=warn";

/// `RUST_LOG` when set, otherwise library warnings only.
fn log_filter() -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `tail --json` output stays clean
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(log_filter())
        .init();

    // Resolve data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("livefeed")
    });

    let config = CliConfig {
        data_dir,
        api_url: cli.api_url,
    };

    match cli.command {
        Commands::Tail { topic, json } => {
            commands::tail::run(&config, topic, json).await?;
        }
        Commands::Fetch { topic } => {
            commands::fetch::run(&config, topic).await?;
        }
        Commands::Topics => commands::topics::list(&config)?,
        Commands::Cache(cmd) => match cmd {
            CacheCommands::List => commands::cache::list(&config)?,
            CacheCommands::Show { key } => commands::cache::show(&config, &key)?,
            CacheCommands::Clear { key } => commands::cache::clear(&config, key.as_deref())?,
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "livefeed", &mut io::stdout());
        }
    }

    Ok(())
}
