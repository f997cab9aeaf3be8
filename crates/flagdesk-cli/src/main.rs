mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{
    blocklist::BlocklistSubcommand, config::ConfigSubcommand, records::RecordsSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flagdesk",
    about = "Manager dashboard for flagged worker status records",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML config file (environment variables override it)
    #[arg(long, global = true, env = "FLAGDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Use a seeded in-memory team instead of the remote store
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the dashboard
    Ui {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "0")]
        port: u16,

        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// Read and act on status records
    Records {
        #[command(subcommand)]
        subcommand: RecordsSubcommand,
    },

    /// Block list helpers
    Blocklist {
        #[command(subcommand)]
        subcommand: BlocklistSubcommand,
    },

    /// Show or validate the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Ui { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Ui { port, no_open } => cmd::ui::run(config_path, cli.demo, port, no_open),
        Commands::Records { subcommand } => {
            cmd::records::run(config_path, cli.demo, subcommand, cli.json)
        }
        Commands::Blocklist { subcommand } => cmd::blocklist::run(subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
