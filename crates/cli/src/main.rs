use anyhow::Context;
use clap::{Parser, Subcommand};

use locallib_kernel::settings::Settings;

/// Local library catalog server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Serve the catalog over HTTP (default)
    Serve {
        /// Load the demo catalog at start
        #[arg(long)]
        seed: bool,

        /// Override the configured port
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load settings")?;

    match cli.command.unwrap_or(Command::Serve { seed: false, port: None }) {
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Serve { seed, port } => {
            settings.database.seed_demo_data |= seed;
            if let Some(port) = port {
                settings.server.port = port;
            }

            locallib_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "locallib cli starting server");
            locallib_app::run(settings).await
        }
    }
}
