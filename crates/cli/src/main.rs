use anyhow::Context;
use clap::{Parser, Subcommand};
use lending_kernel::settings::Settings;

/// Library loan service
#[derive(Debug, Parser)]
#[command(name = "lending", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API and run the daily overdue sweep
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
        /// Do not schedule the overdue sweep
        #[arg(long)]
        no_notifier: bool,
    },
    /// Print the resolved configuration as JSON
    Settings,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load lending settings")?;

    match cli.command {
        Command::Serve { port, no_notifier } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if no_notifier {
                settings.notifier.enabled = false;
            }
            lending_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "lending service starting");

            let runtime = tokio::runtime::Runtime::new().context("failed to build tokio runtime")?;
            runtime.block_on(lending_app::app::run(settings))
        }
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
