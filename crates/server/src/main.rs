//! modemsim launcher
//!
//! Serves one modem definition until Ctrl-C, or lists the modems found under
//! a modems directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use modemsim_common::{default_modems_dir, discover_descriptors, find_modem, ModemDescriptor};
use modemsim_server::server::{DEFAULT_HOST, DEFAULT_PORT};
use modemsim_server::MockServer;

/// Cable modem web UI simulator
#[derive(Parser)]
#[command(name = "modemsim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory holding `<manufacturer>/<model>` definitions
    #[arg(long, env = "MODEMSIM_MODEMS_DIR", global = true)]
    modems_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a modem definition
    Serve {
        /// Modem directory (contains modem.yaml)
        #[arg(conflicts_with = "modem", required_unless_present = "modem")]
        path: Option<PathBuf>,

        /// Modem to serve from the modems directory, as manufacturer/model
        #[arg(long)]
        modem: Option<String>,

        /// Address to bind
        #[arg(long, env = "MODEMSIM_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind (0 picks a free port)
        #[arg(short, long, env = "MODEMSIM_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Auth type to use instead of the modem's default
        #[arg(long, env = "MODEMSIM_AUTH_TYPE")]
        auth_type: Option<String>,
    },

    /// List discoverable modems
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let modems_dir = cli.modems_dir.unwrap_or_else(default_modems_dir);

    match cli.command {
        Commands::Serve {
            path,
            modem,
            host,
            port,
            auth_type,
        } => {
            let modem_path = match (path, modem) {
                (Some(path), _) => path,
                (None, Some(name)) => {
                    let (manufacturer, model) = name
                        .split_once('/')
                        .context("--modem must be <manufacturer>/<model>")?;
                    let (path, _) = find_modem(&modems_dir, manufacturer, model).with_context(|| {
                        format!("modem {} not found under {}", name, modems_dir.display())
                    })?;
                    path
                }
                (None, None) => anyhow::bail!("a modem path or --modem is required"),
            };

            let mut server = MockServer::new(&modem_path, &host, port, auth_type.as_deref())
                .with_context(|| format!("failed to load {}", modem_path.display()))?;
            server
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    }
                    info!("Shutting down");
                })
                .await?;
        }
        Commands::List => {
            let mut found = 0;
            for descriptor in discover_descriptors(&modems_dir) {
                println!("{}", list_line(&descriptor));
                found += 1;
            }
            if found == 0 {
                eprintln!("No modems found under {}", modems_dir.display());
            }
        }
    }

    Ok(())
}

/// One `list` row: name column, then the modem directory
fn list_line(descriptor: &ModemDescriptor) -> String {
    let name = format!("{} {}", descriptor.manufacturer, descriptor.model);
    format!("{:<40} {}", name, descriptor.path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_line_shows_path_once() {
        let descriptor = ModemDescriptor {
            manufacturer: "Arris".to_string(),
            model: "SB8200".to_string(),
            path: PathBuf::from("modems/arris/sb8200"),
        };
        let line = list_line(&descriptor);
        assert!(line.starts_with("Arris SB8200 "));
        assert!(line.ends_with(" modems/arris/sb8200"));
        assert_eq!(line.matches("modems/arris/sb8200").count(), 1);
    }
}
