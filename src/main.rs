use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clawkeeper::config::{default_config_path, ResolvedConfig};
use clawkeeper::login::{AuthStatus, LoginService, Verdict};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "clawkeeper")]
#[command(about = "ClawCloud console login keeper")]
struct Cli {
    /// Path to config file (default: ./clawkeeper.toml, then the XDG data dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the login flow (the default)
    Login {
        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
    },
    /// Report the cached session status
    Check,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clawkeeper=info")),
        )
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = ResolvedConfig::load_or_default(&config_path)?;

    match cli.command.unwrap_or(Command::Login { headed: false }) {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("Console URL: {}", config.console_url);
            println!("Data directory: {}", config.data_dir.display());
            println!("Session reuse: {}", config.session.reuse);
        }
        Command::Check => {
            let service = LoginService::from_config(config).await?;
            match service.check_auth().await? {
                AuthStatus::Valid => println!("Session: valid"),
                AuthStatus::Missing => println!("Session: missing"),
                AuthStatus::Expired { reason } => println!("Session: expired ({reason})"),
            }
        }
        Command::Login { headed } => {
            if headed {
                config.browser.headless = false;
            }
            let service = LoginService::from_config(config).await?;
            match service.run().await? {
                Verdict::LoggedIn => info!("Login succeeded"),
                Verdict::LoginFailed => {
                    error!("Login failed");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
