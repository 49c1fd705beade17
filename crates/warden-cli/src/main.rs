use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Approval-token guarded policy changes")]
struct Cli {
    /// Configuration file (YAML). Defaults plus environment when omitted.
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signing secret management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Render a change request and issue an approval token for it
    Preview {
        /// Change request file (YAML or JSON)
        #[arg(long)]
        request: PathBuf,

        /// Print the preview as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Approval token tools
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Configuration tools
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a fresh random signing secret (hex)
    Generate {
        /// Write the secret to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Decode a token without checking its signature
    Inspect {
        /// Token string, or a file containing it
        token: String,
    },

    /// Verify a token against a change request with the configured secret
    Verify {
        /// Token string, or a file containing it
        token: String,

        /// Change request file the token should be bound to
        #[arg(long)]
        request: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load the configuration and report what it resolves to
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.cmd {
        Command::Keys {
            cmd: KeysCommand::Generate { output },
        } => commands::keys::generate(output)?,

        Command::Preview { request, json } => {
            commands::preview::run(config_path, &request, json).await?
        }

        Command::Token { cmd } => match cmd {
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
            TokenCommand::Verify { token, request } => {
                commands::token::verify(config_path, token, &request)?
            }
        },

        Command::Config {
            cmd: ConfigCommand::Check,
        } => commands::config::check(config_path)?,
    }

    Ok(())
}
