//! Loxaudio CLI binary.
//!
//! Secure login to an audio controller.
//!
//! # Commands
//!
//! - `auth` - Connect over WebSocket and run the login handshake
//! - `normalize-key` - Reformat a single-line public key as PEM
//! - `payload` - Build an authenticate command offline
//! - `config` - Show the effective configuration

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use loxaudio::{
    crypto::{normalize_public_key, Credential, CredentialEncryptor, HybridEncryptor},
    transport::Connection,
    Authenticator, Config, WebSocketConnection, VERSION,
};

/// Exit status when the handshake failed in a way that suggests falling back
const EXIT_FALLBACK: i32 = 2;

#[derive(Parser)]
#[command(name = "loxaudio")]
#[command(version = VERSION)]
#[command(about = "Loxaudio - secure audio controller login", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate against a controller
    Auth {
        /// Config file (default: <config_dir>/loxaudio/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Controller host
        #[arg(long)]
        host: Option<String>,

        /// Controller WebSocket port
        #[arg(short, long)]
        port: Option<u16>,

        /// WebSocket path
        #[arg(long)]
        path: Option<String>,

        /// Use wss://
        #[arg(long)]
        tls: bool,

        /// Active user identity
        #[arg(short, long)]
        user: Option<String>,

        /// Bearer token
        #[arg(long, env = "LOXAUDIO_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Handshake timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Normalize a public key into a PEM block
    NormalizeKey {
        /// Key input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Build a secure/authenticate command without connecting
    Payload {
        /// File holding the controller's public key
        #[arg(long)]
        key_file: PathBuf,

        /// Session token from the greeting
        #[arg(long)]
        session_token: String,

        /// Active user identity
        #[arg(short, long)]
        user: String,

        /// Bearer token
        #[arg(long, env = "LOXAUDIO_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the effective configuration
    Config {
        /// Config file (default: <config_dir>/loxaudio/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth {
            config,
            host,
            port,
            path,
            tls,
            user,
            token,
            timeout,
            verbose,
        } => cmd_auth(config, host, port, path, tls, user, token, timeout, verbose),

        Commands::NormalizeKey { input, file } => cmd_normalize_key(input, file),

        Commands::Payload {
            key_file,
            session_token,
            user,
            token,
        } => cmd_payload(&key_file, &session_token, &user, token),

        Commands::Config { config } => cmd_config(config),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?.merge(Config::from_env()),
        None => Config::load()?,
    })
}

#[allow(clippy::too_many_arguments)]
fn cmd_auth(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    tls: bool,
    user: Option<String>,
    token: Option<String>,
    timeout: Option<u64>,
    verbose: bool,
) -> anyhow::Result<()> {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut config = load_config(config)?;

    // CLI arguments take precedence
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(path) = path {
        config.server.path = path;
    }
    if tls {
        config.server.tls = true;
    }
    if let Some(user) = user {
        config.auth.user = user;
    }
    if let Some(token) = token {
        config.auth.token = Some(Credential::new(token));
    }
    if let Some(timeout) = timeout {
        config.handshake.timeout_secs = timeout;
    }

    config.validate()?;
    let credential = config
        .auth
        .token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No token configured"))?;
    let url = config.server.url();
    let deadline = config.handshake.timeout();

    tracing::info!("Connecting to {} as '{}'", url, config.auth.user);

    let runtime = tokio::runtime::Runtime::new()?;
    let started = Instant::now();
    let result = runtime.block_on(async {
        tokio::time::timeout(deadline, async {
            let mut conn = WebSocketConnection::connect(&url).await?;
            let result = Authenticator::new()
                .run(&mut conn, &credential, &config.auth.user)
                .await;
            if result.is_err() {
                let _ = conn.close().await;
            }
            result
        })
        .await
    });

    match result {
        Ok(Ok(stats)) => {
            println!(
                "authenticated (session {}, {} ms)",
                stats.session_id,
                started.elapsed().as_millis()
            );
            Ok(())
        },
        Ok(Err(e)) => {
            eprintln!("{e}");
            std::process::exit(if e.is_fallback_candidate() {
                EXIT_FALLBACK
            } else {
                1
            });
        },
        Err(_) => {
            eprintln!("Handshake timed out after {}s", deadline.as_secs());
            std::process::exit(EXIT_FALLBACK);
        },
    }
}

fn cmd_normalize_key(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<()> {
    let key = read_input(input, file)?;
    println!("{}", normalize_public_key(&key));
    Ok(())
}

fn cmd_payload(
    key_file: &Path,
    session_token: &str,
    user: &str,
    token: String,
) -> anyhow::Result<()> {
    let public_key = std::fs::read_to_string(key_file)?;
    let command =
        HybridEncryptor.encrypt(&public_key, session_token, &Credential::new(token), user)?;
    println!("{command}");
    Ok(())
}

fn cmd_config(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    print!("{}", toml::to_string_pretty(&config)?);
    println!(
        "# token: {}",
        if config.auth.token.is_some() {
            "[REDACTED]"
        } else {
            "(not set)"
        }
    );
    Ok(())
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
