//! petrotec-link - drive a Petrotec payment terminal from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use petrotec_link as app;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use app::config::{AppConfig, ConfigLoadResult};
use app::terminal::{Amount, OperationResult, PaymentTerminal};
use app::token;

/// Drive a Petrotec payment terminal over its socket protocol.
#[derive(Parser)]
#[command(name = "petrotec-link", version)]
struct Cli {
    /// Config file (default: config.toml next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use config.toml from current directory (dev mode)
    #[arg(long, global = true)]
    dev: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    #[command(flatten)]
    Terminal(TerminalCommand),
}

/// Operations sent to the terminal.
#[derive(Subcommand)]
enum TerminalCommand {
    /// Request the terminal status
    Status,
    /// Open the accounting period
    Open { transaction_id: String },
    /// Close the accounting period
    Close { transaction_id: String },
    /// Run a card purchase
    Purchase {
        transaction_id: String,
        /// Amount with up to two decimals, e.g. 1.53
        amount: String,
        /// Where to store the correlation token for a later refund
        #[arg(long, default_value = "purchase.json")]
        save_token: PathBuf,
    },
    /// Refund a purchase using its stored correlation token
    Refund {
        #[arg(long, default_value = "purchase.json")]
        token: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.log_dir.as_ref());

    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => {
            tracing::info!("Dev mode: loading config from current directory");
            PathBuf::from("config.toml")
        }
        (None, false) => AppConfig::default_path(),
    };
    tracing::info!("Config path: {:?}", config_path);

    let command = match cli.command {
        Commands::Init => return write_default_config(&config_path),
        Commands::Terminal(command) => command,
    };

    let config = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => config,
        ConfigLoadResult::Missing => {
            bail!(
                "Config file {} not found, create one with `petrotec-link init`",
                config_path.display()
            )
        }
        ConfigLoadResult::Invalid(e) => return Err(e).context("Config invalid"),
    };

    let client = config.client()?;
    tracing::info!(
        "Terminal {} (protocol {})",
        client.transport().addr(),
        client.revision().name()
    );

    let result = match command {
        TerminalCommand::Status => client.status()?,
        TerminalCommand::Open { transaction_id } => client.open_period(&transaction_id)?,
        TerminalCommand::Close { transaction_id } => client.close_period(&transaction_id)?,
        TerminalCommand::Purchase {
            transaction_id,
            amount,
            save_token,
        } => {
            let amount: Amount = amount.parse()?;
            let result = client.purchase(&transaction_id, amount)?;
            if let Some(purchase) = result.extra_data.as_ref() {
                token::save(&save_token, purchase)?;
            }
            result
        }
        TerminalCommand::Refund { token: token_path } => {
            let purchase = token::load(&token_path)
                .with_context(|| format!("Failed to load token from {}", token_path.display()))?;
            client.refund(&purchase)?
        }
    };

    print_result(&result)?;
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn write_default_config(path: &Path) -> anyhow::Result<ExitCode> {
    if path.exists() {
        bail!("Config file {} already exists", path.display());
    }
    AppConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

/// Console logging, plus a rolling file when `log_dir` is set.
fn init_logging(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "petrotec-link.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn print_result(result: &OperationResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
