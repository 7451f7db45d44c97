//! MyBench vault CLI
//!
//! Operates on the same data directory as the desktop client: sets the master
//! password on first run, checks it, and encrypts or decrypts single values
//! in the format stored in connection profiles.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{Command, PasswordSource};
use vault_core::{default_data_dir, FileConfigStore, SettingsManager, VaultSession};

/// MyBench credential vault
#[derive(Parser, Debug)]
#[command(name = "mybench-vault")]
#[command(version)]
#[command(about = "Manage the MyBench master password and encrypted connection secrets")]
struct Args {
    /// Data directory holding config.json and settings.json
    #[arg(long, env = "MYBENCH_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Master password (prompted for when omitted)
    #[arg(long, env = "MYBENCH_MASTER_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let mut settings = SettingsManager::new(&data_dir);

    // Logs go to stderr; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(settings.get().log_filter.as_deref().unwrap_or("warn"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(FileConfigStore::open(data_dir).await?);
    debug!("Using data directory {:?}", store.storage_dir());
    let mut session =
        VaultSession::new(store).with_derive_timeout(settings.get().derive_timeout());

    let password = match args.password {
        Some(password) => PasswordSource::Given(password.into()),
        None => PasswordSource::Prompt,
    };

    let output = commands::run(args.command, &mut session, &mut settings, password).await?;
    println!("{}", output);

    Ok(())
}
