//! Subcommand implementations

use anyhow::{anyhow, bail, Context};
use clap::Subcommand;
use std::io::Read;
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

use vault_core::{SettingsManager, Vault, VaultSession};

/// Message shown for any value that fails to decrypt; never more specific.
const DECRYPT_FAILED: &str = "cannot decrypt: wrong master password or corrupted data";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show whether a master password has been set
    Status,
    /// Set the master password (first run only)
    Init,
    /// Check the master password
    Verify,
    /// Encrypt a secret (reads stdin when VALUE is omitted)
    Encrypt { value: Option<String> },
    /// Decrypt a stored secret
    Decrypt { blob: String },
    /// Show settings, changing any that are given
    Settings {
        /// Upper bound for one key derivation in seconds (0 = no limit)
        #[arg(long)]
        derive_timeout_secs: Option<u64>,
        /// Log filter used when RUST_LOG is unset
        #[arg(long)]
        log_filter: Option<String>,
    },
}

/// Where the master password comes from
pub enum PasswordSource {
    Given(Zeroizing<String>),
    Prompt,
}

impl PasswordSource {
    fn read(&self, prompt: &str) -> anyhow::Result<Zeroizing<String>> {
        match self {
            Self::Given(password) => Ok(password.clone()),
            Self::Prompt => Ok(Zeroizing::new(rpassword::prompt_password(prompt)?)),
        }
    }

    /// New password, confirmed when typed interactively
    fn read_new(&self) -> anyhow::Result<Zeroizing<String>> {
        let password = self.read("New master password: ")?;
        if let Self::Prompt = self {
            let confirm = self.read("Confirm master password: ")?;
            if *password != *confirm {
                bail!("passwords do not match");
            }
        }
        Ok(password)
    }
}

/// Execute one subcommand and return what should be printed
pub async fn run(
    command: Command,
    session: &mut VaultSession,
    settings: &mut SettingsManager,
    password: PasswordSource,
) -> anyhow::Result<String> {
    match command {
        Command::Status => {
            if session.has_master_password().await? {
                Ok("locked".to_string())
            } else {
                Ok("uninitialized".to_string())
            }
        }
        Command::Init => {
            if session.has_master_password().await? {
                bail!("a master password is already set");
            }
            let new_password = password.read_new()?;
            if new_password.is_empty() {
                bail!("the master password must not be empty");
            }
            session.set_master_password(&new_password).await?;
            info!("Master password initialised");
            Ok("master password set".to_string())
        }
        Command::Verify => {
            unlock(session, &password).await?;
            Ok("ok".to_string())
        }
        Command::Encrypt { value } => {
            let vault = unlock(session, &password).await?;
            let plaintext = match value {
                Some(value) => Zeroizing::new(value),
                None => read_stdin()?,
            };
            Ok(vault.encrypt(&plaintext)?)
        }
        Command::Decrypt { blob } => {
            let vault = unlock(session, &password).await?;
            vault.decrypt(&blob).map_err(|e| {
                if e.is_decrypt_failure() {
                    anyhow!(DECRYPT_FAILED)
                } else {
                    anyhow!(e)
                }
            })
        }
        Command::Settings {
            derive_timeout_secs,
            log_filter,
        } => {
            if derive_timeout_secs.is_some() || log_filter.is_some() {
                let current = settings.get_mut();
                if let Some(secs) = derive_timeout_secs {
                    current.derive_timeout_secs = secs;
                }
                if let Some(filter) = log_filter {
                    current.log_filter = Some(filter);
                }
                settings.save().await?;
                info!("Settings saved");
            }
            Ok(serde_json::to_string_pretty(settings.get())?)
        }
    }
}

async fn unlock(
    session: &mut VaultSession,
    password: &PasswordSource,
) -> anyhow::Result<Arc<Vault>> {
    if !session.has_master_password().await? {
        bail!("no master password set - run `mybench-vault init` first");
    }
    let password = password.read("Master password: ")?;
    if !session.unlock(&password).await? {
        bail!("wrong master password");
    }
    Ok(session.vault()?)
}

fn read_stdin() -> anyhow::Result<Zeroizing<String>> {
    let mut input = Zeroizing::new(String::new());
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read secret from stdin")?;
    let trimmed = input.trim_end_matches(['\r', '\n']).len();
    input.truncate(trimmed);
    Ok(input)
}
