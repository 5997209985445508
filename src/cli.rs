use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select, Text};
use zeroize::Zeroizing;

use crate::clipboard::{self, ClipboardController};
use crate::config::ClientConfig;
use crate::error::VaultError;
use crate::generator;
use crate::models::PasswordMap;
use crate::search;
use crate::session::{VaultSession, VaultState};
use crate::tui;

#[derive(Parser)]
#[command(name = "absconditus")]
#[command(about = "Password generator and client for the Absconditus vault")]
#[command(version)]
pub struct Cli {
    /// Vault server base URL (overrides config and ABSCONDITUS_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate passwords without contacting the vault
    Generate {
        /// Password length
        #[arg(short, long)]
        length: Option<usize>,

        /// Number of passwords to print
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },

    /// Show whether the vault is locked
    Status,

    /// Unlock the vault with the master password
    Unlock,

    /// List saved entries
    List {
        /// Print passwords alongside names
        #[arg(long)]
        reveal: bool,
    },

    /// Print the password saved under a name
    Get {
        name: String,

        /// Copy to the clipboard instead of printing
        #[arg(long)]
        copy: bool,
    },

    /// Save a password; one is generated when --password is omitted
    Save {
        name: String,

        #[arg(long, conflicts_with = "length")]
        password: Option<String>,

        /// Length of the generated password
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Search saved entries by name
    Search {
        query: String,
    },

    /// Full-screen terminal UI
    Tui,

    /// Print connection diagnostics
    Debug,
}

impl Cli {
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(server) = &self.server {
            config.set_server_url(server);
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
    }
}

pub struct CliHandler {
    config: ClientConfig,
    session: VaultSession,
}

impl CliHandler {
    pub fn new(config: ClientConfig, session: VaultSession) -> Self {
        Self { config, session }
    }

    pub async fn run(&mut self, command: Option<Commands>) -> Result<()> {
        match command {
            Some(Commands::Generate { length, count }) => self.handle_generate(length, count)?,
            Some(Commands::Status) => self.handle_status().await?,
            Some(Commands::Unlock) => self.handle_unlock().await?,
            Some(Commands::List { reveal }) => self.handle_list(reveal).await?,
            Some(Commands::Get { name, copy }) => self.handle_get(name, copy).await?,
            Some(Commands::Save { name, password, length }) => {
                self.handle_save(name, password, length).await?
            }
            Some(Commands::Search { query }) => self.handle_search(query).await?,
            Some(Commands::Tui) => {
                self.ensure_unlocked().await?;
                tokio::task::block_in_place(|| tui::run_full_ui(&mut self.session, &self.config))?
            }
            Some(Commands::Debug) => crate::debug::debug_vault(&self.config, &mut self.session).await,
            None => self.handle_interactive().await?,
        }

        Ok(())
    }

    fn handle_generate(&self, length: Option<usize>, count: usize) -> Result<()> {
        let length = length.unwrap_or(self.config.password_length);
        for _ in 0..count {
            println!("{}", generator::generate(length)?);
        }
        Ok(())
    }

    async fn handle_status(&mut self) -> Result<()> {
        let connected = self.session.request_token().await.map(|_| ());
        match connected {
            Ok(()) => {}
            Err(e) if e.is_lock_signal() || e.is_unreachable() => {}
            Err(e) => return Err(e.into()),
        }
        println!("{}", self.session.state());
        if self.session.state() == VaultState::Unreachable {
            println!("Vault server: {}", self.session.client().base_url());
        }
        Ok(())
    }

    async fn handle_unlock(&mut self) -> Result<()> {
        let connected = self.session.request_token().await.map(|_| ());
        match connected {
            Ok(()) => {
                println!("Vault is already unlocked.");
                Ok(())
            }
            Err(VaultError::Locked) => self.prompt_unlock().await,
            Err(e) => Err(self.describe(e)),
        }
    }

    async fn handle_list(&mut self, reveal: bool) -> Result<()> {
        let entries = self.fetch_entries().await?;

        if entries.is_empty() {
            println!("No passwords saved yet.");
            return Ok(());
        }

        println!("\nSaved passwords:");
        println!("{:-<60}", "");
        for (name, password) in &entries {
            if reveal {
                println!("{}: {}", name, password);
            } else {
                println!("{}", name);
            }
        }
        println!("{:-<60}", "");

        Ok(())
    }

    async fn handle_get(&mut self, name: String, copy: bool) -> Result<()> {
        let entries = self.fetch_entries().await?;
        let Some((found, password)) = search::exact_match(&entries, &name) else {
            let hints = search::suggestions(&entries, &name, 3);
            if hints.is_empty() {
                bail!("No password saved under '{}'", name);
            }
            bail!("No password saved under '{}'. Did you mean: {}?", name, hints.join(", "));
        };

        if copy {
            let mut sink = ClipboardController::new()?;
            clipboard::copy_password(&mut sink, &entries, found)?;
            println!("Copied '{}' to the clipboard.", found);
        } else {
            println!("{}", password);
        }
        Ok(())
    }

    async fn handle_save(
        &mut self,
        name: String,
        password: Option<String>,
        length: Option<usize>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            bail!("Please enter a name for the password.");
        }

        let generated = password.is_none();
        let password = Zeroizing::new(match password {
            Some(password) => password,
            None => generator::generate(length.unwrap_or(self.config.password_length))?,
        });

        self.ensure_unlocked().await?;
        self.session
            .save_password(&name, &password)
            .await
            .map_err(|e| self.describe(e))?;

        println!("Saved '{}' to the vault.", name);
        if generated {
            println!("Password: {}", password.as_str());
        }
        Ok(())
    }

    async fn handle_search(&mut self, query: String) -> Result<()> {
        let entries = self.fetch_entries().await?;
        let matches = search::filter_entries(&entries, &query);

        if matches.is_empty() {
            println!("No entries match your search.");
            return Ok(());
        }

        println!("Search results:");
        println!("{:-<60}", "");
        for (name, _) in matches {
            println!("{}", name);
        }
        println!("{:-<60}", "");

        Ok(())
    }

    async fn handle_interactive(&mut self) -> Result<()> {
        self.ensure_unlocked().await?;

        loop {
            let options = vec![
                "Generate password",
                "Save password",
                "List passwords",
                "Show password",
                "Copy password",
                "Search passwords",
                "Exit",
            ];

            let selection = Select::new("What would you like to do?", options).prompt()?;

            match selection {
                "Generate password" => self.handle_generate(None, 1)?,
                "Save password" => {
                    let name = Text::new("Name:").prompt()?;
                    let generate = Confirm::new("Generate a password?")
                        .with_default(true)
                        .prompt()?;
                    let password = if generate {
                        None
                    } else {
                        Some(
                            Password::new("Password:")
                                .with_display_toggle_enabled()
                                .prompt()?,
                        )
                    };
                    if let Err(e) = self.handle_save(name, password, None).await {
                        eprintln!("❌ {}", e);
                    }
                }
                "List passwords" => self.handle_list(false).await?,
                "Show password" => {
                    let entries = self.fetch_entries().await?;
                    if entries.is_empty() {
                        println!("No passwords saved yet.");
                        continue;
                    }
                    let names: Vec<String> = entries.keys().cloned().collect();
                    if let Ok(name) = Select::new("Select entry:", names).prompt() {
                        if let Some(password) = entries.get(&name) {
                            println!("{}", password);
                        }
                    }
                }
                "Copy password" => {
                    let entries = self.fetch_entries().await?;
                    if entries.is_empty() {
                        println!("No passwords saved yet.");
                        continue;
                    }
                    let names: Vec<String> = entries.keys().cloned().collect();
                    if let Ok(name) = Select::new("Select entry:", names).prompt() {
                        let copied = ClipboardController::new()
                            .and_then(|mut sink| clipboard::copy_password(&mut sink, &entries, &name).map(|_| ()));
                        match copied {
                            Ok(()) => println!("Copied '{}' to the clipboard.", name),
                            Err(e) => eprintln!("❌ {}", e),
                        }
                    }
                }
                "Search passwords" => {
                    let query = Text::new("Search query:").prompt()?;
                    self.handle_search(query).await?;
                }
                "Exit" => break,
                _ => unreachable!(),
            }
        }

        Ok(())
    }

    async fn fetch_entries(&mut self) -> Result<PasswordMap> {
        self.ensure_unlocked().await?;
        self.session
            .list_passwords()
            .await
            .map_err(|e| self.describe(e))
    }

    /// Requests a token, prompting for the master password when the vault is locked.
    async fn ensure_unlocked(&mut self) -> Result<()> {
        if self.session.is_unlocked() {
            return Ok(());
        }

        let connected = self.session.request_token().await.map(|_| ());
        match connected {
            Ok(()) => Ok(()),
            Err(VaultError::Locked) => self.prompt_unlock().await,
            Err(e) => Err(self.describe(e)),
        }
    }

    async fn prompt_unlock(&mut self) -> Result<()> {
        let password = Zeroizing::new(
            Password::new("Enter master password:")
                .with_display_toggle_enabled()
                .without_confirmation()
                .prompt()?,
        );

        let connected = self.session.unlock_and_connect(password).await.map(|_| ());
        match connected {
            Ok(()) => {
                println!("Vault unlocked!");
                Ok(())
            }
            Err(e) => Err(self.describe(e)),
        }
    }

    fn describe(&self, err: VaultError) -> anyhow::Error {
        match err {
            VaultError::Unreachable(_) => anyhow::Error::new(err).context(format!(
                "Error communicating with the app at {}",
                self.session.client().base_url()
            )),
            VaultError::AuthRejected | VaultError::Locked => {
                anyhow::Error::new(err).context("Cannot continue. The vault is locked or unreachable.")
            }
            other => other.into(),
        }
    }
}
