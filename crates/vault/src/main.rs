//! DocVault
//!
//! Password-gated document manager.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use model::PreferenceKey;
use storage::{Database, KeychainBackend, MemoryKeychain, SystemKeychain};
use tracing_appender::non_blocking::WorkerGuard;
use vault::config::Config;
use vault::preferences::{MemoryPreferenceStore, PreferenceStore};
use vault::{LoginFlow, Shell, Vault};

/// Environment variable consulted when `--password` is not given.
const PASSWORD_ENV: &str = "DOCVAULT_PASSWORD";

type AppVault = Vault<Arc<dyn KeychainBackend>, Box<dyn PreferenceStore>>;

/// DocVault - password-gated document manager.
#[derive(Parser, Debug)]
#[command(name = "docvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep the password and preferences in memory only (shell only)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Vault password (falls back to DOCVAULT_PASSWORD, then one line of stdin)
    #[arg(long, global = true, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create the vault password
    Init,

    /// Change the vault password
    Passwd {
        /// New password (otherwise read from the next stdin line)
        #[arg(long, value_name = "PASSWORD")]
        new_password: Option<String>,
    },

    /// List a folder
    Ls {
        /// Folder relative to the documents root
        dir: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Create a folder
    Mkdir {
        /// Parent folder
        dir: PathBuf,
        /// Name of the new folder
        name: String,
    },

    /// Create a text file
    Write {
        /// Parent folder
        dir: PathBuf,
        /// Name of the new file
        name: String,
        /// File content (otherwise the rest of stdin)
        #[arg(long)]
        text: Option<String>,
    },

    /// Import an image, stored as PNG
    ImportImage {
        /// Parent folder
        dir: PathBuf,
        /// Name of the new file
        name: String,
        /// Image on the local file system
        source: PathBuf,
    },

    /// Delete a file or an empty folder
    Rm {
        /// Delete folders with their contents
        #[arg(short, long)]
        recursive: bool,
        /// Entry to delete
        path: PathBuf,
    },

    /// Rename an entry within its folder
    Mv {
        /// Entry to rename
        path: PathBuf,
        /// New name
        new_name: String,
    },

    /// Print a text file
    Cat {
        /// File to print
        path: PathBuf,
    },

    /// Show or change listing preferences
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Start the interactive shell
    Shell,
}

/// Subcommands for listing preferences.
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommands {
    /// Show current preferences
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Set the sort direction
    Sort {
        #[arg(value_enum)]
        order: SortArg,
    },

    /// Show or hide file sizes
    Size {
        #[arg(value_enum)]
        state: Switch,
    },
}

/// Sort direction argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    /// A to Z
    Asc,
    /// Z to A
    Desc,
}

/// On/off argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    check_ephemeral(&cli)?;

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => Config::load(config_path)?,
        None => Config::load_default()?,
    };

    // Apply environment variable overrides
    config.apply_env_overrides();

    // Validate configuration
    config.validate()?;

    let _guard = init_tracing(&config, cli.verbose)?;
    tracing::info!("DocVault starting");

    let vault = build_vault(&config, cli.ephemeral)?;
    let mut stdin = io::stdin().lock();

    match cli.command {
        Commands::Init => {
            if vault.gate().is_set() {
                anyhow::bail!("A vault password already exists; use `docvault passwd` to change it");
            }
            let (password, from_stdin) = resolve_password(cli.password, &mut stdin)?;
            let confirmation = if from_stdin {
                read_line(&mut stdin)?.context("Missing password confirmation")?
            } else {
                password.clone()
            };
            create_password(&vault, &password, &confirmation)?;
            println!("Vault password created");
        }
        Commands::Passwd { new_password } => {
            let (current, _) = resolve_password(cli.password, &mut stdin)?;
            vault.unlock(&current)?;

            let new_password = match new_password {
                Some(password) => password,
                None => read_line(&mut stdin)?.context("Missing new password")?,
            };
            vault.change_password(&current, &new_password)?;
            println!("Vault password changed");
        }
        Commands::Shell => {
            let stdout = io::stdout().lock();
            Shell::new(&vault, stdin, stdout).run()?;
        }
        command => {
            let (password, _) = resolve_password(cli.password, &mut stdin)?;
            vault.unlock(&password)?;
            run_documents_command(&vault, command, &mut stdin)?;
        }
    }

    Ok(())
}

/// Commands that need an unlocked vault.
fn run_documents_command(
    vault: &AppVault,
    command: Commands,
    stdin: &mut impl BufRead,
) -> anyhow::Result<()> {
    let mutator = vault.mutator();

    match command {
        Commands::Ls { dir, json } => {
            let dir = dir.unwrap_or_default();
            let view = vault.open_view(&dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(view.entries())?);
            } else {
                for row in view.rows() {
                    println!("{}", row);
                }
            }
        }
        Commands::Mkdir { dir, name } => {
            let created = mutator.create_folder(&dir, &name)?;
            println!("Created {}", mutator.browser().relative(&created).display());
        }
        Commands::Write { dir, name, text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    stdin.read_to_string(&mut buf).context("Failed to read stdin")?;
                    buf
                }
            };
            let created = mutator.create_text_file(&dir, &name, &text)?;
            println!("Created {}", mutator.browser().relative(&created).display());
        }
        Commands::ImportImage { dir, name, source } => {
            let bytes = fs::read(&source)
                .with_context(|| format!("Failed to read image: {}", source.display()))?;
            let created = mutator.create_image_file(&dir, &name, &bytes)?;
            println!("Created {}", mutator.browser().relative(&created).display());
        }
        Commands::Rm { recursive, path } => {
            if recursive {
                mutator.delete_entry_recursive(&path)?;
            } else {
                mutator.delete_entry(&path)?;
            }
            println!("Deleted {}", path.display());
        }
        Commands::Mv { path, new_name } => {
            let renamed = mutator.rename_entry(&path, &new_name)?;
            println!("Renamed to {}", mutator.browser().relative(&renamed).display());
        }
        Commands::Cat { path } => {
            print!("{}", mutator.read_text(&path)?);
        }
        Commands::Settings(settings) => run_settings_command(vault, settings)?,
        Commands::Init | Commands::Passwd { .. } | Commands::Shell => {
            anyhow::bail!("not a documents command")
        }
    }

    Ok(())
}

fn run_settings_command(vault: &AppVault, command: SettingsCommands) -> anyhow::Result<()> {
    let preferences = vault.preferences();

    match command {
        SettingsCommands::Show { json } => {
            let snapshot = preferences.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for key in PreferenceKey::ALL {
                    let state = if snapshot.flag(key) { "on" } else { "off" };
                    println!("{}: {}", key.label(), state);
                }
            }
        }
        SettingsCommands::Sort { order } => {
            preferences.set(PreferenceKey::Sort, order == SortArg::Asc)?;
            println!("Sort: {:?}", preferences.snapshot().sort_order());
        }
        SettingsCommands::Size { state } => {
            preferences.set(PreferenceKey::Size, state == Switch::On)?;
            println!("Size: {}", if state == Switch::On { "on" } else { "off" });
        }
    }

    Ok(())
}

/// `--ephemeral` is accepted only with the shell.
fn check_ephemeral(cli: &Cli) -> anyhow::Result<()> {
    if cli.ephemeral && !matches!(cli.command, Commands::Shell) {
        anyhow::bail!("--ephemeral only works with `docvault shell`");
    }
    Ok(())
}

/// Run the create → confirm steps of the login flow.
fn create_password(vault: &AppVault, password: &str, confirmation: &str) -> anyhow::Result<()> {
    let mut flow = LoginFlow::new(vault.gate());
    for entry in [password, confirmation] {
        let outcome = flow.submit(vault.gate(), entry);
        if let Some(message) = outcome.error_message() {
            anyhow::bail!("{}", message);
        }
    }
    Ok(())
}

/// Wire the vault to real or in-memory backends.
fn build_vault(config: &Config, ephemeral: bool) -> anyhow::Result<AppVault> {
    let (backend, store): (Arc<dyn KeychainBackend>, Box<dyn PreferenceStore>) = if ephemeral {
        tracing::info!("Ephemeral mode: nothing is persisted");
        (
            Arc::new(MemoryKeychain::new()),
            Box::new(MemoryPreferenceStore::new()),
        )
    } else {
        let db_path = config.preferences_db_path();
        let database = Database::open(&db_path)
            .with_context(|| format!("Failed to open preferences database {:?}", db_path))?;
        (Arc::new(SystemKeychain), Box::new(database))
    };

    Vault::from_config(config, backend, store)
}

/// Install the tracing subscriber. The guard must live until exit when logging to a file.
fn init_tracing(config: &Config, verbose: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if verbose {
        "debug".to_string()
    } else {
        config.vault.log_level.to_lowercase()
    };

    match &config.vault.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Password from the flag, the environment, or one stdin line.
///
/// The flag is true when the password came from stdin.
fn resolve_password(
    flag: Option<String>,
    stdin: &mut impl BufRead,
) -> anyhow::Result<(String, bool)> {
    if let Some(password) = flag {
        return Ok((password, false));
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        if !password.is_empty() {
            return Ok((password, false));
        }
    }
    let password = read_line(stdin)?.context("No password given")?;
    Ok((password, true))
}

fn read_line(stdin: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if stdin.read_line(&mut line).context("Failed to read stdin")? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Cursor;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ls_command() {
        let cli = Cli::try_parse_from(["docvault", "ls"]).unwrap();
        match cli.command {
            Commands::Ls { dir, json } => {
                assert!(dir.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Ls command"),
        }
    }

    #[test]
    fn test_ls_with_dir_and_json() {
        let cli = Cli::try_parse_from(["docvault", "ls", "notes", "--json"]).unwrap();
        match cli.command {
            Commands::Ls { dir, json } => {
                assert_eq!(dir, Some(PathBuf::from("notes")));
                assert!(json);
            }
            _ => panic!("Expected Ls command"),
        }
    }

    #[test]
    fn test_write_with_text() {
        let cli =
            Cli::try_parse_from(["docvault", "write", ".", "a.txt", "--text", "hello"]).unwrap();
        match cli.command {
            Commands::Write { dir, name, text } => {
                assert_eq!(dir, PathBuf::from("."));
                assert_eq!(name, "a.txt");
                assert_eq!(text.as_deref(), Some("hello"));
            }
            _ => panic!("Expected Write command"),
        }
    }

    #[test]
    fn test_rm_recursive() {
        let cli = Cli::try_parse_from(["docvault", "rm", "-r", "docs"]).unwrap();
        match cli.command {
            Commands::Rm { recursive, path } => {
                assert!(recursive);
                assert_eq!(path, PathBuf::from("docs"));
            }
            _ => panic!("Expected Rm command"),
        }
    }

    #[test]
    fn test_import_image() {
        let cli = Cli::try_parse_from(["docvault", "import-image", ".", "photo", "/tmp/p.jpg"])
            .unwrap();
        assert!(matches!(cli.command, Commands::ImportImage { .. }));
    }

    #[test]
    fn test_settings_commands() {
        let cli = Cli::try_parse_from(["docvault", "settings", "sort", "desc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Settings(SettingsCommands::Sort {
                order: SortArg::Desc
            })
        ));

        let cli = Cli::try_parse_from(["docvault", "settings", "size", "off"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Settings(SettingsCommands::Size { state: Switch::Off })
        ));

        assert!(Cli::try_parse_from(["docvault", "settings", "sort", "sideways"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "docvault",
            "shell",
            "--ephemeral",
            "--verbose",
            "--password",
            "pass1",
        ])
        .unwrap();
        assert!(cli.ephemeral);
        assert!(cli.verbose);
        assert_eq!(cli.password.as_deref(), Some("pass1"));
        assert!(matches!(cli.command, Commands::Shell));
    }

    #[test]
    fn test_ephemeral_is_shell_only() {
        let cli = Cli::try_parse_from(["docvault", "--ephemeral", "shell"]).unwrap();
        assert!(check_ephemeral(&cli).is_ok());

        for args in [
            ["docvault", "--ephemeral", "init"],
            ["docvault", "--ephemeral", "ls"],
            ["docvault", "--ephemeral", "passwd"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(check_ephemeral(&cli).is_err(), "{:?}", args);
        }

        let cli = Cli::try_parse_from(["docvault", "ls"]).unwrap();
        assert!(check_ephemeral(&cli).is_ok());
    }

    #[test]
    fn test_read_line_strips_newline() {
        let mut input = Cursor::new("pass1\r\nsecond\n");
        assert_eq!(read_line(&mut input).unwrap().as_deref(), Some("pass1"));
        assert_eq!(read_line(&mut input).unwrap().as_deref(), Some("second"));
        assert_eq!(read_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_resolve_password_prefers_flag() {
        let mut input = Cursor::new("from-stdin\n");
        let (password, from_stdin) =
            resolve_password(Some("from-flag".to_string()), &mut input).unwrap();
        assert_eq!(password, "from-flag");
        assert!(!from_stdin);
    }
}
