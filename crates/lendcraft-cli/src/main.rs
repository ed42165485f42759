//! `lendcraft`: an offline ledger of Magic cards lent between friends.
//!
//! # Usage
//!
//! ```text
//! lendcraft name Alice
//! lendcraft lend "Sol Ring" --to Bo --copies 2
//! lendcraft import MTG1:eJyLjgUAARUAuQ
//! lendcraft loans
//! ```
//!
//! Every recording command prints a share code on stdout; the other party
//! imports it to get the same events.

mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use commands::{FriendsAction, LendArgs};
use config::{Settings, expand_tilde};
use lendcraft_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lendcraft", author, version, about = "Track Magic cards lent between friends")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "~/.config/lendcraft/config.toml")]
  config: PathBuf,

  /// Ledger database; overrides `store_path` from the config.
  #[arg(long, value_name = "PATH", env = "LENDCRAFT_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Show your display name, or set it.
  Name { name: Option<String> },

  /// Record a card lent to (--to) or borrowed from (--from) someone.
  Lend {
    card:       String,
    #[arg(long, conflicts_with = "from", required_unless_present = "from")]
    to:         Option<String>,
    #[arg(long)]
    from:       Option<String>,
    /// Each copy becomes its own loan.
    #[arg(long, default_value_t = 1)]
    copies:     usize,
    #[arg(long)]
    note:       Option<String>,
    #[arg(long = "set", value_name = "CODE")]
    set_code:   Option<String>,
    #[arg(long, value_name = "ID")]
    catalog_id: Option<String>,
  },

  /// Record that an open loan came back. Any unique id prefix works.
  Return { id: String },

  /// Merge a share code. Reads stdin when CODE is omitted.
  Import {
    code:    Option<String>,
    /// Which participant you are, if your name is not set yet.
    #[arg(long = "as", value_name = "NAME")]
    as_name: Option<String>,
  },

  /// List open loans.
  Loans,

  /// List every event, newest first.
  History {
    /// Only events where NAME is lender or borrower.
    #[arg(long, value_name = "NAME")]
    with: Option<String>,
  },

  /// List, add or remove friends.
  Friends {
    #[command(subcommand)]
    action: Option<FriendsCommand>,
  },

  /// Print the whole ledger as one share code, or write a JSON backup.
  Export {
    #[arg(long)]
    backup: bool,
    /// Backup destination (default: lendcraft-backup-<date>.json).
    #[arg(short, long, value_name = "FILE", requires = "backup")]
    output: Option<PathBuf>,
  },

  /// Merge a JSON backup.
  Restore {
    file:    PathBuf,
    #[arg(long = "as", value_name = "NAME")]
    as_name: Option<String>,
  },

  /// Card names starting with PARTIAL.
  Suggest { partial: String },

  /// Image URL for an exact card name.
  Image { card: String },
}

#[derive(Subcommand)]
enum FriendsCommand {
  Add { name: String },
  Remove { name: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&expand_tilde(&cli.config))?;
  let store_path = expand_tilde(cli.store.as_ref().unwrap_or(&settings.store_path));
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("opening ledger at {}", store_path.display()))?;
  tracing::debug!(path = %store_path.display(), "ledger opened");

  match cli.command {
    Command::Name { name } => commands::name(&store, name).await,
    Command::Lend { card, to, from, copies, note, set_code, catalog_id } => {
      let args = LendArgs { card, to, from, copies, note, set_code, catalog_id };
      commands::lend(&store, args).await
    }
    Command::Return { id } => commands::return_loan(&store, id).await,
    Command::Import { code, as_name } => commands::import(&store, code, as_name).await,
    Command::Loans => commands::loans(&store).await,
    Command::History { with } => commands::history(&store, with).await,
    Command::Friends { action } => {
      let action = match action {
        None => FriendsAction::List,
        Some(FriendsCommand::Add { name }) => FriendsAction::Add(name),
        Some(FriendsCommand::Remove { name }) => FriendsAction::Remove(name),
      };
      commands::friends(&store, action).await
    }
    Command::Export { backup, output } => commands::export(&store, backup, output).await,
    Command::Restore { file, as_name } => commands::restore(&store, &file, as_name).await,
    Command::Suggest { partial } => commands::suggest(&store, &settings, partial).await,
    Command::Image { card } => commands::image(&store, &settings, card),
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn config_defaults_to_the_user_config_dir() {
    let cli = Cli::try_parse_from(["lendcraft", "loans"]).unwrap();
    assert_eq!(cli.config, PathBuf::from("~/.config/lendcraft/config.toml"));
  }

  #[test]
  fn lend_needs_exactly_one_party() {
    assert!(Cli::try_parse_from(["lendcraft", "lend", "Sol Ring"]).is_err());
    assert!(
      Cli::try_parse_from(["lendcraft", "lend", "Sol Ring", "--to", "Bo", "--from", "Cy"])
        .is_err()
    );
    let cli = Cli::try_parse_from(["lendcraft", "lend", "Sol Ring", "--from", "Cy"]).unwrap();
    assert!(matches!(cli.command, Command::Lend { from: Some(_), to: None, copies: 1, .. }));
  }
}
