//! One handler per subcommand.

use std::{
  io::{self, BufRead as _, IsTerminal as _, Read as _, Write as _},
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, bail};
use chrono::{Local, Utc};
use lendcraft_catalog::{CachedCatalog, ScryfallCatalog, ScryfallConfig};
use lendcraft_core::{
  catalog::CardCatalog,
  fact::{EventId, same_name},
  loans::{group_loans, involving},
  store::LedgerStore,
};
use lendcraft_share::{
  backup::{backup_file_name, export_backup, restore_backup},
  exchange::{
    Direction, ImportReport, LendRequest, LocalIdentity, Outgoing, export_all,
    import_code, record_lend, record_return,
  },
};
use lendcraft_store_sqlite::SqliteStore;

use crate::{config::Settings, render};

fn now_ms() -> i64 { Utc::now().timestamp_millis() }

/// Recording needs to know who "me" is.
async fn require_local_name(store: &SqliteStore) -> anyhow::Result<String> {
  match store.local_name().await? {
    Some(name) => Ok(name),
    None => bail!("no display name set; run `lendcraft name <NAME>` first"),
  }
}

/// Summary on stderr, code alone on stdout so it can be piped.
fn print_outgoing(summary: &str, outgoing: &Outgoing) {
  eprintln!("{summary}");
  eprintln!("Share this code with the other party:");
  println!("{}", outgoing.code);
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub async fn name(store: &SqliteStore, new: Option<String>) -> anyhow::Result<()> {
  match new {
    Some(name) => {
      let name = name.trim().to_string();
      if name.is_empty() {
        bail!("display name must not be empty");
      }
      store.set_local_name(name.clone()).await?;
      println!("You are now {name}.");
    }
    None => match store.local_name().await? {
      Some(name) => println!("{name}"),
      None => println!("No display name set."),
    },
  }
  Ok(())
}

/// Settle the local name after an import that could not tell who "me" is.
async fn settle_identity(
  store: &SqliteStore,
  report: &ImportReport,
  chosen: Option<String>,
  can_prompt: bool,
) -> anyhow::Result<()> {
  let LocalIdentity::Choose(names) = &report.identity else {
    return Ok(());
  };

  let choice = match chosen {
    Some(name) => Some(name),
    None if can_prompt => prompt_choice(names)?,
    None => None,
  };

  match choice {
    Some(name) => {
      let name = names
        .iter()
        .find(|n| same_name(n, &name))
        .cloned()
        .unwrap_or(name);
      store.set_local_name(name.clone()).await?;
      println!("You are now {name}.");
    }
    None => eprintln!(
      "No display name set. Participants: {}. Run `lendcraft name <NAME>` to pick one.",
      names.join(", ")
    ),
  }
  Ok(())
}

/// Ask on the terminal; accepts a list number or a name. Empty skips.
fn prompt_choice(names: &[String]) -> anyhow::Result<Option<String>> {
  println!("Which one are you?");
  for (i, name) in names.iter().enumerate() {
    println!("  {}) {name}", i + 1);
  }
  print!("> ");
  io::stdout().flush()?;

  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let answer = line.trim();
  if answer.is_empty() {
    return Ok(None);
  }
  if let Ok(n) = answer.parse::<usize>()
    && let Some(name) = n.checked_sub(1).and_then(|i| names.get(i))
  {
    return Ok(Some(name.clone()));
  }
  Ok(Some(answer.to_string()))
}

// ─── Recording ───────────────────────────────────────────────────────────────

pub struct LendArgs {
  pub card:       String,
  pub to:         Option<String>,
  pub from:       Option<String>,
  pub copies:     usize,
  pub note:       Option<String>,
  pub set_code:   Option<String>,
  pub catalog_id: Option<String>,
}

pub async fn lend(store: &SqliteStore, args: LendArgs) -> anyhow::Result<()> {
  let me = require_local_name(store).await?;
  let (counterparty, direction) = match (args.to, args.from) {
    (Some(to), None) => (to, Direction::Lending),
    (None, Some(from)) => (from, Direction::Borrowing),
    _ => bail!("give exactly one of --to or --from"),
  };

  let mut request = LendRequest::new(args.card, counterparty, direction);
  request.copies = args.copies;
  request.note = args.note;
  request.set_code = args.set_code;
  request.catalog_id = args.catalog_id;

  let arrow = match direction {
    Direction::Lending => format!("to {}", request.counterparty),
    Direction::Borrowing => format!("from {}", request.counterparty),
  };
  let summary = format!("Recorded {}x {} {arrow}.", request.copies, request.card_name);

  let outgoing = record_lend(store, &me, request, now_ms()).await?;
  print_outgoing(&summary, &outgoing);
  Ok(())
}

pub async fn return_loan(store: &SqliteStore, id: String) -> anyhow::Result<()> {
  let id = resolve_loan_id(store, &id).await?;
  let outgoing = record_return(store, &id, now_ms()).await?;
  let card = outgoing
    .events
    .first()
    .map(|e| e.card_name.as_str())
    .unwrap_or_default();
  print_outgoing(&format!("Recorded return of {card}."), &outgoing);
  Ok(())
}

/// Accept any unambiguous prefix of an open loan's id.
async fn resolve_loan_id(store: &SqliteStore, given: &str) -> anyhow::Result<EventId> {
  let given = given.trim();
  if given.is_empty() {
    bail!("give the id (or an id prefix) of the loan to return");
  }
  let matches: Vec<EventId> = store
    .active_loans()
    .await?
    .into_iter()
    .map(|loan| loan.lend.id)
    .filter(|id| id.as_str().starts_with(given))
    .collect();

  match matches.as_slice() {
    [one] => Ok(one.clone()),
    [] => Ok(EventId::new(given)),
    _ => bail!("`{given}` matches {} open loans; give more of the id", matches.len()),
  }
}

// ─── Exchange ────────────────────────────────────────────────────────────────

pub async fn import(
  store: &SqliteStore,
  code: Option<String>,
  as_name: Option<String>,
) -> anyhow::Result<()> {
  let from_stdin = code.is_none();
  let code = match code {
    Some(code) => code,
    None => {
      let mut buf = String::new();
      io::stdin().read_to_string(&mut buf).context("reading code from stdin")?;
      buf
    }
  };

  let me = store.local_name().await?;
  let report = import_code(store, &code, me.as_deref()).await?;
  println!("{report}");

  let can_prompt = !from_stdin && io::stdin().is_terminal();
  settle_identity(store, &report, as_name, can_prompt).await
}

pub async fn export(
  store: &SqliteStore,
  backup: bool,
  output: Option<PathBuf>,
) -> anyhow::Result<()> {
  if !backup {
    println!("{}", export_all(store).await?);
    return Ok(());
  }

  let json = export_backup(store).await?;
  let path = output.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
  std::fs::write(&path, json)
    .with_context(|| format!("writing backup to {}", path.display()))?;
  println!("Backup written to {}", path.display());
  Ok(())
}

pub async fn restore(
  store: &SqliteStore,
  file: &Path,
  as_name: Option<String>,
) -> anyhow::Result<()> {
  let json = std::fs::read_to_string(file)
    .with_context(|| format!("reading backup {}", file.display()))?;

  let me = store.local_name().await?;
  let report = restore_backup(store, &json, me.as_deref()).await?;
  println!("{report}");

  settle_identity(store, &report, as_name, io::stdin().is_terminal()).await
}

// ─── Views ───────────────────────────────────────────────────────────────────

pub async fn loans(store: &SqliteStore) -> anyhow::Result<()> {
  let me = store.local_name().await?;
  let open = store.active_loans().await?;
  let groups = group_loans(&open, me.as_deref().unwrap_or_default());

  print!("{}", render::loans(&groups));
  if me.is_none() && !groups.is_empty() {
    eprintln!("Set a display name to see which loans are yours.");
  }
  Ok(())
}

pub async fn history(store: &SqliteStore, with: Option<String>) -> anyhow::Result<()> {
  let events = store.all_events().await?;
  match with {
    Some(name) => print!("{}", render::history(involving(&events, &name))),
    None => print!("{}", render::history(&events)),
  }
  Ok(())
}

pub enum FriendsAction {
  List,
  Add(String),
  Remove(String),
}

pub async fn friends(store: &SqliteStore, action: FriendsAction) -> anyhow::Result<()> {
  match action {
    FriendsAction::List => {
      let me = store.local_name().await?;
      let others = store
        .friends()
        .await?
        .into_iter()
        .filter(|f| me.as_deref().is_none_or(|me| !same_name(f, me)));
      for friend in others {
        println!("{friend}");
      }
    }
    FriendsAction::Add(name) => {
      let name = name.trim().to_string();
      if name.is_empty() {
        bail!("friend name must not be empty");
      }
      store.add_friend(name.clone()).await?;
      println!("Added {name}.");
    }
    FriendsAction::Remove(name) => {
      if store.remove_friend(name.clone()).await? {
        println!("Removed {name}.");
      } else {
        println!("{name} was not in the list.");
      }
    }
  }
  Ok(())
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

fn catalog(
  store: &SqliteStore,
  settings: &Settings,
) -> anyhow::Result<CachedCatalog<ScryfallCatalog, SqliteStore>> {
  let scryfall = ScryfallCatalog::new(ScryfallConfig {
    base_url: settings.catalog_url.clone(),
    timeout:  Duration::from_millis(settings.catalog_timeout_ms),
  })?;
  Ok(CachedCatalog::new(
    scryfall,
    store.clone(),
    Duration::from_secs(settings.suggestion_ttl_secs),
  ))
}

pub async fn suggest(
  store: &SqliteStore,
  settings: &Settings,
  partial: String,
) -> anyhow::Result<()> {
  for name in catalog(store, settings)?.suggest(&partial).await {
    println!("{name}");
  }
  Ok(())
}

pub fn image(store: &SqliteStore, settings: &Settings, card: String) -> anyhow::Result<()> {
  println!("{}", catalog(store, settings)?.image_url(&card));
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn one_open_loan() -> (SqliteStore, EventId) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let request = LendRequest::new("Sol Ring", "Bo", Direction::Lending);
    let out = record_lend(&store, "Alice", request, 1000).await.unwrap();
    (store, out.events[0].id.clone())
  }

  #[tokio::test]
  async fn blank_id_matches_nothing() {
    let (store, _) = one_open_loan().await;
    assert!(resolve_loan_id(&store, "").await.is_err());
    assert!(resolve_loan_id(&store, "   ").await.is_err());
  }

  #[tokio::test]
  async fn unique_prefix_resolves_to_the_loan() {
    let (store, id) = one_open_loan().await;
    let prefix = &id.as_str()[..4];
    assert_eq!(resolve_loan_id(&store, prefix).await.unwrap(), id);
    assert_eq!(resolve_loan_id(&store, &format!(" {id} ")).await.unwrap(), id);
  }

  #[tokio::test]
  async fn unmatched_id_is_passed_through() {
    let (store, _) = one_open_loan().await;
    let id = resolve_loan_id(&store, "not-a-loan").await.unwrap();
    assert_eq!(id.as_str(), "not-a-loan");
  }
}
