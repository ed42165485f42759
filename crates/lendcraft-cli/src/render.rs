//! Plain-text views of the ledger.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use lendcraft_core::{
  fact::{EventKind, LendingEvent},
  loans::{LoanGroup, LoanSide},
};

/// Open loans split into "lent out", "borrowing" and everything else.
pub fn loans(groups: &[LoanGroup]) -> String {
  if groups.is_empty() {
    return "No cards are out on loan.\n".to_string();
  }

  let mut out = String::new();
  for (side, heading) in [
    (LoanSide::LentOut, "Lent out"),
    (LoanSide::Borrowing, "Borrowing"),
    (LoanSide::Unrelated, "Between others"),
  ] {
    let rows: Vec<&LoanGroup> = groups.iter().filter(|g| g.side == side).collect();
    if rows.is_empty() {
      continue;
    }
    if !out.is_empty() {
      out.push('\n');
    }
    let _ = writeln!(out, "{heading}:");
    for group in rows {
      let _ = writeln!(out, "  {}", loan_row(group));
    }
  }
  out
}

fn loan_row(group: &LoanGroup) -> String {
  let parties = match group.side {
    LoanSide::LentOut => format!("to {}", group.borrower_name),
    LoanSide::Borrowing => format!("from {}", group.lender_name),
    LoanSide::Unrelated => format!("{} -> {}", group.lender_name, group.borrower_name),
  };
  let ids: Vec<&str> = group.ids.iter().map(|id| id.as_str()).collect();
  format!(
    "{}x {}  {}  [{}]",
    group.count(),
    group.card_name,
    parties,
    ids.join(" ")
  )
}

/// One line per event, newest first.
pub fn history<'a>(events: impl IntoIterator<Item = &'a LendingEvent>) -> String {
  let mut lines: Vec<&LendingEvent> = events.into_iter().collect();
  if lines.is_empty() {
    return "No history yet.\n".to_string();
  }
  lines.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));

  let mut out = String::new();
  for event in lines {
    let _ = writeln!(out, "{}", history_row(event));
  }
  out
}

fn history_row(event: &LendingEvent) -> String {
  let verb = match &event.kind {
    EventKind::Lend => "lend  ",
    EventKind::Return { .. } => "return",
  };
  let mut row = format!(
    "{}  {}  {}  {} -> {}  {}",
    when(event.timestamp),
    verb,
    event.card_name,
    event.lender_name,
    event.borrower_name,
    event.id,
  );
  if let Some(note) = &event.note {
    let _ = write!(row, "  ({note})");
  }
  row
}

/// Local wall-clock time of a millisecond timestamp.
fn when(timestamp_ms: i64) -> String {
  match DateTime::from_timestamp_millis(timestamp_ms) {
    Some(t) => t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    None => format!("@{timestamp_ms}"),
  }
}
