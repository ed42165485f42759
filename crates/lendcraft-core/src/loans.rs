//! Active-loan resolution.
//!
//! "What is currently lent" is never stored. It is derived on demand from the
//! full event set: every `Lend` event whose id is not referenced by some
//! `Return` event. A return whose target is unknown closes nothing; it stays
//! in history and takes effect once the matching loan is merged in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::fact::{EventId, LendingEvent, same_name};

// ─── Active loans ────────────────────────────────────────────────────────────

/// A `Lend` event with no matching `Return`, as of the moment of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLoan {
  pub lend: LendingEvent,
}

/// Which side of a loan the local user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanSide {
  /// The local user lent the card out.
  LentOut,
  /// The local user holds someone else's card.
  Borrowing,
  /// A loan between two other people, received by import.
  Unrelated,
}

impl ActiveLoan {
  pub fn side(&self, local_name: &str) -> LoanSide {
    if same_name(&self.lend.lender_name, local_name) {
      LoanSide::LentOut
    } else if same_name(&self.lend.borrower_name, local_name) {
      LoanSide::Borrowing
    } else {
      LoanSide::Unrelated
    }
  }
}

/// Select the open loans from `events`, in the order given.
///
/// One pass collects every id closed by a return, a second keeps the lends
/// outside that set. Order of insertion never matters.
pub fn active_loans(events: &[LendingEvent]) -> Vec<ActiveLoan> {
  let closed: HashSet<&EventId> =
    events.iter().filter_map(LendingEvent::closes).collect();

  events
    .iter()
    .filter(|e| e.is_lend() && !closed.contains(&e.id))
    .map(|e| ActiveLoan { lend: e.clone() })
    .collect()
}

/// History filtered down to events where `name` is a party.
pub fn involving<'a>(
  events: &'a [LendingEvent],
  name: &str,
) -> Vec<&'a LendingEvent> {
  events.iter().filter(|e| e.involves(name)).collect()
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// A display row: `count` copies of one card between the same two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanGroup {
  pub card_name:     String,
  pub lender_name:   String,
  pub borrower_name: String,
  pub side:          LoanSide,
  /// Lend ids in the group; any one of them can be returned independently.
  pub ids:           Vec<EventId>,
}

impl LoanGroup {
  pub fn count(&self) -> usize { self.ids.len() }
}

/// Collapse loans with the same card and parties (case-insensitive) into one
/// row each. Rows keep the order of their first loan.
pub fn group_loans(loans: &[ActiveLoan], local_name: &str) -> Vec<LoanGroup> {
  let mut groups: Vec<LoanGroup> = Vec::new();

  for loan in loans {
    let lend = &loan.lend;
    let existing = groups.iter_mut().find(|g| {
      same_name(&g.card_name, &lend.card_name)
        && same_name(&g.lender_name, &lend.lender_name)
        && same_name(&g.borrower_name, &lend.borrower_name)
    });

    match existing {
      Some(group) => group.ids.push(lend.id.clone()),
      None => groups.push(LoanGroup {
        card_name:     lend.card_name.clone(),
        lender_name:   lend.lender_name.clone(),
        borrower_name: lend.borrower_name.clone(),
        side:          loan.side(local_name),
        ids:           vec![lend.id.clone()],
      }),
    }
  }

  groups
}
