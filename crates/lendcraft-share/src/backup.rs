//! Full-ledger JSON backups.
//!
//! A backup is a pretty-printed, uncompressed JSON array of every event in
//! the same record shape as the share code payload. Restoring goes through
//! the exchange consumer path, so a restore is just another idempotent merge.

use chrono::NaiveDate;
use lendcraft_core::{fact::RawEvent, store::LedgerStore};

use crate::{
  Error, Result,
  exchange::{ImportReport, merge_records},
};

/// Dump every event in `store` as pretty JSON.
pub async fn export_backup<S: LedgerStore>(store: &S) -> Result<String> {
  let events = store.all_events().await.map_err(Error::store)?;
  serde_json::to_string_pretty(&events)
    .map_err(|e| Error::InvalidBackup(e.to_string()))
}

/// Merge a backup produced by [`export_backup`] (or any JSON array of event
/// records) into `store`. A file that is not such an array imports nothing.
pub async fn restore_backup<S: LedgerStore>(
  store: &S,
  json: &str,
  local_name: Option<&str>,
) -> Result<ImportReport> {
  let value: serde_json::Value = serde_json::from_str(json)
    .map_err(|e| Error::InvalidBackup(e.to_string()))?;
  if !value.is_array() {
    return Err(Error::InvalidBackup("expected a JSON array of events".into()));
  }
  let records: Vec<RawEvent> = serde_json::from_value(value)
    .map_err(|e| Error::InvalidBackup(e.to_string()))?;

  merge_records(store, records, local_name).await
}

/// Conventional file name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
  format!("lendcraft-backup-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
  use lendcraft_core::fact::NewEvent;
  use lendcraft_store_sqlite::SqliteStore;

  use super::*;

  async fn device() -> SqliteStore {
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store")
  }

  #[tokio::test]
  async fn backup_restores_into_empty_store() {
    let a = device().await;
    let lend = NewEvent::lend("Sol Ring", "Alice", "Bo", 1000).build().unwrap();
    let ret = NewEvent::closing(&lend, 2000).build().unwrap();
    a.insert_batch(vec![lend, ret]).await.unwrap();

    let json = export_backup(&a).await.unwrap();

    let b = device().await;
    let report = restore_backup(&b, &json, Some("Alice")).await.unwrap();
    assert_eq!((report.added, report.duplicates), (2, 0));
    assert_eq!(a.all_events().await.unwrap(), b.all_events().await.unwrap());

    let again = restore_backup(&b, &json, Some("Alice")).await.unwrap();
    assert_eq!((again.added, again.duplicates), (0, 2));
  }

  #[tokio::test]
  async fn empty_ledger_backs_up_as_empty_array() {
    let a = device().await;
    let json = export_backup(&a).await.unwrap();
    assert_eq!(json.trim(), "[]");
  }

  #[tokio::test]
  async fn non_array_backup_rejected() {
    let b = device().await;
    for bad in ["{}", "not json", "\"MTG1:abc\""] {
      let err = restore_backup(&b, bad, None).await.unwrap_err();
      assert!(matches!(err, Error::InvalidBackup(_)), "{bad}");
    }
    assert!(b.all_events().await.unwrap().is_empty());
  }

  #[test]
  fn file_name_carries_date() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(backup_file_name(date), "lendcraft-backup-2024-03-09.json");
  }
}
