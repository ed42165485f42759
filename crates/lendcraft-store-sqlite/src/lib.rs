//! [`LedgerStore`](lendcraft_core::store::LedgerStore) on a single SQLite
//! file, driven through [`tokio_rusqlite`]'s background connection thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
