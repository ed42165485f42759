//! The Lendcraft ledger model.
//!
//! Events, their content-derived ids, and the loan views computed from them
//! live here, along with the [`store::LedgerStore`] and
//! [`catalog::CardCatalog`] traits. No I/O happens in this crate.

pub mod catalog;
pub mod error;
pub mod fact;
pub mod fingerprint;
pub mod loans;
pub mod store;

pub use error::{Error, Result};
